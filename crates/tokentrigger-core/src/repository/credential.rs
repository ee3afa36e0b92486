//! Credential store trait definition.

use std::sync::Arc;

use tokentrigger_types::credential::{Credential, CredentialId, CredentialScope};
use tokentrigger_types::error::RepositoryError;

/// Trait for credential storage backends (in-memory, TOML file, ...).
///
/// Implementations must tolerate concurrent reads: many executions may look
/// up credentials at the same time.
pub trait CredentialStore: Send + Sync {
    /// All credentials stored in any of `scopes`.
    fn list(
        &self,
        scopes: &[CredentialScope],
    ) -> impl std::future::Future<Output = Result<Vec<Credential>, RepositoryError>> + Send;

    /// A single credential by scope and id.
    /// Returns None if it does not exist in this store.
    fn get(
        &self,
        scope: CredentialScope,
        id: &CredentialId,
    ) -> impl std::future::Future<Output = Result<Option<Credential>, RepositoryError>> + Send;

    /// Store a credential, replacing any existing one with the same scope and id.
    fn put(
        &self,
        credential: Credential,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a credential. `RepositoryError::NotFound` if it does not exist.
    fn delete(
        &self,
        scope: CredentialScope,
        id: &CredentialId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

impl<T: CredentialStore> CredentialStore for Arc<T> {
    fn list(
        &self,
        scopes: &[CredentialScope],
    ) -> impl std::future::Future<Output = Result<Vec<Credential>, RepositoryError>> + Send {
        (**self).list(scopes)
    }

    fn get(
        &self,
        scope: CredentialScope,
        id: &CredentialId,
    ) -> impl std::future::Future<Output = Result<Option<Credential>, RepositoryError>> + Send {
        (**self).get(scope, id)
    }

    fn put(
        &self,
        credential: Credential,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send {
        (**self).put(credential)
    }

    fn delete(
        &self,
        scope: CredentialScope,
        id: &CredentialId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send {
        (**self).delete(scope, id)
    }
}
