//! In-memory credential store.

use std::collections::HashMap;

use tokio::sync::RwLock;

use tokentrigger_core::repository::credential::CredentialStore;
use tokentrigger_types::credential::{Credential, CredentialId, CredentialScope};
use tokentrigger_types::error::RepositoryError;

/// Credentials held in a map keyed by `(scope, id)`.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    entries: RwLock<HashMap<(CredentialScope, CredentialId), Credential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `credentials`. Later duplicates replace earlier ones.
    pub fn with_credentials(credentials: impl IntoIterator<Item = Credential>) -> Self {
        let entries = credentials
            .into_iter()
            .map(|credential| ((credential.scope, credential.id.clone()), credential))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl CredentialStore for InMemoryCredentialStore {
    async fn list(&self, scopes: &[CredentialScope]) -> Result<Vec<Credential>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|credential| scopes.contains(&credential.scope))
            .cloned()
            .collect())
    }

    async fn get(
        &self,
        scope: CredentialScope,
        id: &CredentialId,
    ) -> Result<Option<Credential>, RepositoryError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(scope, id.clone())).cloned())
    }

    async fn put(&self, credential: Credential) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries.insert((credential.scope, credential.id.clone()), credential);
        Ok(())
    }

    async fn delete(&self, scope: CredentialScope, id: &CredentialId) -> Result<(), RepositoryError> {
        let mut entries = self.entries.write().await;
        entries
            .remove(&(scope, id.clone()))
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}
