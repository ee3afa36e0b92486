//! Credential lookup service.
//!
//! `CredentialService` answers the two questions the trigger path and the
//! configuration UI ask of the credential store:
//!
//! - find a credential by id that has the trigger capability and is bound
//!   to a given server URL;
//! - list the credentials usable against a given server URL.
//!
//! Both filters (capability match and URL-equality match) are explicit in
//! [`CredentialMatcher`]; both sides of the URL comparison are normalized
//! independently.

use tokentrigger_types::credential::{Credential, CredentialId, CredentialScope};
use tokentrigger_types::error::RepositoryError;
use tokentrigger_types::server_url::ServerUrl;

use crate::context::LookupContext;
use crate::repository::credential::CredentialStore;

/// URL constraint applied to a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRequirement {
    /// Any bound URL is acceptable.
    Any,
    /// The credential's bound URL must equal this one.
    Exact(ServerUrl),
}

impl UrlRequirement {
    /// Requirement derived from a raw URI; normalized before comparison.
    pub fn from_uri(raw: &str) -> Self {
        UrlRequirement::Exact(ServerUrl::new(raw))
    }
}

/// Filters applied to every lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialMatcher {
    /// Only credentials exposing the trigger capability.
    pub require_trigger_capability: bool,
    pub url: UrlRequirement,
}

impl CredentialMatcher {
    /// Trigger-capable credentials bound to `url`.
    pub fn trigger_for(url: UrlRequirement) -> Self {
        Self {
            require_trigger_capability: true,
            url,
        }
    }

    pub fn matches(&self, credential: &Credential) -> bool {
        let capability = credential.trigger_credentials();
        if self.require_trigger_capability && capability.is_none() {
            return false;
        }
        match &self.url {
            UrlRequirement::Any => true,
            UrlRequirement::Exact(url) => capability.is_some_and(|c| c.target_url() == url),
        }
    }
}

/// A selectable credential: id plus description, never the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialItem {
    pub id: CredentialId,
    pub description: String,
}

/// Service for finding, listing and managing credentials in a store.
pub struct CredentialService<S> {
    store: S,
}

impl<S: CredentialStore> CredentialService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Find the credential with `id` visible to `ctx` that satisfies `matcher`.
    ///
    /// Scopes are searched in visibility order; the first match wins.
    pub async fn find(
        &self,
        id: &CredentialId,
        ctx: &LookupContext,
        matcher: &CredentialMatcher,
    ) -> Result<Option<Credential>, RepositoryError> {
        for scope in ctx.visible_scopes() {
            if let Some(credential) = self.store.get(*scope, id).await? {
                if matcher.matches(&credential) {
                    return Ok(Some(credential));
                }
            }
        }
        Ok(None)
    }

    /// Credentials usable against `raw_url`, sorted by id.
    pub async fn list_for_url(
        &self,
        ctx: &LookupContext,
        raw_url: &str,
    ) -> Result<Vec<CredentialItem>, RepositoryError> {
        let matcher = CredentialMatcher::trigger_for(UrlRequirement::from_uri(raw_url));
        let mut items: Vec<CredentialItem> = self
            .store
            .list(ctx.visible_scopes())
            .await?
            .into_iter()
            .filter(|credential| matcher.matches(credential))
            .map(|credential| CredentialItem {
                id: credential.id,
                description: credential.description,
            })
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items.dedup_by(|a, b| a.id == b.id);
        Ok(items)
    }

    /// Every credential visible to `ctx`, sorted by scope then id.
    pub async fn list(&self, ctx: &LookupContext) -> Result<Vec<Credential>, RepositoryError> {
        let mut credentials = self.store.list(ctx.visible_scopes()).await?;
        credentials.sort_by(|a, b| {
            scope_rank(a.scope)
                .cmp(&scope_rank(b.scope))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(credentials)
    }

    /// Add or replace a credential.
    pub async fn save(&self, credential: Credential) -> Result<(), RepositoryError> {
        tracing::debug!(id = %credential.id, scope = %credential.scope, kind = credential.kind.name(), "saving credential");
        self.store.put(credential).await
    }

    pub async fn remove(
        &self,
        scope: CredentialScope,
        id: &CredentialId,
    ) -> Result<(), RepositoryError> {
        tracing::debug!(%id, %scope, "removing credential");
        self.store.delete(scope, id).await
    }
}

fn scope_rank(scope: CredentialScope) -> u8 {
    match scope {
        CredentialScope::Global => 0,
        CredentialScope::System => 1,
    }
}
