//! Application state wiring infra implementations into core services.
//!
//! Services are generic over the store/transport ports; AppState pins them to
//! the file-backed credential store and the reqwest transport.

use std::sync::Arc;

use anyhow::Context;

use tokentrigger_core::service::credential::CredentialService;
use tokentrigger_core::trigger::executor::TriggerExecutor;
use tokentrigger_infra::config::load_global_config;
use tokentrigger_infra::credential::FileCredentialStore;
use tokentrigger_infra::filesystem::{credentials_path, resolve_data_dir};
use tokentrigger_infra::http::HttpTriggerTransport;
use tokentrigger_types::server_url::ServerUrl;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteCredentialService = CredentialService<Arc<FileCredentialStore>>;

pub type ConcreteExecutor = TriggerExecutor<Arc<FileCredentialStore>, HttpTriggerTransport>;

/// Shared state for CLI commands.
pub struct AppState {
    /// Default trigger target: `--root-url`, else `root_url` from config.toml.
    pub root_url: Option<ServerUrl>,
    store: Arc<FileCredentialStore>,
    transport: HttpTriggerTransport,
}

impl AppState {
    /// Resolve the data directory, load config, open the credential store.
    pub async fn init(root_url_override: Option<&str>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;
        let root_url = ServerUrl::from_optional(root_url_override).or_else(|| config.root_url());

        let store = FileCredentialStore::open(credentials_path(&data_dir))
            .await
            .context("failed to open credential store")?;
        let transport = HttpTriggerTransport::new(&config.http)?;

        tracing::debug!(
            data_dir = %data_dir.display(),
            root_url = root_url.as_ref().map(ServerUrl::as_str),
            "initialized app state"
        );

        Ok(Self {
            root_url,
            store: Arc::new(store),
            transport,
        })
    }

    pub fn credentials(&self) -> ConcreteCredentialService {
        CredentialService::new(Arc::clone(&self.store))
    }

    pub fn executor(&self) -> ConcreteExecutor {
        TriggerExecutor::new(self.credentials(), self.transport.clone())
            .with_root_url(self.root_url.clone())
    }

    pub fn transport(&self) -> &HttpTriggerTransport {
        &self.transport
    }
}
