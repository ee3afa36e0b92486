//! Global configuration types for tokentrigger.
//!
//! `GlobalConfig` represents the top-level `config.toml`: the host's own
//! root URL (the default trigger target) and outbound HTTP settings.

use serde::{Deserialize, Serialize};

use crate::server_url::ServerUrl;

/// Top-level configuration.
///
/// Loaded from `~/.tokentrigger/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Root URL of this build server, used when a step names no target.
    #[serde(default)]
    pub root_url: Option<String>,

    #[serde(default)]
    pub http: HttpConfig,
}

impl GlobalConfig {
    /// The normalized root URL, if one is configured and non-blank.
    pub fn root_url(&self) -> Option<ServerUrl> {
        ServerUrl::from_optional(self.root_url.as_deref())
    }
}

/// Outbound HTTP settings shared by trigger requests and URL probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Proxy for all outbound requests (e.g. `http://proxy:3128`).
    #[serde(default)]
    pub proxy: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Response header that identifies a compatible build server.
    #[serde(default = "default_server_header")]
    pub server_header: String,
}

fn default_user_agent() -> String {
    concat!("tokentrigger/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_server_header() -> String {
    "X-Jenkins".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            user_agent: default_user_agent(),
            server_header: default_server_header(),
        }
    }
}
