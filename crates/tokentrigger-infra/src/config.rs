//! Global configuration loader for tokentrigger.
//!
//! Reads `config.toml` from the data directory (`~/.tokentrigger/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use tokentrigger_types::config::GlobalConfig;

use crate::filesystem::config_path;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file exists and parses successfully, returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_global_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_global_config(tmp.path()).await;
        assert!(config.root_url().is_none());
        assert_eq!(config.http.server_header, "X-Jenkins");
    }

    #[tokio::test]
    async fn load_global_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
root_url = "HTTPS://CI.Example.org/"

[http]
proxy = "http://proxy.internal:3128"
server_header = "X-Build-Server"
"#,
        )
        .await
        .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert_eq!(config.root_url().unwrap().as_str(), "https://ci.example.org");
        assert_eq!(config.http.proxy.as_deref(), Some("http://proxy.internal:3128"));
        assert_eq!(config.http.server_header, "X-Build-Server");
        assert!(config.http.user_agent.starts_with("tokentrigger/"));
    }

    #[tokio::test]
    async fn load_global_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_global_config(tmp.path()).await;
        assert!(config.root_url.is_none());
        assert!(config.http.proxy.is_none());
    }
}
