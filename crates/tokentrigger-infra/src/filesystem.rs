//! Data directory layout.
//!
//! ```text
//! {data_dir}/
//!   config.toml       global configuration
//!   credentials.toml  stored credentials
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TOKENTRIGGER_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `TOKENTRIGGER_DATA_DIR` environment variable
/// 2. `~/.tokentrigger`
/// 3. `./.tokentrigger`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".tokentrigger");
    }

    PathBuf::from(".tokentrigger")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

pub fn credentials_path(data_dir: &Path) -> PathBuf {
    data_dir.join("credentials.toml")
}
