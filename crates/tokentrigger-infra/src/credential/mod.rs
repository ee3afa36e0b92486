//! Credential store implementations.
//!
//! - [`InMemoryCredentialStore`]: process-local, for embedding and tests
//! - [`FileCredentialStore`]: `credentials.toml` in the data directory

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::InMemoryCredentialStore;
