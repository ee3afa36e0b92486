//! Shared domain types for tokentrigger.
//!
//! This crate contains the domain types used across the workspace:
//! canonical server URLs, build-token credentials, trigger steps and
//! requests, global configuration, and their associated error types.
//!
//! Zero I/O dependencies -- only serde, url, secrecy, thiserror.

pub mod config;
pub mod credential;
pub mod error;
pub mod server_url;
pub mod trigger;
