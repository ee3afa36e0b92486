//! Infrastructure layer for tokentrigger.
//!
//! Contains implementations of the ports defined in `tokentrigger-core`:
//! the reqwest-backed trigger transport and server probe, in-memory and
//! TOML-file credential stores, plus config loading and data directory
//! resolution.

pub mod config;
pub mod credential;
pub mod filesystem;
pub mod http;
