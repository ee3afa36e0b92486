//! Repository trait definitions (ports).
//!
//! The infrastructure layer (tokentrigger-infra) implements these; the core
//! crate never depends on a specific storage technology.

pub mod credential;
