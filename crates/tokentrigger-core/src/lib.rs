//! Business logic and port definitions for tokentrigger.
//!
//! This crate defines the "ports" (credential store, trigger transport,
//! server probe) that the infrastructure layer implements, plus the logic
//! built on them: credential lookup, the trigger executor and form
//! validation. It depends only on `tokentrigger-types` -- never on
//! `tokentrigger-infra` or any network/IO crate.

pub mod context;
pub mod repository;
pub mod service;
pub mod trigger;
pub mod validation;
