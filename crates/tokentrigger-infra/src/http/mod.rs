//! Outbound HTTP adapters.

pub mod transport;

pub use transport::HttpTriggerTransport;
