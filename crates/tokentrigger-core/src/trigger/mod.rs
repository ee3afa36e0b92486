//! Remote job triggering.
//!
//! - `transport`: ports for the outbound POST and the server probe
//! - `executor`: the single-pass trigger state machine

pub mod executor;
pub mod transport;
