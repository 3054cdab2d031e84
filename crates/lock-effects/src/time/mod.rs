//! Time effect handlers
//!
//! - `RealTimeHandler`: system clock and tokio timers
//! - `SimulatedTimeHandler`: manually driven clock for deterministic tests

pub mod real;
pub mod simulated;

pub use real::RealTimeHandler;
pub use simulated::SimulatedTimeHandler;
