//! Hardware effect handlers
//!
//! - `RealHardware`: relay output and bolt sensor on GPIO pins
//! - `SimulatedHardware`: in-memory bolt with injectable failures

pub mod gpio;
pub mod pins;
pub mod simulated;

pub use gpio::RealHardware;
pub use pins::{InputPin, MemoryPin, OutputPin, PinDirection, SysfsPin};
pub use simulated::SimulatedHardware;

/// Timing of the actuation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Delay between sensor reads while waiting for the bolt
    pub poll_interval_ms: u64,
    /// Give up once the bolt has not moved for this long
    pub toggle_timeout_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            toggle_timeout_ms: 5_000,
        }
    }
}
