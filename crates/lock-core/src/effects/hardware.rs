//! Hardware controller interface
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `lock-effects` (`RealHardware`, `SimulatedHardware`)
//! - **Usage**: lock service
//!
//! The controller is constructed once at startup and injected into the lock
//! service. Operator-driven state changes used for testing are a separate
//! interface so the production control path never exposes them.

use crate::errors::LockResult;
use crate::types::LockStatus;
use async_trait::async_trait;

/// Drives the actuator and reads the sensor
#[async_trait]
pub trait HardwareController: Send + Sync {
    /// Current sensor reading; never blocks on an in-flight actuation
    fn status(&self) -> LockStatus;

    /// Move the lock to `target`
    ///
    /// Actuations are serialized. Returns `HardwareTimeout` when the sensor
    /// does not report `target` within the configured bound; success implies
    /// the sensor reported `target`.
    async fn set_status(&self, target: LockStatus) -> LockResult<()>;
}

/// Out-of-band state changes, as if someone turned the knob by hand
pub trait ExternalToggle: Send + Sync {
    /// Flip the state and return the new one
    fn toggle_externally(&self) -> LockStatus;
}
