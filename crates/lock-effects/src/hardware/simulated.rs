//! Simulated lock hardware
//!
//! The bolt lives in memory and starts unlocked. Each actuation fails with
//! the configured probability, leaving the state untouched.

use async_trait::async_trait;
use lock_core::effects::{ExternalToggle, HardwareController};
use lock_core::{LockError, LockResult, LockStatus};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

/// In-memory bolt with random actuation failures
pub struct SimulatedHardware {
    status: Mutex<LockStatus>,
    actuation: tokio::sync::Mutex<()>,
    failure_rate: f64,
    rng: Mutex<ChaCha8Rng>,
}

impl SimulatedHardware {
    /// Simulated bolt failing with probability `failure_rate`, reproducible from `seed`
    pub fn new(failure_rate: f64, seed: u64) -> LockResult<Self> {
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(LockError::config(format!(
                "failure rate {failure_rate} is outside [0, 1]"
            )));
        }
        Ok(Self {
            status: Mutex::new(LockStatus::Unlocked),
            actuation: tokio::sync::Mutex::new(()),
            failure_rate,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        })
    }

    /// Simulated bolt that never fails
    pub fn reliable() -> Self {
        Self {
            status: Mutex::new(LockStatus::Unlocked),
            actuation: tokio::sync::Mutex::new(()),
            failure_rate: 0.0,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(0)),
        }
    }
}

#[async_trait]
impl HardwareController for SimulatedHardware {
    fn status(&self) -> LockStatus {
        *self.status.lock()
    }

    async fn set_status(&self, target: LockStatus) -> LockResult<()> {
        let _guard = self.actuation.lock().await;
        if self.rng.lock().gen_bool(self.failure_rate) {
            warn!(%target, "simulated actuation failure");
            return Err(LockError::hardware_fault(
                "simulated error: lock failed to toggle - check the door",
            ));
        }
        *self.status.lock() = target;
        Ok(())
    }
}

impl ExternalToggle for SimulatedHardware {
    fn toggle_externally(&self) -> LockStatus {
        let mut status = self.status.lock();
        let now = status.toggled();
        *status = now;
        info!(status = %now, "simulated: externally initiated status change");
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_follows_last_success() {
        let hw = SimulatedHardware::new(0.1, 7).unwrap();
        let mut expected = hw.status();
        let mut failures = 0;
        for trial in 0..1_000 {
            let target = if trial % 2 == 0 {
                LockStatus::Locked
            } else {
                LockStatus::Unlocked
            };
            match hw.set_status(target).await {
                Ok(()) => expected = target,
                Err(e) => {
                    assert!(matches!(e, LockError::HardwareFault { .. }));
                    failures += 1;
                }
            }
            assert_eq!(hw.status(), expected);
        }
        assert!(failures > 0 && failures < 1_000);
    }

    #[test]
    fn test_external_toggle_flips_state() {
        let hw = SimulatedHardware::reliable();
        assert_eq!(hw.status(), LockStatus::Unlocked);
        assert_eq!(hw.toggle_externally(), LockStatus::Locked);
        assert_eq!(hw.status(), LockStatus::Locked);
    }

    #[test]
    fn test_rejects_bad_failure_rate() {
        assert!(SimulatedHardware::new(1.5, 0).is_err());
    }
}
