//! Simulated time effect handler for testing

use async_trait::async_trait;
use lock_core::effects::PhysicalTimeEffects;
use lock_core::{LockResult, PhysicalTime};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Simulated clock shared between clones
///
/// Sleeping advances the clock by the requested amount and yields instead of
/// waiting, so polling loops and expiries run instantly and deterministically.
#[derive(Debug, Clone)]
pub struct SimulatedTimeHandler {
    current_time: Arc<Mutex<u64>>,
}

impl SimulatedTimeHandler {
    /// Create a new simulated time handler starting at the given time
    pub fn new(start_time_ms: u64) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start_time_ms)),
        }
    }

    /// Advance simulated time by the given duration
    pub fn advance(&self, duration: Duration) {
        let delta = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        let mut time = self.current_time.lock();
        *time = time.saturating_add(delta);
    }

    /// Set the absolute simulated time
    pub fn set_time(&self, time_ms: u64) {
        *self.current_time.lock() = time_ms;
    }

    /// Current simulated time in milliseconds
    pub fn get_time(&self) -> u64 {
        *self.current_time.lock()
    }
}

impl Default for SimulatedTimeHandler {
    fn default() -> Self {
        // 2020-01-01T00:00:00Z keeps expiries well clear of zero
        Self::new(1_577_836_800_000)
    }
}

#[async_trait]
impl PhysicalTimeEffects for SimulatedTimeHandler {
    async fn physical_time(&self) -> LockResult<PhysicalTime> {
        Ok(PhysicalTime::from_ms(self.get_time()))
    }

    async fn sleep_ms(&self, ms: u64) -> LockResult<()> {
        self.advance(Duration::from_millis(ms));
        tokio::task::yield_now().await;
        Ok(())
    }
}
