//! Real time effect handler for production use

use async_trait::async_trait;
use lock_core::effects::PhysicalTimeEffects;
use lock_core::{LockError, LockResult, PhysicalTime};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Real time handler backed by the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct RealTimeHandler;

impl RealTimeHandler {
    /// Create a new real time handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhysicalTimeEffects for RealTimeHandler {
    async fn physical_time(&self) -> LockResult<PhysicalTime> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| LockError::internal(format!("system clock before Unix epoch: {e}")))?;
        let ts_ms = u64::try_from(since_epoch.as_millis())
            .map_err(|_| LockError::internal("system clock out of range"))?;
        Ok(PhysicalTime::from_ms(ts_ms))
    }

    async fn sleep_ms(&self, ms: u64) -> LockResult<()> {
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(())
    }
}
