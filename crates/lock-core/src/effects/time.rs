//! Physical time interface
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `lock-effects` (real and simulated handlers)
//! - **Usage**: key expiry, listing, hardware polling

use crate::errors::LockResult;
use crate::time::PhysicalTime;
use async_trait::async_trait;
use std::sync::Arc;

/// Wall-clock time and sleeping
#[async_trait]
pub trait PhysicalTimeEffects: Send + Sync {
    /// Current wall-clock time
    async fn physical_time(&self) -> LockResult<PhysicalTime>;

    /// Suspend the caller for `ms` milliseconds
    async fn sleep_ms(&self, ms: u64) -> LockResult<()>;
}

/// Blanket implementation for Arc<T> where T: PhysicalTimeEffects
#[async_trait]
impl<T: PhysicalTimeEffects + ?Sized> PhysicalTimeEffects for Arc<T> {
    async fn physical_time(&self) -> LockResult<PhysicalTime> {
        (**self).physical_time().await
    }

    async fn sleep_ms(&self, ms: u64) -> LockResult<()> {
        (**self).sleep_ms(ms).await
    }
}
