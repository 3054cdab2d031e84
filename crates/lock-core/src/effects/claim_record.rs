//! Durable claim marker interface
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `lock-effects` (filesystem and memory handlers)
//! - **Usage**: claim service, daemon startup
//!
//! The record is existence-only: its presence is the one durable fact the
//! daemon reads across restarts. It is never deleted.

use crate::errors::LockResult;
use async_trait::async_trait;

/// Existence-only claim marker
#[async_trait]
pub trait ClaimRecordEffects: Send + Sync {
    /// Whether the marker exists
    async fn is_claimed(&self) -> LockResult<bool>;

    /// Atomically create the marker if it does not exist
    ///
    /// Returns `true` when this call created it and `false` when it already
    /// existed. The marker is durable when this returns `Ok(true)`; on error
    /// it does not exist.
    async fn create_if_absent(&self) -> LockResult<bool>;
}
