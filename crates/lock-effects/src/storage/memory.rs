//! In-memory claim record for tests

use async_trait::async_trait;
use lock_core::effects::ClaimRecordEffects;
use lock_core::{LockError, LockResult};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct RecordState {
    claimed: bool,
    fail_next_write: bool,
    fail_next_sync: bool,
    discarded: usize,
}

/// Claim marker held in memory; clones share state
#[derive(Debug, Clone, Default)]
pub struct MemoryClaimRecord {
    state: Arc<Mutex<RecordState>>,
}

impl MemoryClaimRecord {
    /// Unclaimed record
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that already reports a claim
    pub fn claimed() -> Self {
        let record = Self::default();
        record.state.lock().claimed = true;
        record
    }

    /// Make the next `create_if_absent` fail with an I/O style error
    pub fn fail_next_write(&self) {
        self.state.lock().fail_next_write = true;
    }

    /// Make the next `create_if_absent` create the marker and then fail to sync it
    pub fn fail_next_sync(&self) {
        self.state.lock().fail_next_sync = true;
    }

    /// Markers created and then removed because they could not be synced
    pub fn discarded(&self) -> usize {
        self.state.lock().discarded
    }
}

#[async_trait]
impl ClaimRecordEffects for MemoryClaimRecord {
    async fn is_claimed(&self) -> LockResult<bool> {
        Ok(self.state.lock().claimed)
    }

    async fn create_if_absent(&self) -> LockResult<bool> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next_write) {
            return Err(LockError::internal("injected claim record write failure"));
        }
        if state.claimed {
            return Ok(false);
        }
        state.claimed = true;
        if std::mem::take(&mut state.fail_next_sync) {
            state.claimed = false;
            state.discarded += 1;
            return Err(LockError::internal("injected claim record sync failure"));
        }
        Ok(true)
    }
}
