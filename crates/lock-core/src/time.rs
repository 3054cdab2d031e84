//! Wall-clock time values

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PhysicalTime {
    /// Timestamp in milliseconds
    pub ts_ms: u64,
}

impl PhysicalTime {
    /// Create from a millisecond timestamp
    pub const fn from_ms(ts_ms: u64) -> Self {
        Self { ts_ms }
    }

    /// This time shifted forward by `duration`, saturating
    pub fn add(self, duration: Duration) -> Self {
        let delta = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self {
            ts_ms: self.ts_ms.saturating_add(delta),
        }
    }

    /// Time remaining from `self` until `later`, zero if already past
    pub fn until(self, later: PhysicalTime) -> Duration {
        Duration::from_millis(later.ts_ms.saturating_sub(self.ts_ms))
    }
}
