//! Physical lock status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current state of the physical lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockStatus {
    /// Bolt engaged
    Locked,
    /// Bolt released
    Unlocked,
}

impl LockStatus {
    /// The opposite state, used by external toggles
    pub fn toggled(self) -> Self {
        match self {
            Self::Locked => Self::Unlocked,
            Self::Unlocked => Self::Locked,
        }
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => f.write_str("LOCKED"),
            Self::Unlocked => f.write_str("UNLOCKED"),
        }
    }
}
