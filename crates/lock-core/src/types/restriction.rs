//! Restrictions narrowing what a credential authorizes

use super::pattern::IdentityPattern;
use crate::time::PhysicalTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A condition attached to a certificate when it is issued
///
/// A credential is usable only when every restriction on every certificate
/// of one of its chains holds. Evaluation belongs to the identity handler;
/// this type only carries the data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Restriction {
    /// Usable only against a peer whose names match the pattern
    PeerPattern(IdentityPattern),
    /// Usable only before the given instant
    ExpiresAt(PhysicalTime),
}

impl Restriction {
    /// Restrict usage to the lock with the given name
    pub fn only_lock(lock_name: &str) -> Self {
        Self::PeerPattern(IdentityPattern::new(lock_name))
    }

    /// Expiry carried by this restriction, if any
    pub fn expiry(&self) -> Option<PhysicalTime> {
        match self {
            Self::ExpiresAt(at) => Some(*at),
            Self::PeerPattern(_) => None,
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerPattern(pattern) => write!(f, "peer({pattern})"),
            Self::ExpiresAt(at) => write!(f, "expires({})", at.ts_ms),
        }
    }
}
