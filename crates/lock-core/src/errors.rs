//! Unified error system for lock operations
//!
//! A single error type shared by every crate in the workspace. Variants are
//! serializable and cloneable so that a handler's error crosses the RPC
//! boundary unchanged and the remote caller can match on it.

use serde::{Deserialize, Serialize};

/// Unified error type for all lock operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LockError {
    /// Requested lock name is not usable as an identity name
    #[error("Invalid lock name {name:?}: must not contain {separator:?}")]
    InvalidLockName {
        /// The rejected name
        name: String,
        /// The forbidden separator
        separator: String,
    },

    /// The device has already been claimed
    #[error("Lock has already been claimed")]
    AlreadyClaimed,

    /// The holder declined an offered key
    #[error("Key {key} for lock {lock_name} was rejected")]
    KeyRejected {
        /// Display form of the rejected credential
        key: String,
        /// Lock the key was offered for
        lock_name: String,
    },

    /// No stored credential is valid for the lock
    #[error("No valid key for lock {lock_name}")]
    NoValidKey {
        /// Lock that was looked up
        lock_name: String,
    },

    /// Remote party presented an identity other than the expected one
    #[error("Remote end presented identities {presented:?}, want an identity for user {expected}")]
    IdentityMismatch {
        /// Names the remote end presented
        presented: Vec<String>,
        /// The user that was expected
        expected: String,
    },

    /// Sensor did not reach the target state within the bound
    #[error("Lock state unchanged after {waited_ms}ms: might be stuck")]
    HardwareTimeout {
        /// How long the controller waited
        waited_ms: u64,
    },

    /// Transient actuator failure, reported before any state change
    #[error("Hardware fault: {message}")]
    HardwareFault {
        /// Error message describing the fault
        message: String,
    },

    /// RPC-level authorization refused the caller
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Error message describing the permission issue
        message: String,
    },

    /// Object name or resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Internal or infrastructure failure
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl LockError {
    /// Create an invalid lock name error
    pub fn invalid_lock_name(name: impl Into<String>, separator: impl Into<String>) -> Self {
        Self::InvalidLockName {
            name: name.into(),
            separator: separator.into(),
        }
    }

    /// Create a key rejected error
    pub fn key_rejected(key: impl ToString, lock_name: impl Into<String>) -> Self {
        Self::KeyRejected {
            key: key.to_string(),
            lock_name: lock_name.into(),
        }
    }

    /// Create a no valid key error
    pub fn no_valid_key(lock_name: impl Into<String>) -> Self {
        Self::NoValidKey {
            lock_name: lock_name.into(),
        }
    }

    /// Create an identity mismatch error
    pub fn identity_mismatch(presented: Vec<String>, expected: impl Into<String>) -> Self {
        Self::IdentityMismatch {
            presented,
            expected: expected.into(),
        }
    }

    /// Create a hardware timeout error
    pub fn hardware_timeout(waited_ms: u64) -> Self {
        Self::HardwareTimeout { waited_ms }
    }

    /// Create a hardware fault error
    pub fn hardware_fault(message: impl Into<String>) -> Self {
        Self::HardwareFault {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Re-express this error as `Internal`, keeping its message
    pub fn into_internal(self) -> Self {
        match self {
            Self::Internal { .. } => self,
            other => Self::internal(other.to_string()),
        }
    }
}

/// Standard Result type for lock operations
pub type LockResult<T> = std::result::Result<T, LockError>;

impl From<std::io::Error> for LockError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}
