//! Lock Core - shared vocabulary for claimable physical locks
//!
//! This crate provides the types and effect interfaces every other crate in
//! the workspace is written against. It contains no handler implementations.
//!
//! ## Contents
//! - `LockError`: the unified error type crossing every boundary
//! - `Credential`, `Restriction`, `IdentityPattern`: capability token data
//! - `LockStatus`, `PhysicalTime`: device and clock values
//! - `naming`: neighborhood and object name conventions
//! - `effects`: identity, time, hardware, claim record, transport, discovery

#![forbid(unsafe_code)]

/// Unified error handling
pub mod errors;

/// Pure effect interfaces (no implementations)
pub mod effects;

/// Neighborhood and object naming conventions
pub mod naming;

/// Wall-clock values
pub mod time;

/// Credential, pattern and status types
pub mod types;

pub use errors::{LockError, LockResult};
pub use time::PhysicalTime;
pub use types::{
    Certificate, CertificateChain, Credential, IdentityPattern, LockStatus, PublicKey,
    Restriction, ALL_PRINCIPALS, CHAIN_SEPARATOR,
};
