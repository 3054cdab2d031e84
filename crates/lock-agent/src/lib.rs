//! Lock Agent - the lock daemon and its client helpers
//!
//! The daemon starts unclaimed, serving [`ClaimService`] to anyone in the
//! neighborhood. The first claim makes it a named lock; from then on it
//! serves [`LockService`] to holders of keys for that name, across restarts.
//!
//! ## Modules
//! - `config`: `lockd.toml` and the configuration directory
//! - `hardware`: controller selection from configuration
//! - `claim`, `lock_service`: the two services the daemon mounts
//! - `runtime`: the unclaimed to claimed lifecycle
//! - `client`, `scan`: what owners and users call

#![forbid(unsafe_code)]

pub mod claim;
pub mod client;
pub mod config;
pub mod hardware;
pub mod lock_service;
pub mod runtime;
pub mod scan;

pub use claim::{ClaimService, ClaimedSignal};
pub use client::{claim_lock, query_status, update_status};
pub use config::{ConfigDir, DaemonConfig, HardwareConfig, HardwareKind, NamingConfig, CONFIG_FILE};
pub use hardware::{build_hardware, HardwareHandles};
pub use lock_service::LockService;
pub use runtime::{start_daemon, DaemonContext, DaemonHandle, DaemonPhase};
pub use scan::{scan_neighborhood, NeighborhoodEntry};
