//! Core effect trait definitions
//!
//! Pure trait definitions for every side effect the lock components perform.
//! This module defines **what** effects can be performed; handlers in
//! `lock-effects` define **how**.
//!
//! All effect-using code is parameterized by these traits, so the same claim,
//! grant and lock logic runs against real hardware and the network in
//! production and against simulated handlers in tests.

pub mod claim_record;
pub mod discovery;
pub mod hardware;
pub mod identity;
pub mod time;
pub mod transport;

pub use claim_record::ClaimRecordEffects;
pub use discovery::{Advertisement, DiscoveryEffects, GlobEntry};
pub use hardware::{ExternalToggle, HardwareController};
pub use identity::IdentityEffects;
pub use time::PhysicalTimeEffects;
pub use transport::{
    AuthorizationPolicy, Dispatcher, GrantCall, Granter, Request, Response, ServerCall,
    ServerHandle, TransportEffects,
};
