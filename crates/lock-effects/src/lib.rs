//! Lock Effects - handlers for the lock effect interfaces
//!
//! Each module implements traits from `lock_core::effects` for production and
//! for tests. Handlers are stateless apart from the resource they wrap and
//! hold no lock protocol logic.
//!
//! | Interface | Production | Testing |
//! |---|---|---|
//! | `IdentityEffects` | `LocalPrincipal` (persisted) | `LocalPrincipal::from_seed` |
//! | `PhysicalTimeEffects` | `RealTimeHandler` | `SimulatedTimeHandler` |
//! | `HardwareController` | `RealHardware` | `SimulatedHardware` |
//! | `ClaimRecordEffects` | `FilesystemClaimRecord` | `MemoryClaimRecord` |
//! | `TransportEffects`, `DiscoveryEffects` | `MemoryTransport` | `MemoryTransport` |

#![forbid(unsafe_code)]

pub mod hardware;
pub mod identity;
pub mod storage;
pub mod time;
pub mod transport;

pub use hardware::{PollingConfig, RealHardware, SimulatedHardware};
pub use identity::LocalPrincipal;
pub use storage::{FilesystemClaimRecord, MemoryClaimRecord};
pub use time::{RealTimeHandler, SimulatedTimeHandler};
pub use transport::{MemoryNetwork, MemoryTransport};
