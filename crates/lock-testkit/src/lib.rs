//! Lock Testing Infrastructure
//!
//! Deterministic fixtures shared by the integration tests: a simulated
//! neighborhood with one clock and one identity provider, users blessed by
//! that provider, devices on simulated hardware, and scripted answers to key
//! offers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```rust,no_run
//! use lock_testkit::TestNeighborhood;
//!
//! # async fn example() {
//! let nh = TestNeighborhood::new();
//! let alice = nh.user("alice");
//! let device = nh.device();
//! # }
//! ```

pub mod confirmation;
pub mod neighborhood;

pub use confirmation::ScriptedConfirmation;
pub use neighborhood::{TestDevice, TestNeighborhood, TestUser, PROVIDER};
