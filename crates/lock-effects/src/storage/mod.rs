//! Claim record handlers

pub mod filesystem;
pub mod memory;

pub use filesystem::{FilesystemClaimRecord, CLAIM_FILE};
pub use memory::MemoryClaimRecord;
