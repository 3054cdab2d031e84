//! Transport and discovery handlers

pub mod memory;

pub use memory::{MemoryNetwork, MemoryTransport};
