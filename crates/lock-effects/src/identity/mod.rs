//! Identity effect handlers

pub mod principal;

pub use principal::{verify_chain, LocalPrincipal, PRINCIPAL_FILE};
