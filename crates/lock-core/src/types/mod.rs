//! Domain types shared across the workspace

pub mod credential;
pub mod pattern;
pub mod restriction;
pub mod status;

pub use credential::{chain_name, Certificate, CertificateChain, Credential, PublicKey};
pub use pattern::{names_related, IdentityPattern, ALL_PRINCIPALS, CHAIN_SEPARATOR};
pub use restriction::Restriction;
pub use status::LockStatus;
