//! Lock Authorization - keys and their delegation
//!
//! - [`CredentialStore`]: validates, saves and lists keys per lock name
//! - [`send_key`] / [`KeyGranter`]: mint a narrower key for an authenticated recipient
//! - [`recv_key`] / [`RecvKeyService`]: accept one confirmed key

#![forbid(unsafe_code)]

pub mod grant;
pub mod recv;
pub mod store;

pub use grant::{send_key, KeyGranter, SendKeyRequest};
pub use recv::{recv_key, KeyConfirmation, KeyOffer, RecvKeyContext, RecvKeyService};
pub use store::{CredentialStore, ExpiryDescription, KeyEntry, KeyListing};
