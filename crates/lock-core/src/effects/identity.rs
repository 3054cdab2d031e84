//! Identity infrastructure interface
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `lock-effects` (`LocalPrincipal`)
//! - **Usage**: claim service, credential store, grant protocol, transport
//!
//! The principal signs, verifies and stores credentials. Restriction
//! evaluation lives here and nowhere else: callers ask for the names a
//! credential is good for and never inspect restrictions themselves.
//! Operations are local and CPU-bound, so the interface is synchronous.

use crate::errors::LockResult;
use crate::time::PhysicalTime;
use crate::types::{Credential, IdentityPattern, PublicKey, Restriction};
use std::collections::BTreeMap;

/// Principal operations consumed by the lock components
pub trait IdentityEffects: Send + Sync {
    /// This principal's public key
    fn public_key(&self) -> PublicKey;

    /// Create a self-signed root credential named `name`
    fn bless_self(&self, name: &str) -> LockResult<Credential>;

    /// Extend `base` (held by this principal) to `subject` under `extension`
    fn bless(
        &self,
        subject: PublicKey,
        base: &Credential,
        extension: &str,
        restrictions: Vec<Restriction>,
    ) -> LockResult<Credential>;

    /// Trust the roots of every chain in `credential`
    fn add_to_roots(&self, credential: &Credential) -> LockResult<()>;

    /// Names of `credential` whose chains verify against a recognized root
    ///
    /// Restrictions are not evaluated.
    fn displayed_names(&self, credential: &Credential) -> Vec<String>;

    /// Names of `credential` whose chains verify, trusted or not
    ///
    /// Used to vet a credential before deciding to trust its roots.
    fn verified_names(&self, credential: &Credential) -> Vec<String>;

    /// Names of a credential presented by a remote party during a call
    ///
    /// Only chains that verify, have a recognized root, and whose every
    /// restriction holds for a peer presenting `peer_names` at `now` count.
    fn remote_names(
        &self,
        credential: &Credential,
        peer_names: &[String],
        now: PhysicalTime,
    ) -> Vec<String>;

    /// When the credential stops being usable, if ever
    fn expiry(&self, credential: &Credential) -> Option<PhysicalTime> {
        credential.earliest_expiry()
    }

    /// Credential presented when no peer-specific one applies
    fn default_credential(&self) -> Credential;

    /// Replace the default credential
    fn set_default(&self, credential: Credential) -> LockResult<()>;

    /// Store a credential for peers matching `pattern`, returning the one replaced
    fn set_for_peer(
        &self,
        credential: Credential,
        pattern: IdentityPattern,
    ) -> LockResult<Option<Credential>>;

    /// Every stored peer credential keyed by pattern
    fn peer_credentials(&self) -> BTreeMap<IdentityPattern, Credential>;

    /// Union of stored credentials whose pattern is matched by `peer_names`
    fn for_peer(&self, peer_names: &[String]) -> Option<Credential> {
        self.peer_credentials()
            .into_iter()
            .filter(|(pattern, _)| pattern.matched_by(peer_names))
            .map(|(_, credential)| credential)
            .fold(None, |acc: Option<Credential>, credential| match acc {
                None => Some(credential),
                Some(existing) => Some(existing.union(&credential).unwrap_or(existing)),
            })
    }
}
