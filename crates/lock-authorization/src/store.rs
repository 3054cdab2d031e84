//! Credential store
//!
//! Keys are peer credentials in the principal's blessing store, keyed by the
//! lock name they open. A credential is a key for lock `L` when the principal
//! displays one of its names as `L/key` or an extension of it.

use lock_core::effects::{IdentityEffects, PhysicalTimeEffects};
use lock_core::naming::{is_valid_lock_name, KEY_EXTENSION};
use lock_core::{Credential, IdentityPattern, LockError, LockResult, PhysicalTime};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Keys held by one principal
#[derive(Clone)]
pub struct CredentialStore {
    identity: Arc<dyn IdentityEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
}

impl CredentialStore {
    /// Store over `identity`'s blessing store, using `time` for expiry
    pub fn new(identity: Arc<dyn IdentityEffects>, time: Arc<dyn PhysicalTimeEffects>) -> Self {
        Self { identity, time }
    }

    /// Principal whose blessing store holds the keys
    pub fn identity(&self) -> &Arc<dyn IdentityEffects> {
        &self.identity
    }

    /// Whether `credential` is a key for `lock_name`
    pub fn valid_for(&self, credential: &Credential, lock_name: &str) -> bool {
        key_pattern(lock_name).matched_by(&self.identity.displayed_names(credential))
    }

    /// Store `credential` as the key for `lock_name`, trusting its roots
    ///
    /// The credential is vetted before its roots are trusted, so a rejected
    /// credential leaves the principal unchanged. A later save for the same
    /// lock replaces the earlier key.
    pub fn save(&self, credential: Credential, lock_name: &str) -> LockResult<()> {
        if !key_pattern(lock_name).matched_by(&self.identity.verified_names(&credential)) {
            warn!(lock_name, key = %credential, "refusing key that does not open the lock");
            return Err(LockError::no_valid_key(lock_name));
        }
        self.identity.add_to_roots(&credential)?;
        if !self.valid_for(&credential, lock_name) {
            return Err(LockError::no_valid_key(lock_name));
        }
        let replaced = self
            .identity
            .set_for_peer(credential.clone(), IdentityPattern::new(lock_name))?;
        if replaced.is_some() {
            debug!(lock_name, "replaced previous key");
        }
        info!(lock_name, key = %credential, "saved key");
        Ok(())
    }

    /// Every stored key for `lock_name`, combined into one credential
    pub fn key_for_lock(&self, lock_name: &str) -> LockResult<Credential> {
        let mut combined: Option<Credential> = None;
        for credential in self.identity.peer_credentials().into_values() {
            if !self.valid_for(&credential, lock_name) {
                continue;
            }
            combined = match combined {
                None => Some(credential),
                Some(existing) => match existing.union(&credential) {
                    Ok(union) => Some(union),
                    Err(e) => {
                        warn!(lock_name, error = %e, "dropping key that cannot be combined");
                        Some(existing)
                    }
                },
            };
        }
        combined.ok_or_else(|| LockError::no_valid_key(lock_name))
    }

    /// Snapshot of the usable keys at the current time
    pub async fn list(&self) -> LockResult<KeyListing> {
        let now = self.time.physical_time().await?;
        Ok(KeyListing {
            store: self.clone(),
            entries: self.identity.peer_credentials().into_iter().collect(),
            now,
        })
    }
}

fn key_pattern(lock_name: &str) -> IdentityPattern {
    IdentityPattern::extending(lock_name, KEY_EXTENSION)
}

/// When a listed key stops working
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryDescription {
    /// The key carries no expiry
    Never,
    /// The key expires after this long
    In(Duration),
}

impl fmt::Display for ExpiryDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("NEVER"),
            Self::In(remaining) => {
                let secs = remaining.as_secs();
                write!(f, "in {}h{}m{}s", secs / 3600, secs / 60 % 60, secs % 60)
            }
        }
    }
}

/// One row of a key listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// Lock the key opens
    pub lock_name: String,
    /// The key itself
    pub key: Credential,
    /// Remaining validity
    pub expires: ExpiryDescription,
}

/// Keys captured by [`CredentialStore::list`]
///
/// Filtering happens as the listing is iterated, and [`KeyListing::iter`] can
/// be called any number of times.
pub struct KeyListing {
    store: CredentialStore,
    entries: Vec<(IdentityPattern, Credential)>,
    now: PhysicalTime,
}

impl KeyListing {
    /// Time the listing was taken at
    pub fn taken_at(&self) -> PhysicalTime {
        self.now
    }

    /// Usable keys: reserved and nested peer patterns, foreign credentials and
    /// expired keys are skipped
    pub fn iter(&self) -> impl Iterator<Item = KeyEntry> + '_ {
        self.entries.iter().filter_map(move |(pattern, key)| {
            let lock_name = pattern.as_str();
            if !is_valid_lock_name(lock_name) || !self.store.valid_for(key, lock_name) {
                return None;
            }
            let expires = match self.store.identity.expiry(key) {
                None => ExpiryDescription::Never,
                Some(at) if self.now > at => return None,
                Some(at) => ExpiryDescription::In(self.now.until(at)),
            };
            Some(KeyEntry {
                lock_name: lock_name.to_string(),
                key: key.clone(),
                expires,
            })
        })
    }
}
