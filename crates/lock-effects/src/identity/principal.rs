//! Ed25519 principal with a blessing store and trusted roots
//!
//! Every certificate is signed by the key of the certificate before it in its
//! chain; the root certificate is self-signed. The signed payload covers the
//! parent's signature, so links cannot be spliced between chains.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use lock_core::effects::IdentityEffects;
use lock_core::types::{chain_name, CHAIN_SEPARATOR};
use lock_core::{
    Certificate, Credential, IdentityPattern, LockError, LockResult, PhysicalTime, PublicKey,
    Restriction,
};
use parking_lot::RwLock;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File the principal is persisted to inside a config directory
pub const PRINCIPAL_FILE: &str = "principal.json";

#[derive(Serialize)]
struct SignedContent<'a> {
    parent_signature: &'a [u8],
    extension: &'a str,
    public_key: &'a PublicKey,
    restrictions: &'a [Restriction],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TrustedRoot {
    key: PublicKey,
    pattern: IdentityPattern,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BlessingState {
    default: Credential,
    peers: BTreeMap<IdentityPattern, Credential>,
    roots: Vec<TrustedRoot>,
}

#[derive(Serialize, Deserialize)]
struct PersistedPrincipal {
    secret_key: String,
    state: BlessingState,
}

/// Local principal backed by an Ed25519 signing key
pub struct LocalPrincipal {
    signing_key: SigningKey,
    state: RwLock<BlessingState>,
    persist_path: Option<PathBuf>,
}

impl std::fmt::Debug for LocalPrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPrincipal")
            .field("public_key", &self.public_key())
            .field("default", &self.state.read().default.names())
            .finish_non_exhaustive()
    }
}

impl LocalPrincipal {
    /// Fresh principal whose default credential is a self-blessing named `name`
    pub fn new(name: &str) -> LockResult<Self> {
        Self::from_signing_key(SigningKey::generate(&mut OsRng), name)
    }

    /// Deterministic principal for tests and simulations
    pub fn from_seed(seed: [u8; 32], name: &str) -> LockResult<Self> {
        Self::from_signing_key(SigningKey::from_bytes(&seed), name)
    }

    fn from_signing_key(signing_key: SigningKey, name: &str) -> LockResult<Self> {
        let default = self_blessing(&signing_key, name)?;
        let roots = vec![TrustedRoot {
            key: public_key_of(&signing_key),
            pattern: IdentityPattern::new(name),
        }];
        Ok(Self {
            signing_key,
            state: RwLock::new(BlessingState {
                default,
                peers: BTreeMap::new(),
                roots,
            }),
            persist_path: None,
        })
    }

    /// Load the principal stored in `dir`, or create and store a new one named `name`
    ///
    /// Every later change to the blessing store is written back to the same file.
    pub fn load_or_create(dir: &Path, name: &str) -> LockResult<Self> {
        let path = dir.join(PRINCIPAL_FILE);
        let mut principal = if path.exists() {
            let bytes = fs::read(&path)?;
            let persisted: PersistedPrincipal = serde_json::from_slice(&bytes).map_err(|e| {
                LockError::config(format!("corrupt principal file {}: {e}", path.display()))
            })?;
            let secret = decode_secret(&persisted.secret_key)?;
            debug!(path = %path.display(), "loaded principal");
            Self {
                signing_key: SigningKey::from_bytes(&secret),
                state: RwLock::new(persisted.state),
                persist_path: None,
            }
        } else {
            Self::new(name)?
        };
        principal.persist_path = Some(path);
        principal.persist()?;
        Ok(principal)
    }

    fn persist(&self) -> LockResult<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let persisted = PersistedPrincipal {
            secret_key: hex::encode(self.signing_key.to_bytes()),
            state: self.state.read().clone(),
        };
        let bytes = serde_json::to_vec_pretty(&persisted)
            .map_err(|e| LockError::internal(format!("failed to encode principal: {e}")))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn recognized(&self, chain: &[Certificate]) -> bool {
        let Some(root) = chain.first() else {
            return false;
        };
        self.state.read().roots.iter().any(|trusted| {
            trusted.key == root.public_key && trusted.pattern.matched_by(&[&root.extension])
        })
    }

    fn require_own(&self, credential: &Credential) -> LockResult<()> {
        if credential.public_key() == self.public_key() {
            Ok(())
        } else {
            Err(LockError::internal(format!(
                "credential {credential} is bound to {} and not to this principal",
                credential.public_key()
            )))
        }
    }
}

impl IdentityEffects for LocalPrincipal {
    fn public_key(&self) -> PublicKey {
        public_key_of(&self.signing_key)
    }

    fn bless_self(&self, name: &str) -> LockResult<Credential> {
        self_blessing(&self.signing_key, name)
    }

    fn bless(
        &self,
        subject: PublicKey,
        base: &Credential,
        extension: &str,
        restrictions: Vec<Restriction>,
    ) -> LockResult<Credential> {
        self.require_own(base)?;
        check_extension(extension)?;
        let chains = base
            .chains()
            .iter()
            .map(|chain| -> LockResult<Vec<Certificate>> {
                let parent_signature = chain.last().map(|c| c.signature.as_slice()).unwrap_or(&[]);
                let mut extended = chain.clone();
                extended.push(sign_certificate(
                    &self.signing_key,
                    parent_signature,
                    extension,
                    subject,
                    restrictions.clone(),
                )?);
                Ok(extended)
            })
            .collect::<LockResult<Vec<_>>>()?;
        Credential::new(subject, chains)
    }

    fn add_to_roots(&self, credential: &Credential) -> LockResult<()> {
        {
            let mut state = self.state.write();
            for root in credential.chains().iter().filter_map(|chain| chain.first()) {
                let trusted = TrustedRoot {
                    key: root.public_key,
                    pattern: IdentityPattern::new(root.extension.clone()),
                };
                if !state.roots.contains(&trusted) {
                    debug!(root = %trusted.pattern, key = %trusted.key, "trusting root");
                    state.roots.push(trusted);
                }
            }
        }
        self.persist()
    }

    fn displayed_names(&self, credential: &Credential) -> Vec<String> {
        credential
            .chains()
            .iter()
            .filter(|chain| verify_chain(chain) && self.recognized(chain))
            .map(|chain| chain_name(chain))
            .collect()
    }

    fn verified_names(&self, credential: &Credential) -> Vec<String> {
        credential
            .chains()
            .iter()
            .filter(|chain| verify_chain(chain))
            .map(|chain| chain_name(chain))
            .collect()
    }

    fn remote_names(
        &self,
        credential: &Credential,
        peer_names: &[String],
        now: PhysicalTime,
    ) -> Vec<String> {
        credential
            .chains()
            .iter()
            .filter(|chain| verify_chain(chain) && self.recognized(chain))
            .filter(|chain| {
                chain
                    .iter()
                    .flat_map(|cert| cert.restrictions.iter())
                    .all(|restriction| match restriction {
                        Restriction::PeerPattern(pattern) => pattern.matched_by(peer_names),
                        Restriction::ExpiresAt(at) => now < *at,
                    })
            })
            .map(|chain| chain_name(chain))
            .collect()
    }

    fn default_credential(&self) -> Credential {
        self.state.read().default.clone()
    }

    fn set_default(&self, credential: Credential) -> LockResult<()> {
        self.require_own(&credential)?;
        self.state.write().default = credential;
        self.persist()
    }

    fn set_for_peer(
        &self,
        credential: Credential,
        pattern: IdentityPattern,
    ) -> LockResult<Option<Credential>> {
        self.require_own(&credential)?;
        if !pattern.is_valid() {
            return Err(LockError::internal(format!("invalid peer pattern {pattern:?}")));
        }
        let previous = self.state.write().peers.insert(pattern, credential);
        self.persist()?;
        Ok(previous)
    }

    fn peer_credentials(&self) -> BTreeMap<IdentityPattern, Credential> {
        self.state.read().peers.clone()
    }
}

fn public_key_of(signing_key: &SigningKey) -> PublicKey {
    PublicKey(signing_key.verifying_key().to_bytes())
}

fn check_extension(extension: &str) -> LockResult<()> {
    if extension.is_empty() || extension.contains(CHAIN_SEPARATOR) {
        return Err(LockError::invalid_lock_name(extension, CHAIN_SEPARATOR));
    }
    Ok(())
}

fn self_blessing(signing_key: &SigningKey, name: &str) -> LockResult<Credential> {
    check_extension(name)?;
    let subject = public_key_of(signing_key);
    let root = sign_certificate(signing_key, &[], name, subject, Vec::new())?;
    Credential::new(subject, vec![vec![root]])
}

fn signed_bytes(
    parent_signature: &[u8],
    extension: &str,
    public_key: &PublicKey,
    restrictions: &[Restriction],
) -> LockResult<Vec<u8>> {
    bincode::serialize(&SignedContent {
        parent_signature,
        extension,
        public_key,
        restrictions,
    })
    .map_err(|e| LockError::internal(format!("failed to encode certificate: {e}")))
}

fn sign_certificate(
    signing_key: &SigningKey,
    parent_signature: &[u8],
    extension: &str,
    public_key: PublicKey,
    restrictions: Vec<Restriction>,
) -> LockResult<Certificate> {
    let message = signed_bytes(parent_signature, extension, &public_key, &restrictions)?;
    let signature = signing_key.sign(&message);
    Ok(Certificate {
        extension: extension.to_string(),
        public_key,
        restrictions,
        signature: signature.to_bytes().to_vec(),
    })
}

/// Check every signature of a chain
pub fn verify_chain(chain: &[Certificate]) -> bool {
    let mut issuer: Option<&Certificate> = None;
    for cert in chain {
        let (issuer_key, parent_signature) = match issuer {
            Some(parent) => (parent.public_key, parent.signature.as_slice()),
            None => (cert.public_key, &[][..]),
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(issuer_key.as_bytes()) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&cert.signature) else {
            return false;
        };
        let Ok(message) =
            signed_bytes(parent_signature, &cert.extension, &cert.public_key, &cert.restrictions)
        else {
            return false;
        };
        if verifying_key.verify(&message, &signature).is_err() {
            warn!(extension = %cert.extension, "certificate signature does not verify");
            return false;
        }
        issuer = Some(cert);
    }
    issuer.is_some()
}

fn decode_secret(encoded: &str) -> LockResult<[u8; 32]> {
    let bytes = hex::decode(encoded)
        .map_err(|e| LockError::config(format!("corrupt principal secret: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| LockError::config("principal secret must be 32 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_self_blessing_is_displayed() {
        let lock = LocalPrincipal::from_seed([1; 32], "front_door").unwrap();
        let default = lock.default_credential();
        assert_eq!(lock.displayed_names(&default), names(&["front_door"]));
    }

    #[test]
    fn test_unknown_root_is_not_displayed() {
        let lock = LocalPrincipal::from_seed([1; 32], "front_door").unwrap();
        let stranger = LocalPrincipal::from_seed([2; 32], "mallory").unwrap();
        assert!(lock
            .displayed_names(&stranger.default_credential())
            .is_empty());
        assert_eq!(
            lock.verified_names(&stranger.default_credential()),
            names(&["mallory"])
        );
        lock.add_to_roots(&stranger.default_credential()).unwrap();
        assert_eq!(
            lock.displayed_names(&stranger.default_credential()),
            names(&["mallory"])
        );
    }

    #[test]
    fn test_peer_restriction_binds_key_to_lock() {
        let front = LocalPrincipal::from_seed([1; 32], "front_door").unwrap();
        let back = LocalPrincipal::from_seed([3; 32], "back_door").unwrap();
        let owner = LocalPrincipal::from_seed([2; 32], "alice").unwrap();

        let key = front
            .bless(
                owner.public_key(),
                &front.default_credential(),
                "key",
                vec![Restriction::only_lock("front_door")],
            )
            .unwrap();
        let now = PhysicalTime::from_ms(1);
        assert_eq!(
            front.remote_names(&key, &names(&["front_door"]), now),
            names(&["front_door/key"])
        );

        back.add_to_roots(&key).unwrap();
        assert!(back
            .remote_names(&key, &names(&["back_door"]), now)
            .is_empty());
    }

    #[test]
    fn test_expiry_is_enforced() {
        let lock = LocalPrincipal::from_seed([1; 32], "front_door").unwrap();
        let friend = LocalPrincipal::from_seed([4; 32], "bob").unwrap();
        let expires = PhysicalTime::from_ms(1_000).add(Duration::from_secs(60));
        let key = lock
            .bless(
                friend.public_key(),
                &lock.default_credential(),
                "key",
                vec![Restriction::ExpiresAt(expires)],
            )
            .unwrap();
        let peers = names(&["front_door"]);
        assert_eq!(lock.remote_names(&key, &peers, PhysicalTime::from_ms(1_000)).len(), 1);
        assert!(lock.remote_names(&key, &peers, expires).is_empty());
        assert_eq!(lock.expiry(&key), Some(expires));
    }

    #[test]
    fn test_tampered_chain_fails_verification() {
        let lock = LocalPrincipal::from_seed([1; 32], "front_door").unwrap();
        let friend = LocalPrincipal::from_seed([4; 32], "bob").unwrap();
        let key = lock
            .bless(friend.public_key(), &lock.default_credential(), "key", vec![])
            .unwrap();
        let mut chain = key.chains()[0].clone();
        chain[1].extension = "master".to_string();
        assert!(!verify_chain(&chain));
        assert!(verify_chain(&key.chains()[0]));
    }

    #[test]
    fn test_bless_requires_own_credential() {
        let lock = LocalPrincipal::from_seed([1; 32], "front_door").unwrap();
        let other = LocalPrincipal::from_seed([4; 32], "bob").unwrap();
        let result = lock.bless(
            other.public_key(),
            &other.default_credential(),
            "key",
            vec![],
        );
        assert!(result.is_err());
        assert!(lock.set_default(other.default_credential()).is_err());
    }

    #[test]
    fn test_bless_self_rejects_separator() {
        let lock = LocalPrincipal::from_seed([1; 32], "front_door").unwrap();
        assert!(matches!(
            lock.bless_self("a/b"),
            Err(LockError::InvalidLockName { .. })
        ));
    }

    #[test]
    fn test_for_peer_unions_matching_credentials() {
        let holder = LocalPrincipal::from_seed([2; 32], "alice").unwrap();
        let front = LocalPrincipal::from_seed([1; 32], "front_door").unwrap();
        let key = front
            .bless(holder.public_key(), &front.default_credential(), "key", vec![])
            .unwrap();
        holder
            .set_for_peer(key.clone(), IdentityPattern::new("front_door"))
            .unwrap();
        holder
            .set_for_peer(
                holder.default_credential(),
                IdentityPattern::all_principals(),
            )
            .unwrap();
        let presented = holder.for_peer(&names(&["front_door"])).unwrap();
        assert_eq!(presented.chains().len(), 2);
        let fallback = holder.for_peer(&names(&["back_door"])).unwrap();
        assert_eq!(fallback.names(), names(&["alice"]));
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let first = LocalPrincipal::load_or_create(dir.path(), "factory").unwrap();
        let claimed = first.bless_self("front_door").unwrap();
        first.set_default(claimed.clone()).unwrap();
        first.add_to_roots(&claimed).unwrap();

        let reloaded = LocalPrincipal::load_or_create(dir.path(), "ignored").unwrap();
        assert_eq!(reloaded.public_key(), first.public_key());
        assert_eq!(reloaded.default_credential(), claimed);
        assert_eq!(reloaded.displayed_names(&claimed), names(&["front_door"]));
    }
}
