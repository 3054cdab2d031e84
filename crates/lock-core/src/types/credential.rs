//! Capability tokens
//!
//! A [`Credential`] binds a subject public key to one or more certificate
//! chains. Each chain starts with a self-signed root certificate and every
//! following certificate is signed by the key of the one before it, so the
//! chain `front_door` → `key` → `friend` displays as `front_door/key/friend`.
//! Credentials are immutable once issued; signing and verification are done
//! by the identity handler, which treats this type as opaque data.

use super::pattern::CHAIN_SEPARATOR;
use super::restriction::Restriction;
use crate::errors::{LockError, LockResult};
use crate::time::PhysicalTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ed25519 public key bytes
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..8]))
    }
}

/// One link of a delegation chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Certificate {
    /// Name component added by this link
    pub extension: String,
    /// Key the link was issued to
    pub public_key: PublicKey,
    /// Conditions attached by the issuer
    pub restrictions: Vec<Restriction>,
    /// Issuer signature over the link and its parent's signature
    pub signature: Vec<u8>,
}

/// A signed delegation chain, root first
pub type CertificateChain = Vec<Certificate>;

/// A capability token held by a principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    public_key: PublicKey,
    chains: Vec<CertificateChain>,
}

impl Credential {
    /// Assemble a credential from chains that all end at `public_key`
    pub fn new(public_key: PublicKey, chains: Vec<CertificateChain>) -> LockResult<Self> {
        if chains.is_empty() {
            return Err(LockError::internal("credential must carry at least one chain"));
        }
        for chain in &chains {
            match chain.last() {
                Some(leaf) if leaf.public_key == public_key => {}
                Some(_) => {
                    return Err(LockError::internal(
                        "certificate chain does not end at the credential key",
                    ))
                }
                None => return Err(LockError::internal("empty certificate chain")),
            }
        }
        Ok(Self { public_key, chains })
    }

    /// Subject public key
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Certificate chains, root first
    pub fn chains(&self) -> &[CertificateChain] {
        &self.chains
    }

    /// Unverified names, one per chain
    pub fn names(&self) -> Vec<String> {
        self.chains.iter().map(|chain| chain_name(chain)).collect()
    }

    /// Earliest expiry across every restriction, if any chain expires
    pub fn earliest_expiry(&self) -> Option<PhysicalTime> {
        self.chains
            .iter()
            .flatten()
            .flat_map(|cert| cert.restrictions.iter())
            .filter_map(Restriction::expiry)
            .min()
    }

    /// Combine two credentials for the same key into one
    pub fn union(&self, other: &Credential) -> LockResult<Credential> {
        if self.public_key != other.public_key {
            return Err(LockError::internal(format!(
                "cannot combine credentials for different keys {} and {}",
                self.public_key, other.public_key
            )));
        }
        let mut chains = self.chains.clone();
        for chain in &other.chains {
            if !chains.contains(chain) {
                chains.push(chain.clone());
            }
        }
        Ok(Self {
            public_key: self.public_key,
            chains,
        })
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(","))
    }
}

/// Name spelled by a chain
pub fn chain_name(chain: &[Certificate]) -> String {
    chain
        .iter()
        .map(|cert| cert.extension.as_str())
        .collect::<Vec<_>>()
        .join(CHAIN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(extension: &str, key: u8, restrictions: Vec<Restriction>) -> Certificate {
        Certificate {
            extension: extension.to_string(),
            public_key: PublicKey([key; 32]),
            restrictions,
            signature: vec![key; 64],
        }
    }

    #[test]
    fn test_names_and_display() {
        let credential = Credential::new(
            PublicKey([2; 32]),
            vec![vec![cert("front_door", 1, vec![]), cert("key", 2, vec![])]],
        )
        .unwrap();
        assert_eq!(credential.names(), vec!["front_door/key".to_string()]);
        assert_eq!(credential.to_string(), "front_door/key");
    }

    #[test]
    fn test_chain_must_end_at_subject_key() {
        let result = Credential::new(PublicKey([9; 32]), vec![vec![cert("a", 1, vec![])]]);
        assert!(result.is_err());
        assert!(Credential::new(PublicKey([9; 32]), vec![]).is_err());
    }

    #[test]
    fn test_union_dedupes_and_checks_key() {
        let a = Credential::new(PublicKey([2; 32]), vec![vec![cert("a", 2, vec![])]]).unwrap();
        let b = Credential::new(PublicKey([2; 32]), vec![vec![cert("b", 2, vec![])]]).unwrap();
        let merged = a.union(&b).unwrap().union(&a).unwrap();
        assert_eq!(merged.names(), vec!["a".to_string(), "b".to_string()]);

        let other = Credential::new(PublicKey([3; 32]), vec![vec![cert("c", 3, vec![])]]).unwrap();
        assert!(a.union(&other).is_err());
    }

    #[test]
    fn test_earliest_expiry() {
        let credential = Credential::new(
            PublicKey([2; 32]),
            vec![vec![
                cert("lock", 1, vec![Restriction::ExpiresAt(PhysicalTime::from_ms(50))]),
                cert(
                    "key",
                    2,
                    vec![
                        Restriction::only_lock("lock"),
                        Restriction::ExpiresAt(PhysicalTime::from_ms(20)),
                    ],
                ),
            ]],
        )
        .unwrap();
        assert_eq!(credential.earliest_expiry(), Some(PhysicalTime::from_ms(20)));
    }
}
