//! Neighborhood scanning

use futures::StreamExt;
use lock_core::effects::DiscoveryEffects;
use lock_core::LockResult;
use std::collections::BTreeSet;
use std::fmt;

/// A lock or user found in the neighborhood
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborhoodEntry {
    /// Name with the neighborhood prefix stripped
    pub name: String,
    /// Identities the advertiser presents
    pub owners: Vec<String>,
}

impl fmt::Display for NeighborhoodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.owners.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} [owned by {:?}]", self.name, self.owners)
        }
    }
}

/// Everything advertised under `prefix` that serves at least one object
///
/// Use `naming::LOCK_NH_PREFIX` for locks and `naming::USER_NH_PREFIX` for
/// users. Names are reported once each, without the prefix.
pub async fn scan_neighborhood(
    discovery: &dyn DiscoveryEffects,
    prefix: &str,
) -> LockResult<Vec<NeighborhoodEntry>> {
    let mut seen = BTreeSet::new();
    let mut found = Vec::new();
    let mut entries = discovery.glob(&format!("{prefix}*"))?;
    while let Some(entry) = entries.next().await {
        if entry.endpoints.is_empty() || !seen.insert(entry.name.clone()) {
            continue;
        }
        let Some(name) = entry.name.strip_prefix(prefix) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        found.push(NeighborhoodEntry {
            name: name.to_string(),
            owners: entry.identities,
        });
    }
    Ok(found)
}
