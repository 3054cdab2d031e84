//! Naming conventions for locks and users in the local neighborhood
//!
//! Every lock daemon advertises a neighborhood name (`lock-<name>`) and mounts
//! its service under it (`lock-<name>/lock`). Users receiving keys advertise
//! `user-<user>` and mount the key receiver at `user-<user>/recvkey`.
//! Neighborhood names cannot contain the chain separator, so identity names
//! are made network-friendly by replacing `/` with `@@`.

use crate::types::pattern::{IdentityPattern, ALL_PRINCIPALS, CHAIN_SEPARATOR};

/// Neighborhood prefix for lock daemons
pub const LOCK_NH_PREFIX: &str = "lock-";
/// Name under which a lock service is mounted
pub const LOCK_SUFFIX: &str = "lock";
/// Neighborhood prefix for lock users
pub const USER_NH_PREFIX: &str = "user-";
/// Name under which a user's key receiver is mounted
pub const RECV_KEY_SUFFIX: &str = "recvkey";
/// Neighborhood name stem for a lock that has not been claimed yet
pub const UNCLAIMED_LOCK_STEM: &str = "unclaimed-lock-";
/// Extension of the owner's key under the lock's root identity
pub const KEY_EXTENSION: &str = "key";

const NH_FRIENDLY_SEPARATOR: &str = "@@";

/// Join a mount point and a suffix into an object name
pub fn join(prefix: &str, suffix: &str) -> String {
    format!("{prefix}/{suffix}")
}

/// Object name of the lock service for `lock_name`
pub fn lock_object_name(lock_name: &str) -> String {
    join(&format!("{LOCK_NH_PREFIX}{lock_name}"), LOCK_SUFFIX)
}

/// Object name of the key receiver for `user`
pub fn recv_key_object_name(user: &str) -> String {
    join(&format!("{USER_NH_PREFIX}{user}"), RECV_KEY_SUFFIX)
}

/// Neighborhood name for a lock that is not yet claimed
pub fn unclaimed_lock_nh_name(suffix: u32) -> String {
    format!("{LOCK_NH_PREFIX}{UNCLAIMED_LOCK_STEM}{suffix}")
}

/// Neighborhood name of a claimed lock presenting `identity`
pub fn claimed_lock_nh_name(identity: &str) -> String {
    format!("{LOCK_NH_PREFIX}{identity}")
}

/// Replace the chain separator so the name is usable in the neighborhood
pub fn nh_friendly(name: &str) -> String {
    name.replace(CHAIN_SEPARATOR, NH_FRIENDLY_SEPARATOR)
}

/// User identity derived from identity names
///
/// Names issued under `provider_prefix` lose that prefix; every name is then
/// made network-friendly. Multiple names are comma-separated.
pub fn user_identity<S: AsRef<str>>(names: &[S], provider_prefix: Option<&str>) -> String {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let stripped = provider_prefix
                .filter(|prefix| IdentityPattern::new(*prefix).matched_by(&[name]))
                .and_then(|prefix| name.strip_prefix(&format!("{prefix}{CHAIN_SEPARATOR}")))
                .unwrap_or(name);
            nh_friendly(stripped)
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Neighborhood name advertised by a user presenting `names`
pub fn user_nh_name<S: AsRef<str>>(names: &[S], provider_prefix: Option<&str>) -> String {
    format!("{USER_NH_PREFIX}{}", user_identity(names, provider_prefix))
}

/// Whether a peer pattern names a lock (rather than a wildcard or a chain)
pub fn is_valid_lock_name(name: &str) -> bool {
    name != ALL_PRINCIPALS && !name.contains(CHAIN_SEPARATOR)
}
