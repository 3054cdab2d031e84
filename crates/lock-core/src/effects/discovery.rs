//! Neighborhood discovery interface
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `lock-effects` (`MemoryTransport`)
//! - **Usage**: daemon lifecycle (advertise), scanning (glob)

use crate::errors::LockResult;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// One neighborhood name found by a glob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobEntry {
    /// Neighborhood name
    pub name: String,
    /// Object names mounted under it
    pub endpoints: Vec<String>,
    /// Identity names the advertiser presents
    pub identities: Vec<String>,
}

/// A live neighborhood advertisement
#[async_trait]
pub trait Advertisement: Send + Sync {
    /// Advertised neighborhood name
    fn name(&self) -> &str;

    /// Remove the advertisement; it is gone from every later glob when this returns
    async fn withdraw(self: Box<Self>);
}

/// Advertising and looking up neighborhood names
#[async_trait]
pub trait DiscoveryEffects: Send + Sync {
    /// Advertise `nh_name` with this node's identity
    async fn advertise(&self, nh_name: &str) -> LockResult<Box<dyn Advertisement>>;

    /// Snapshot of advertisements whose name matches the glob `pattern`
    ///
    /// The stream is finite; glob again to observe later changes.
    fn glob(&self, pattern: &str) -> LockResult<BoxStream<'static, GlobEntry>>;
}
