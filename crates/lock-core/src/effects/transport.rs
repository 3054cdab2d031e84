//! RPC transport interface
//!
//! # Effect Classification
//!
//! - **Category**: Infrastructure Effect
//! - **Implementation**: `lock-effects` (`MemoryTransport`)
//! - **Usage**: daemon lifecycle, lock client helpers, grant protocol
//!
//! The transport authenticates both ends with their credentials, applies the
//! server's authorization policy before dispatch, and runs an optional
//! client-side granter so that a credential can be minted for the server only
//! after the server's identity is known.

use crate::errors::LockResult;
use crate::types::{Credential, LockStatus, PublicKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Method invocations understood by lock services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Claim an unclaimed lock under `name`
    Claim {
        /// Desired lock name
        name: String,
    },
    /// Engage the bolt
    Lock,
    /// Release the bolt
    Unlock,
    /// Read the current status
    Status,
    /// Offer a key for `lock_name`; the key travels as the granted credential
    Grant {
        /// Lock the key is for
        lock_name: String,
    },
}

impl Request {
    /// Method name for logs
    pub fn method(&self) -> &'static str {
        match self {
            Self::Claim { .. } => "Claim",
            Self::Lock => "Lock",
            Self::Unlock => "Unlock",
            Self::Status => "Status",
            Self::Grant { .. } => "Grant",
        }
    }
}

/// Results returned by lock services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// A credential issued to the caller
    Key(Credential),
    /// Current lock status
    Status(LockStatus),
    /// Call completed with no value
    Ack,
}

/// Server-side view of an authenticated call
#[derive(Debug, Clone)]
pub struct ServerCall {
    /// Names the server presents
    pub local_names: Vec<String>,
    /// Validated names of the caller
    pub remote_names: Vec<String>,
    /// Caller's public key
    pub remote_public_key: PublicKey,
    /// Credential minted by the caller's granter, if any
    pub granted: Option<Credential>,
}

/// Client-side view of the server, handed to a granter
#[derive(Debug, Clone)]
pub struct GrantCall {
    /// Server names as validated by the client
    pub remote_names: Vec<String>,
    /// Server's public key
    pub remote_public_key: PublicKey,
}

/// Server authorization policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationPolicy {
    /// Admit every caller
    AllowEveryone,
    /// Admit callers whose names are the server's names or extensions of them, or vice versa
    Default,
}

impl fmt::Display for AuthorizationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllowEveryone => f.write_str("allow-everyone"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// A service mounted under an object name
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Handle one authorized call
    async fn dispatch(&self, call: ServerCall, request: Request) -> LockResult<Response>;
}

/// Client-side callback minting a credential for the server
#[async_trait]
pub trait Granter: Send + Sync {
    /// Produce the credential to hand to the server, or refuse the call
    async fn grant(&self, call: &GrantCall) -> LockResult<Credential>;
}

/// Handle to a running server
#[async_trait]
pub trait ServerHandle: Send + Sync {
    /// Object name the server is mounted under
    fn object_name(&self) -> &str;

    /// Stop accepting calls and wait for in-flight calls to finish
    async fn stop(self: Box<Self>);
}

/// Serving and calling lock services
#[async_trait]
pub trait TransportEffects: Send + Sync {
    /// Mount `service` under `object_name`
    async fn serve(
        &self,
        object_name: &str,
        service: Arc<dyn Dispatcher>,
        policy: AuthorizationPolicy,
    ) -> LockResult<Box<dyn ServerHandle>>;

    /// Invoke `request` on the service mounted under `object_name`
    async fn call(
        &self,
        object_name: &str,
        request: Request,
        granter: Option<Arc<dyn Granter>>,
    ) -> LockResult<Response>;
}
