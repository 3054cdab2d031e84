//! Sender side of key delegation
//!
//! The sender never ships a pre-built key. It calls the recipient's `recvkey`
//! object with a [`KeyGranter`]; the transport invokes the granter once the
//! recipient's identity is authenticated, and only then is a key minted for
//! the recipient's public key.

use crate::store::CredentialStore;
use async_trait::async_trait;
use lock_core::effects::{
    GrantCall, Granter, IdentityEffects, PhysicalTimeEffects, Request, Response, TransportEffects,
};
use lock_core::naming::{recv_key_object_name, user_identity};
use lock_core::{Credential, LockError, LockResult, Restriction};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Parameters of one key delegation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendKeyRequest {
    /// Lock the key opens
    pub lock_name: String,
    /// Network-friendly identity of the recipient
    pub recipient: String,
    /// Extension naming the recipient's role, e.g. `friend`
    pub category: String,
    /// Validity of the new key; `None` or zero never expires
    pub expiry: Option<Duration>,
}

/// Mints a key for the authenticated recipient of a grant call
pub struct KeyGranter {
    request: SendKeyRequest,
    key: Credential,
    provider_prefix: Option<String>,
    identity: Arc<dyn IdentityEffects>,
    time: Arc<dyn PhysicalTimeEffects>,
}

impl KeyGranter {
    /// Granter extending `key` according to `request`
    pub fn new(
        request: SendKeyRequest,
        key: Credential,
        provider_prefix: Option<String>,
        identity: Arc<dyn IdentityEffects>,
        time: Arc<dyn PhysicalTimeEffects>,
    ) -> Self {
        Self {
            request,
            key,
            provider_prefix,
            identity,
            time,
        }
    }
}

#[async_trait]
impl Granter for KeyGranter {
    async fn grant(&self, call: &GrantCall) -> LockResult<Credential> {
        let prefix = self.provider_prefix.as_deref();
        let authorized = call
            .remote_names
            .iter()
            .any(|name| user_identity(&[name], prefix) == self.request.recipient);
        if !authorized {
            warn!(
                recipient = %self.request.recipient,
                presented = ?call.remote_names,
                "refusing to grant key to unexpected identity"
            );
            return Err(LockError::identity_mismatch(
                call.remote_names.clone(),
                self.request.recipient.clone(),
            ));
        }

        let mut restrictions = vec![Restriction::only_lock(&self.request.lock_name)];
        if let Some(expiry) = self.request.expiry.filter(|d| !d.is_zero()) {
            let now = self.time.physical_time().await?;
            restrictions.push(Restriction::ExpiresAt(now.add(expiry)));
        }
        self.identity.bless(
            call.remote_public_key,
            &self.key,
            &self.request.category,
            restrictions,
        )
    }
}

/// Delegate a key for `request.lock_name` to `request.recipient`
///
/// Fails with `NoValidKey` when no stored key opens the lock, and otherwise
/// returns the recipient's answer unchanged (`KeyRejected` when they decline).
pub async fn send_key(
    transport: &dyn TransportEffects,
    store: &CredentialStore,
    time: Arc<dyn PhysicalTimeEffects>,
    provider_prefix: Option<String>,
    request: SendKeyRequest,
) -> LockResult<()> {
    let key = store.key_for_lock(&request.lock_name)?;
    info!(
        key = %key,
        category = %request.category,
        recipient = %request.recipient,
        "sending key"
    );
    let object_name = recv_key_object_name(&request.recipient);
    let lock_name = request.lock_name.clone();
    let granter = KeyGranter::new(
        request,
        key,
        provider_prefix,
        store.identity().clone(),
        time,
    );
    match transport
        .call(&object_name, Request::Grant { lock_name }, Some(Arc::new(granter)))
        .await?
    {
        Response::Ack => Ok(()),
        other => Err(LockError::internal(format!(
            "unexpected response to grant: {other:?}"
        ))),
    }
}
