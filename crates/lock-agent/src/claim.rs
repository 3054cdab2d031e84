//! Claim service
//!
//! An unclaimed device serves this under its temporary neighborhood name. The
//! first successful `Claim` turns the device into a named lock: it takes a
//! self-signed identity with the chosen name, trusts it, issues the caller a
//! key restricted to the lock, and durably records the claim. The claim is
//! irreversible and happens at most once.

use async_trait::async_trait;
use lock_core::effects::{ClaimRecordEffects, Dispatcher, IdentityEffects, Request, Response, ServerCall};
use lock_core::naming::{is_valid_lock_name, KEY_EXTENSION};
use lock_core::{Credential, LockError, LockResult, PublicKey, Restriction, CHAIN_SEPARATOR};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};

/// Resolves once with the name the device was claimed as
pub type ClaimedSignal = oneshot::Receiver<String>;

/// One-time transition of a device from unclaimed to claimed
pub struct ClaimService {
    identity: Arc<dyn IdentityEffects>,
    record: Arc<dyn ClaimRecordEffects>,
    /// `None` once claimed
    claimed: Mutex<Option<oneshot::Sender<String>>>,
}

impl ClaimService {
    /// Service for the device principal `identity`, recording claims in `record`
    pub fn new(
        identity: Arc<dyn IdentityEffects>,
        record: Arc<dyn ClaimRecordEffects>,
    ) -> (Self, ClaimedSignal) {
        let (tx, rx) = oneshot::channel();
        let service = Self {
            identity,
            record,
            claimed: Mutex::new(Some(tx)),
        };
        (service, rx)
    }

    /// Claim the device as `name` and issue `requester` its first key
    ///
    /// Concurrent attempts do not wait for each other: while one attempt is
    /// in progress, others fail with `AlreadyClaimed`.
    pub async fn claim(&self, name: &str, requester: PublicKey) -> LockResult<Credential> {
        if name.is_empty() || !is_valid_lock_name(name) {
            return Err(LockError::invalid_lock_name(name, CHAIN_SEPARATOR));
        }
        let Ok(mut claimed) = self.claimed.try_lock() else {
            return Err(LockError::AlreadyClaimed);
        };
        if claimed.is_none()
            || self
                .record
                .is_claimed()
                .await
                .map_err(LockError::into_internal)?
        {
            return Err(LockError::AlreadyClaimed);
        }

        let previous = self.identity.default_credential();
        match self.become_lock(name, requester).await {
            Ok(key) => {
                if let Some(signal) = claimed.take() {
                    let _ = signal.send(name.to_string());
                }
                info!(lock_name = name, owner = %requester, "lock claimed");
                Ok(key)
            }
            Err(e) => {
                warn!(lock_name = name, error = %e, "claim failed, restoring identity");
                if let Err(restore) = self.identity.set_default(previous) {
                    error!(error = %restore, "failed to restore default identity");
                }
                match e {
                    LockError::AlreadyClaimed => Err(e),
                    other => Err(other.into_internal()),
                }
            }
        }
    }

    async fn become_lock(&self, name: &str, requester: PublicKey) -> LockResult<Credential> {
        let root = self.identity.bless_self(name)?;
        self.identity.set_default(root.clone())?;
        self.identity.add_to_roots(&root)?;
        let key = self.identity.bless(
            requester,
            &root,
            KEY_EXTENSION,
            vec![Restriction::only_lock(name)],
        )?;
        if !self.record.create_if_absent().await? {
            return Err(LockError::AlreadyClaimed);
        }
        Ok(key)
    }
}

#[async_trait]
impl Dispatcher for ClaimService {
    async fn dispatch(&self, call: ServerCall, request: Request) -> LockResult<Response> {
        match request {
            Request::Claim { name } => self
                .claim(&name, call.remote_public_key)
                .await
                .map(Response::Key),
            other => Err(LockError::not_found(format!(
                "method {} is not served by an unclaimed lock",
                other.method()
            ))),
        }
    }
}
