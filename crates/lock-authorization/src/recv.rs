//! Receiver side of key delegation

use crate::store::CredentialStore;
use async_trait::async_trait;
use lock_core::effects::{
    AuthorizationPolicy, DiscoveryEffects, Dispatcher, Request, Response, ServerCall,
    TransportEffects,
};
use lock_core::naming::{recv_key_object_name, user_identity, user_nh_name};
use lock_core::{Credential, LockError, LockResult};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// A key offered by a sender, shown to the holder for confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOffer {
    /// Lock the key is for
    pub lock_name: String,
    /// The offered key
    pub key: Credential,
    /// Network-friendly identity of the sender
    pub sender: String,
}

/// Asks the holder whether to keep an offered key
#[async_trait]
pub trait KeyConfirmation: Send + Sync {
    /// `true` to save the key
    async fn confirm(&self, offer: &KeyOffer) -> bool;
}

/// Serves `Grant` calls until one key has been confirmed and saved
pub struct RecvKeyService {
    store: CredentialStore,
    confirmation: Arc<dyn KeyConfirmation>,
    provider_prefix: Option<String>,
    completion: Mutex<Option<oneshot::Sender<KeyOffer>>>,
}

impl RecvKeyService {
    /// Service plus the receiver resolved with the first saved key
    pub fn new(
        store: CredentialStore,
        confirmation: Arc<dyn KeyConfirmation>,
        provider_prefix: Option<String>,
    ) -> (Self, oneshot::Receiver<KeyOffer>) {
        let (tx, rx) = oneshot::channel();
        let service = Self {
            store,
            confirmation,
            provider_prefix,
            completion: Mutex::new(Some(tx)),
        };
        (service, rx)
    }

    async fn receive(&self, call: ServerCall, lock_name: String) -> LockResult<Response> {
        if self.completion.lock().is_none() {
            return Err(no_longer_accepting());
        }
        let key = call
            .granted
            .ok_or_else(|| LockError::internal("grant call carried no key"))?;
        let offer = KeyOffer {
            sender: user_identity(&call.remote_names, self.provider_prefix.as_deref()),
            lock_name,
            key,
        };
        info!(
            key = %offer.key,
            lock_name = %offer.lock_name,
            sender = %offer.sender,
            "received key"
        );
        if !self.confirmation.confirm(&offer).await {
            info!(lock_name = %offer.lock_name, "key declined");
            return Err(LockError::key_rejected(&offer.key, offer.lock_name.clone()));
        }
        // Only the first confirmed offer takes the slot; it is handed back if saving fails.
        let Some(done) = self.completion.lock().take() else {
            info!(lock_name = %offer.lock_name, "key confirmed after another was accepted");
            return Err(no_longer_accepting());
        };
        if let Err(e) = self.store.save(offer.key.clone(), &offer.lock_name) {
            *self.completion.lock() = Some(done);
            return Err(e);
        }
        let _ = done.send(offer);
        Ok(Response::Ack)
    }
}

fn no_longer_accepting() -> LockError {
    LockError::not_found("no longer accepting keys")
}

#[async_trait]
impl Dispatcher for RecvKeyService {
    async fn dispatch(&self, call: ServerCall, request: Request) -> LockResult<Response> {
        match request {
            Request::Grant { lock_name } => self.receive(call, lock_name).await,
            other => Err(LockError::not_found(format!(
                "method {} is not served by the key receiver",
                other.method()
            ))),
        }
    }
}

/// Environment for [`recv_key`]
pub struct RecvKeyContext<'a> {
    /// Transport to serve `recvkey` on
    pub transport: &'a dyn TransportEffects,
    /// Discovery to advertise the user neighborhood name on
    pub discovery: &'a dyn DiscoveryEffects,
    /// Where confirmed keys are saved
    pub store: CredentialStore,
    /// Holder prompt
    pub confirmation: Arc<dyn KeyConfirmation>,
    /// Identity provider prefix stripped from user names
    pub provider_prefix: Option<String>,
}

/// Wait for one confirmed key, or until `cancel` resolves
///
/// Declined and invalid offers are answered with an error and listening
/// continues. The server and advertisement are always torn down before this
/// returns. Returns `None` when cancelled.
pub async fn recv_key(
    ctx: RecvKeyContext<'_>,
    cancel: impl Future<Output = ()> + Send,
) -> LockResult<Option<KeyOffer>> {
    let identity = ctx.store.identity().clone();
    let names = identity.displayed_names(&identity.default_credential());
    let prefix = ctx.provider_prefix.as_deref();
    let object_name = recv_key_object_name(&user_identity(&names, prefix));
    let nh_name = user_nh_name(&names, prefix);

    let (service, received) =
        RecvKeyService::new(ctx.store, ctx.confirmation, ctx.provider_prefix);
    let advertisement = ctx
        .discovery
        .advertise(&nh_name)
        .await?;
    let server = match ctx
        .transport
        .serve(&object_name, Arc::new(service), AuthorizationPolicy::AllowEveryone)
        .await
    {
        Ok(server) => server,
        Err(e) => {
            advertisement.withdraw().await;
            return Err(e);
        }
    };
    info!(object_name, "waiting for keys");

    let outcome = tokio::select! {
        offer = received => offer
            .map(Some)
            .map_err(|_| LockError::internal("key receiver closed without a key")),
        () = cancel => {
            debug!(object_name, "stopped waiting for keys");
            Ok(None)
        }
    };

    server.stop().await;
    advertisement.withdraw().await;
    outcome
}
