//! Client helpers for talking to lock daemons

use lock_authorization::CredentialStore;
use lock_core::effects::{Request, Response, TransportEffects};
use lock_core::naming::lock_object_name;
use lock_core::{Credential, LockError, LockResult, LockStatus};
use tracing::info;

/// Claim the unclaimed device `device` as `name` and keep the returned key
///
/// `device` is the device's neighborhood name without the `lock-` prefix,
/// e.g. `unclaimed-lock-42`.
pub async fn claim_lock(
    transport: &dyn TransportEffects,
    store: &CredentialStore,
    device: &str,
    name: &str,
) -> LockResult<Credential> {
    let response = transport
        .call(
            &lock_object_name(device),
            Request::Claim {
                name: name.to_string(),
            },
            None,
        )
        .await?;
    let key = match response {
        Response::Key(key) => key,
        other => return Err(unexpected("Claim", &other)),
    };
    store.save(key.clone(), name)?;
    info!(device, lock_name = name, key = %key, "claimed lock");
    Ok(key)
}

/// Lock or unlock `lock_name`
pub async fn update_status(
    transport: &dyn TransportEffects,
    lock_name: &str,
    status: LockStatus,
) -> LockResult<()> {
    let request = match status {
        LockStatus::Locked => Request::Lock,
        LockStatus::Unlocked => Request::Unlock,
    };
    match transport
        .call(&lock_object_name(lock_name), request, None)
        .await?
    {
        Response::Ack => Ok(()),
        other => Err(unexpected(status_method(status), &other)),
    }
}

/// Current status of `lock_name`
pub async fn query_status(
    transport: &dyn TransportEffects,
    lock_name: &str,
) -> LockResult<LockStatus> {
    match transport
        .call(&lock_object_name(lock_name), Request::Status, None)
        .await?
    {
        Response::Status(status) => Ok(status),
        other => Err(unexpected("Status", &other)),
    }
}

fn status_method(status: LockStatus) -> &'static str {
    match status {
        LockStatus::Locked => "Lock",
        LockStatus::Unlocked => "Unlock",
    }
}

fn unexpected(method: &str, response: &Response) -> LockError {
    LockError::internal(format!("unexpected response to {method}: {response:?}"))
}
