//! Lock service served by a claimed device

use async_trait::async_trait;
use lock_core::effects::{Dispatcher, HardwareController, Request, Response, ServerCall};
use lock_core::{LockError, LockResult, LockStatus};
use std::sync::Arc;
use tracing::info;

/// Lock, unlock and status over the injected hardware controller
///
/// Callers are authorized by the transport before dispatch.
pub struct LockService {
    hardware: Arc<dyn HardwareController>,
}

impl LockService {
    /// Service driving `hardware`
    pub fn new(hardware: Arc<dyn HardwareController>) -> Self {
        Self { hardware }
    }

    async fn set(&self, target: LockStatus, caller: &[String]) -> LockResult<Response> {
        self.hardware.set_status(target).await?;
        info!(status = %target, ?caller, "lock status updated");
        Ok(Response::Ack)
    }
}

#[async_trait]
impl Dispatcher for LockService {
    async fn dispatch(&self, call: ServerCall, request: Request) -> LockResult<Response> {
        match request {
            Request::Lock => self.set(LockStatus::Locked, &call.remote_names).await,
            Request::Unlock => self.set(LockStatus::Unlocked, &call.remote_names).await,
            Request::Status => Ok(Response::Status(self.hardware.status())),
            other => Err(LockError::not_found(format!(
                "method {} is not served by a claimed lock",
                other.method()
            ))),
        }
    }
}
