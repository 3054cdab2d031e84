//! Daemon lifecycle
//!
//! A device without a claim record serves the claim service under a random
//! `lock-unclaimed-lock-N` neighborhood name. A background task races the
//! claimed signal against shutdown; once claimed, the unclaimed server and
//! its advertisement are fully torn down before the lock service starts under
//! `lock-<name>`. A device that finds its claim record at startup goes
//! straight to the lock service.

use crate::claim::{ClaimService, ClaimedSignal};
use crate::lock_service::LockService;
use lock_core::effects::{
    Advertisement, AuthorizationPolicy, ClaimRecordEffects, DiscoveryEffects, Dispatcher,
    HardwareController, IdentityEffects, ServerHandle, TransportEffects,
};
use lock_core::naming::{claimed_lock_nh_name, join, unclaimed_lock_nh_name, LOCK_SUFFIX};
use lock_core::{LockError, LockResult};
use rand::Rng;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Where the daemon is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonPhase {
    /// Serving the claim service
    Unclaimed {
        /// Advertised neighborhood name
        nh_name: String,
    },
    /// Serving the lock service
    Claimed {
        /// Advertised neighborhood name
        nh_name: String,
    },
    /// The lock service could not be started after a claim
    Failed {
        /// Why it could not start
        error: LockError,
    },
    /// Shut down; nothing is served or advertised
    Stopped,
}

impl DaemonPhase {
    /// Advertised neighborhood name, if serving
    pub fn nh_name(&self) -> Option<&str> {
        match self {
            Self::Unclaimed { nh_name } | Self::Claimed { nh_name } => Some(nh_name),
            Self::Failed { .. } | Self::Stopped => None,
        }
    }
}

/// Everything the daemon runs on
#[derive(Clone)]
pub struct DaemonContext {
    /// Device principal
    pub identity: Arc<dyn IdentityEffects>,
    /// Transport the services are mounted on
    pub transport: Arc<dyn TransportEffects>,
    /// Neighborhood advertisement
    pub discovery: Arc<dyn DiscoveryEffects>,
    /// Durable claim marker
    pub record: Arc<dyn ClaimRecordEffects>,
    /// Controller injected into the lock service
    pub hardware: Arc<dyn HardwareController>,
}

/// A mounted service and its neighborhood advertisement
struct Serving {
    server: Box<dyn ServerHandle>,
    advertisement: Box<dyn Advertisement>,
}

impl Serving {
    async fn start(
        ctx: &DaemonContext,
        nh_name: &str,
        service: Arc<dyn Dispatcher>,
        policy: AuthorizationPolicy,
    ) -> LockResult<Self> {
        let advertisement = ctx.discovery.advertise(nh_name).await?;
        match ctx
            .transport
            .serve(&join(nh_name, LOCK_SUFFIX), service, policy)
            .await
        {
            Ok(server) => Ok(Self {
                server,
                advertisement,
            }),
            Err(e) => {
                advertisement.withdraw().await;
                Err(e)
            }
        }
    }

    async fn stop(self) {
        info!(object_name = self.server.object_name(), "stopping server");
        self.server.stop().await;
        self.advertisement.withdraw().await;
    }
}

/// Handle to a running daemon
pub struct DaemonHandle {
    phase: watch::Receiver<DaemonPhase>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DaemonHandle {
    /// Current phase
    pub fn phase(&self) -> DaemonPhase {
        self.phase.borrow().clone()
    }

    /// Receiver observing every phase change
    pub fn subscribe(&self) -> watch::Receiver<DaemonPhase> {
        self.phase.clone()
    }

    /// Wait until the daemon reaches a phase satisfying `predicate`
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&DaemonPhase) -> bool,
    ) -> LockResult<DaemonPhase> {
        let mut phase = self.phase.clone();
        let reached = phase
            .wait_for(|p| predicate(p))
            .await
            .map_err(|_| LockError::internal("daemon task exited"))?;
        Ok(reached.clone())
    }

    /// Stop serving and wait for the background task to finish
    pub async fn shutdown(self) -> LockResult<()> {
        let _ = self.shutdown_tx.send(true);
        self.task
            .await
            .map_err(|e| LockError::internal(format!("daemon task failed: {e}")))
    }
}

/// Start the daemon in the phase its claim record dictates
pub async fn start_daemon(ctx: DaemonContext) -> LockResult<DaemonHandle> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if ctx.record.is_claimed().await? {
        let serving = start_lock_server(&ctx).await?;
        let nh_name = serving.advertisement.name().to_string();
        let (phase_tx, phase) = watch::channel(DaemonPhase::Claimed { nh_name });
        let task = tokio::spawn(run_claimed(Some(serving), shutdown_rx, phase_tx));
        return Ok(DaemonHandle {
            phase,
            shutdown_tx,
            task,
        });
    }

    let nh_name = unclaimed_lock_nh_name(rand::thread_rng().gen_range(0..1_000_000));
    let (service, claimed) = ClaimService::new(ctx.identity.clone(), ctx.record.clone());
    let serving = Serving::start(
        &ctx,
        &nh_name,
        Arc::new(service),
        AuthorizationPolicy::AllowEveryone,
    )
    .await?;
    info!(nh_name, "started unclaimed lock server");

    let (phase_tx, phase) = watch::channel(DaemonPhase::Unclaimed { nh_name });
    let task = tokio::spawn(wait_to_be_claimed(ctx, serving, claimed, shutdown_rx, phase_tx));
    Ok(DaemonHandle {
        phase,
        shutdown_tx,
        task,
    })
}

async fn start_lock_server(ctx: &DaemonContext) -> LockResult<Serving> {
    let nh_name = claimed_lock_nh_name(&ctx.identity.default_credential().to_string());
    let service = Arc::new(LockService::new(ctx.hardware.clone()));
    let serving = Serving::start(ctx, &nh_name, service, AuthorizationPolicy::Default).await?;
    info!(nh_name, "started lock server");
    Ok(serving)
}

async fn wait_to_be_claimed(
    ctx: DaemonContext,
    unclaimed: Serving,
    claimed: ClaimedSignal,
    mut shutdown_rx: watch::Receiver<bool>,
    phase_tx: watch::Sender<DaemonPhase>,
) {
    tokio::select! {
        result = claimed => {
            unclaimed.stop().await;
            match result {
                Ok(name) => info!(lock_name = %name, "claimed, switching to lock server"),
                Err(_) => error!("claim service dropped without a claim"),
            }
        }
        _ = shutdown_rx.changed() => {
            unclaimed.stop().await;
            let _ = phase_tx.send(DaemonPhase::Stopped);
            return;
        }
    }

    match start_lock_server(&ctx).await {
        Ok(serving) => {
            let nh_name = serving.advertisement.name().to_string();
            let _ = phase_tx.send(DaemonPhase::Claimed { nh_name });
            run_claimed(Some(serving), shutdown_rx, phase_tx).await;
        }
        Err(e) => {
            error!(error = %e, "failed to start lock server after it was claimed");
            let _ = phase_tx.send(DaemonPhase::Failed { error: e });
            run_claimed(None, shutdown_rx, phase_tx).await;
        }
    }
}

async fn run_claimed(
    serving: Option<Serving>,
    mut shutdown_rx: watch::Receiver<bool>,
    phase_tx: watch::Sender<DaemonPhase>,
) {
    // A dropped handle counts as shutdown.
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    if let Some(serving) = serving {
        serving.stop().await;
    }
    let _ = phase_tx.send(DaemonPhase::Stopped);
}
