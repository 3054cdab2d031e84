//! `lockd run`: the daemon plus operator console

use super::console::Console;
use super::stdin_lines;
use anyhow::{Context, Result};
use lock_agent::{build_hardware, start_daemon, ConfigDir, DaemonContext};
use lock_authorization::CredentialStore;
use lock_core::effects::{ExternalToggle, PhysicalTimeEffects};
use lock_effects::{FilesystemClaimRecord, LocalPrincipal, MemoryNetwork, RealTimeHandler};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Subdirectory of the configuration directory holding the console's principal
const OWNER_DIR: &str = "owner";
const OWNER_NAME: &str = "owner";

/// Start the daemon, serve the console, and shut down on `quit` or ctrl-c
pub async fn run(config_dir: &Path) -> Result<()> {
    let dir = ConfigDir::prepare(config_dir)?;
    let config = dir.load_config()?;
    let time: Arc<dyn PhysicalTimeEffects> = Arc::new(RealTimeHandler::new());
    let hardware = build_hardware(&config.hardware, time.clone())?;

    let device = Arc::new(
        LocalPrincipal::load_or_create(dir.path(), &config.naming.device_name)
            .context("loading device principal")?,
    );
    let network = MemoryNetwork::new();
    let transport = Arc::new(network.node(device.clone(), time.clone()));
    let daemon = start_daemon(DaemonContext {
        identity: device,
        transport: transport.clone(),
        discovery: transport,
        record: Arc::new(FilesystemClaimRecord::new(dir.path())),
        hardware: hardware.controller.clone(),
    })
    .await?;
    info!(phase = ?daemon.phase(), config_dir = %dir.path().display(), "daemon started");

    let owner_dir = ConfigDir::prepare(&dir.path().join(OWNER_DIR))?;
    let owner = Arc::new(
        LocalPrincipal::load_or_create(owner_dir.path(), OWNER_NAME)
            .context("loading console principal")?,
    );
    let owner_transport = Arc::new(network.node(owner.clone(), time.clone()));
    let console = Console {
        transport: owner_transport.clone(),
        discovery: owner_transport,
        store: CredentialStore::new(owner, time),
        daemon: &daemon,
        toggle: hardware.external_toggle.clone(),
    };

    if let Some(toggle) = hardware.external_toggle {
        spawn_toggle_on_signal(toggle)?;
    }

    tokio::select! {
        () = console.run(stdin_lines()) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("waiting for ctrl-c")?;
            info!("interrupted");
        }
    }

    drop(console);
    daemon.shutdown().await?;
    info!("daemon stopped");
    Ok(())
}

/// Flip simulated hardware on every SIGUSR1
#[cfg(unix)]
fn spawn_toggle_on_signal(toggle: Arc<dyn ExternalToggle>) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut signals =
        signal(SignalKind::user_defined1()).context("installing SIGUSR1 handler")?;
    tokio::spawn(async move {
        while signals.recv().await.is_some() {
            let status = toggle.toggle_externally();
            info!(%status, "toggled by SIGUSR1");
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_toggle_on_signal(_toggle: Arc<dyn ExternalToggle>) -> Result<()> {
    Ok(())
}
