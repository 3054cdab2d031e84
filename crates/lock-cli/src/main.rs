//! lockd - claimable physical lock daemon
//!
//! `run` starts the daemon with an operator console; `hwtest` drives the
//! configured lock hardware directly.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod handlers;

#[derive(Parser)]
#[command(name = "lockd")]
#[command(about = "lockd - daemon for a claimable physical lock", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding lockd.toml, the principal and the claim record
    #[arg(long, global = true, default_value = ".lockd")]
    config_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the lock daemon with an operator console on stdin
    Run,

    /// Interactively exercise the configured hardware
    Hwtest,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run => handlers::run::run(&cli.config_dir).await?,
        Commands::Hwtest => handlers::hwtest::run(&cli.config_dir).await?,
    }

    Ok(())
}
