//! Skateway Daemon - Synthetic ice-condition telemetry generator
//!
//! Fabricates plausible readings for each skateway site on a fixed cadence
//! and forwards them to the telemetry ingestion endpoint. `--dry-run` prints
//! the payloads instead of publishing them.

use anyhow::Result;
use clap::Parser;
use skatewayd::config::SiteRegistry;
use skatewayd::dispatcher::{Dispatcher, Mode, DEFAULT_INTERVAL};
use tokio::sync::watch;
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "skatewayd")]
#[command(about = "Skateway synthetic sensor telemetry simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Generate and print readings without publishing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();
    info!("skatewayd v{} starting", env!("CARGO_PKG_VERSION"));

    let mode = if cli.dry_run { Mode::DryRun } else { Mode::Live };

    let registry = match SiteRegistry::from_env(cli.dry_run) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Configuration error: {}", e);
            anyhow::bail!("configuration error: {}", e);
        }
    };

    // All site connections are acquired before the loop starts.
    let dispatcher = Dispatcher::from_registry(&registry, mode, DEFAULT_INTERVAL);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    dispatcher.run(shutdown_rx).await;

    info!("skatewayd exited cleanly");
    Ok(())
}
