//! # Masternode
//!
//! Runs one masternode until Ctrl-C.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `QC_*` environment variables
//! 2. Validate it; an empty committee is fatal
//! 3. Build the subsystems and start the notification handler
//! 4. Replay stored blocks, catch up with peers, then aggregate rounds
//!
//! Delegates submit contender groups through the container's
//! `ContenderSender`.

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use node_runtime::{LocalTransport, NodeConfig, NodeRuntime};
use shared_types::Wallet;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let wallet = match config.node_seed {
        Some(seed) => Wallet::from_seed(seed),
        None => Wallet::generate(),
    };

    info!("===========================================");
    info!("  Masternode v{}", env!("CARGO_PKG_VERSION"));
    info!("  Identity: {}", hex::encode(wallet.public_key()));
    info!("===========================================");

    let runtime = NodeRuntime::new(config, &wallet, LocalTransport::new())
        .context("Failed to build node runtime")?;
    let handles = runtime.start();

    let mut masternode = handles.masternode;
    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Received shutdown signal");
            runtime.shutdown();
            masternode.await
        }
        finished = &mut masternode => {
            runtime.shutdown();
            finished
        }
    };
    match finished {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Masternode stopped with error: {}", e),
        Err(e) => error!("Masternode task panicked: {}", e),
    }
    let _ = handles.notifications.await;

    info!("Node shutdown complete");
    Ok(())
}
