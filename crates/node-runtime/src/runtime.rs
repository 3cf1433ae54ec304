//! # Masternode Runtime
//!
//! Drives one masternode:
//!
//! 1. Replay stored blocks into state
//! 2. Catch up with peers, retrying until it succeeds
//! 3. Aggregate rounds strictly in sequence; commit and announce each block
//!
//! Notifications from other masternodes are handled concurrently by
//! [`NotificationHandler`]; catch-up sync serializes all chain writes.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use qc_08_subblock_consensus::{AggregationError, BlockAggregationApi, RoundOutcome};
use qc_13_catchup_sync::{CatchupApi, SyncError};
use shared_types::{stop_requested, NodeMessage, Wallet};

use crate::adapters::{Broadcaster, BLOCK_NOTIFICATION_TOPIC};
use crate::container::{ConfigError, LocalTransport, MasternodeContainer, NodeConfig};
use crate::handlers::NotificationHandler;

/// Fatal node errors.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Block aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),

    #[error("Catch-up failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Configuration invalid: {0}")]
    Config(#[from] ConfigError),
}

/// The round loop of one masternode.
pub struct Masternode {
    container: Arc<MasternodeContainer>,
    stop: watch::Receiver<bool>,
}

impl Masternode {
    pub fn new(container: Arc<MasternodeContainer>, stop: watch::Receiver<bool>) -> Self {
        Self { container, stop }
    }

    /// Run until stopped. Returns an error only for conditions the node
    /// cannot recover from.
    pub async fn run(&self) -> Result<(), NodeError> {
        self.container.catchup.reconcile_state_with_storage().await?;

        if !self.startup_sync().await? {
            return Ok(());
        }

        loop {
            match self.container.aggregator.gather_round().await {
                Ok(outcome) => self.commit(outcome).await?,
                Err(AggregationError::Stopped) => {
                    info!("[qc-08] Round loop stopped");
                    return Ok(());
                }
                Err(e @ (AggregationError::FeedClosed | AggregationError::EmptyCommittee)) => {
                    error!("[qc-08] Round loop cannot continue: {}", e);
                    return Err(e.into());
                }
                Err(e) => warn!("[qc-08] Round aborted: {}", e),
            }
        }
    }

    /// Sync until caught up. Returns `false` if stopped first.
    async fn startup_sync(&self) -> Result<bool, NodeError> {
        let retry = self.container.config.sync_retry();
        loop {
            match self.container.catchup.sync().await {
                Ok(report) => {
                    info!(
                        "[qc-13] Startup sync done at height {} ({} blocks fetched)",
                        report.height, report.blocks_fetched
                    );
                    return Ok(true);
                }
                Err(SyncError::Stopped) => return Ok(false),
                Err(e) => {
                    warn!("[qc-13] Startup sync failed: {}; retrying in {:?}", e, retry);
                    if self.sleep_or_stop(retry).await {
                        return Ok(false);
                    }
                }
            }
        }
    }

    /// Returns `true` if stop was raised while sleeping.
    async fn sleep_or_stop(&self, duration: Duration) -> bool {
        let mut stop = self.stop.clone();
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = stop_requested(&mut stop) => true,
        }
    }

    async fn commit(&self, outcome: RoundOutcome) -> Result<(), NodeError> {
        let block_num = outcome.block.block_num;
        let notification = NodeMessage::BlockNotification(outcome.block.clone());

        match self.container.catchup.commit_local(outcome.block).await {
            Ok(()) => {}
            Err(SyncError::Storage(e)) => {
                // A peer's notification for this height was committed first.
                warn!("[qc-08] Dropping own block {}: {}", block_num, e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        info!("[qc-08] Committed {} block {}", outcome.kind, block_num);

        if let Err(e) = self
            .container
            .broadcaster
            .broadcast(BLOCK_NOTIFICATION_TOPIC, &notification)
        {
            warn!("[qc-08] Failed to announce block {}: {}", block_num, e);
        }
        Ok(())
    }
}

/// Join handles of a started node.
pub struct RuntimeHandles {
    pub masternode: JoinHandle<Result<(), NodeError>>,
    pub notifications: JoinHandle<()>,
}

/// One masternode together with its shutdown signal.
pub struct NodeRuntime {
    container: Arc<MasternodeContainer>,
    transport: LocalTransport,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    /// Validate `config` and build the node on `transport`.
    pub fn new(
        config: NodeConfig,
        wallet: &Wallet,
        transport: LocalTransport,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let container = Arc::new(MasternodeContainer::new(
            config,
            wallet,
            &transport,
            shutdown_rx,
        ));
        Ok(Self {
            container,
            transport,
            shutdown_tx,
        })
    }

    pub fn container(&self) -> &Arc<MasternodeContainer> {
        &self.container
    }

    /// Spawn the notification handler and the round loop.
    ///
    /// The bus subscription is taken before anything runs, so notifications
    /// published during startup sync are queued rather than missed.
    pub fn start(&self) -> RuntimeHandles {
        info!(
            "Starting masternode {}",
            hex::encode(&self.container.identity[..4])
        );
        let stop = self.shutdown_tx.subscribe();

        let handler =
            NotificationHandler::new(Arc::clone(&self.container.catchup), self.container.identity);
        let notifications = tokio::spawn(handler.run(self.transport.bus.subscribe(), stop.clone()));

        let masternode = Masternode::new(Arc::clone(&self.container), stop);
        let masternode = tokio::spawn(async move { masternode.run().await });

        RuntimeHandles {
            masternode,
            notifications,
        }
    }

    /// Signal every task of this node to stop.
    pub fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.shutdown_tx.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qc_08_subblock_consensus::{AggregatorConfig, ContenderGroup};
    use qc_13_catchup_sync::CatchupConfig;
    use shared_types::{
        BlockStore, StateChange, SubBlockContender, TransactionData, GENESIS_HASH,
    };

    fn config(delegate: &Wallet) -> NodeConfig {
        NodeConfig {
            aggregator: AggregatorConfig {
                slot_count: 2,
                ..AggregatorConfig::for_testing()
            },
            catchup: CatchupConfig::for_testing(),
            committee: vec![delegate.public_key()],
            node_seed: None,
            sync_retry_ms: 50,
        }
    }

    fn contenders(delegate: &Wallet) -> ContenderGroup {
        let contenders = (0..2u32)
            .map(|slot| {
                let tx = TransactionData {
                    transaction: vec![slot as u8],
                    status: 0,
                    state: vec![StateChange {
                        key: format!("slot-{}", slot),
                        value: "done".to_string(),
                    }],
                    stamps_used: 1,
                };
                SubBlockContender::build(delegate, [slot as u8 + 1; 32], vec![tx], slot, GENESIS_HASH)
                    .unwrap()
            })
            .collect();
        ContenderGroup {
            sender: delegate.public_key(),
            contenders,
        }
    }

    #[test]
    fn test_runtime_rejects_invalid_config() {
        let node = Wallet::from_seed([1u8; 32]);
        let result = NodeRuntime::new(NodeConfig::default(), &node, LocalTransport::new());
        assert!(matches!(
            result,
            Err(NodeError::Config(ConfigError::EmptyCommittee))
        ));
    }

    #[tokio::test]
    async fn test_round_is_committed_and_announced() {
        let delegate = Wallet::from_seed([9u8; 32]);
        let node = Wallet::from_seed([1u8; 32]);
        let transport = LocalTransport::new();
        let mut bus = transport.bus.subscribe();

        let runtime = NodeRuntime::new(config(&delegate), &node, transport).unwrap();
        let handles = runtime.start();
        let container = Arc::clone(runtime.container());

        assert!(container.contenders.submit(contenders(&delegate)).await);

        let envelope = tokio::time::timeout(Duration::from_secs(5), bus.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(envelope.topic, BLOCK_NOTIFICATION_TOPIC);
        assert_eq!(envelope.sender, node.public_key());
        let NodeMessage::BlockNotification(block) = envelope.open().unwrap().message else {
            panic!("expected a block notification");
        };
        assert_eq!(block.block_num, 2);
        assert_eq!(container.store.latest_height(), 2);
        assert_eq!(container.state.get("slot-1").as_deref(), Some("done"));

        runtime.shutdown();
        assert!(handles.masternode.await.unwrap().is_ok());
        handles.notifications.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_before_any_round() {
        let delegate = Wallet::from_seed([9u8; 32]);
        let runtime = NodeRuntime::new(
            config(&delegate),
            &Wallet::from_seed([1u8; 32]),
            LocalTransport::new(),
        )
        .unwrap();
        let handles = runtime.start();

        runtime.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), handles.masternode)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert_eq!(runtime.container().store.latest_height(), 1);
    }
}
