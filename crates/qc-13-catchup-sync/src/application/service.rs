//! # Catch-up Service
//!
//! Brings a lagging masternode up to the height its peers agree on.
//!
//! ```text
//! discover_height ──confirmed target──→ fetch_up_to ──per height──→ find_valid_block
//!        ↑                                   │                            │
//!        └──── repeat until caught up ───────┘          first verifying reply wins
//! ```
//!
//! Notifications that arrive while a sync runs are queued and applied once
//! the bulk fetch is done.

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use shared_types::{
    stop_requested, Block, BlockRef, BlockStore, Hash, NodeMessage, PublicKey,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::algorithms::{classify_block, effective_confirmations, BlockVerdict};
use crate::config::CatchupConfig;
use crate::domain::{
    CatchupResult, ConfirmationTally, NotificationOutcome, SyncError, SyncReport,
};
use crate::ports::{CatchupApi, PeerNetwork, StateUpdater};

#[derive(Debug, Default)]
struct NotificationQueue {
    syncing: bool,
    pending: VecDeque<Block>,
}

/// Clears the syncing flag if a sync ends early or is dropped.
struct SyncingGuard<'a>(&'a Mutex<NotificationQueue>);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().syncing = false;
    }
}

/// Dependencies for CatchupService
pub struct CatchupDependencies<N, B, U> {
    pub network: Arc<N>,
    pub store: Arc<B>,
    pub state: Arc<U>,
    pub config: CatchupConfig,
}

/// Catch-up Service - orchestrates height discovery and verified fetches.
pub struct CatchupService<N: PeerNetwork, B: BlockStore, U: StateUpdater> {
    network: Arc<N>,
    store: Arc<B>,
    state: Arc<U>,
    config: CatchupConfig,
    /// Held while the chain is advanced, so syncs and direct
    /// notification commits never interleave.
    chain: tokio::sync::Mutex<()>,
    queue: Mutex<NotificationQueue>,
    stop: watch::Receiver<bool>,
}

impl<N, B, U> CatchupService<N, B, U>
where
    N: PeerNetwork,
    B: BlockStore,
    U: StateUpdater,
{
    /// Create a new catch-up service.
    pub fn new(deps: CatchupDependencies<N, B, U>) -> Self {
        let (_, stop) = watch::channel(false);
        Self {
            network: deps.network,
            store: deps.store,
            state: deps.state,
            config: deps.config,
            chain: tokio::sync::Mutex::new(()),
            queue: Mutex::new(NotificationQueue::default()),
            stop,
        }
    }

    /// Install a cooperative stop signal.
    pub fn with_stop(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &CatchupConfig {
        &self.config
    }

    /// Height of the local chain tip.
    pub fn local_height(&self) -> u64 {
        self.store.latest_height()
    }

    /// Number of notifications waiting for the running sync.
    pub fn queued_notifications(&self) -> usize {
        self.queue.lock().pending.len()
    }

    /// Send `message` to every peer concurrently; replies come back in
    /// arrival order.
    fn ask_peers(
        &self,
        peers: Vec<PublicKey>,
        message: NodeMessage,
    ) -> FuturesUnordered<impl std::future::Future<Output = (PublicKey, Option<NodeMessage>)>>
    {
        let timeout = self.config.request_timeout();
        peers
            .into_iter()
            .map(|peer| {
                let network = Arc::clone(&self.network);
                let message = message.clone();
                async move { (peer, network.request(&peer, message, timeout).await) }
            })
            .collect()
    }

    /// Confirmed network height, or `None` when there is nobody to ask.
    pub async fn discover_height(&self) -> CatchupResult<Option<u64>> {
        let peers = self.network.peers();
        if peers.is_empty() {
            debug!("[qc-13] No peers; treating local chain as current");
            return Ok(None);
        }

        let threshold = effective_confirmations(self.config.confirmations, peers.len());
        let deadline = Instant::now() + self.config.discovery_timeout();
        let mut replies = self.ask_peers(peers, NodeMessage::LatestBlockHeightRequest);
        let mut tally = ConfirmationTally::new();
        let mut stop = self.stop.clone();

        loop {
            let next = tokio::select! {
                next = timeout_at(deadline, replies.next()) => next,
                _ = stop_requested(&mut stop) => return Err(SyncError::Stopped),
            };
            match next {
                Ok(Some((peer, Some(NodeMessage::LatestBlockHeightReply { block_height })))) => {
                    debug!(
                        "[qc-13] Peer {} reports height {}",
                        short(&peer),
                        block_height
                    );
                    if tally.add(block_height) >= threshold {
                        return Ok(Some(block_height));
                    }
                }
                Ok(Some((peer, reply))) => {
                    warn!(
                        "[qc-13] Peer {} gave no height ({})",
                        short(&peer),
                        reply.as_ref().map_or("timeout", NodeMessage::kind)
                    );
                }
                Ok(None) | Err(_) => break,
            }
        }

        warn!(
            "[qc-13] Height discovery inconclusive: best {:?} with {}/{} confirmations",
            tally.top_item(),
            tally.top_count(),
            threshold
        );
        Err(SyncError::NoConfirmedHeight {
            required: threshold,
            replies: tally.replies(),
        })
    }

    /// Fetch `block_num` from every peer and return the first reply that
    /// verifies on top of `prev_hash`.
    ///
    /// A failed-block sentinel is accepted only if no verifying reply came
    /// and enough peers reported it.
    pub async fn find_valid_block(
        &self,
        block_num: u64,
        prev_hash: Hash,
    ) -> CatchupResult<Option<Block>> {
        let peers = self.network.peers();
        if peers.is_empty() {
            return Ok(None);
        }

        let threshold = effective_confirmations(self.config.confirmations, peers.len());
        let deadline = Instant::now() + self.config.fetch_timeout();
        let mut replies = self.ask_peers(peers, NodeMessage::BlockDataRequest { block_num });
        let mut sentinel_votes = 0;
        let mut stop = self.stop.clone();

        loop {
            let next = tokio::select! {
                next = timeout_at(deadline, replies.next()) => next,
                _ = stop_requested(&mut stop) => return Err(SyncError::Stopped),
            };
            match next {
                Ok(Some((peer, Some(NodeMessage::BlockData(block))))) => {
                    match classify_block(&block, block_num, &prev_hash) {
                        BlockVerdict::Verified => {
                            debug!(
                                "[qc-13] Block {} from peer {} verified",
                                block_num,
                                short(&peer)
                            );
                            return Ok(Some(block));
                        }
                        BlockVerdict::FailedSentinel => sentinel_votes += 1,
                        BlockVerdict::Rejected => warn!(
                            "[qc-13] Discarding unverifiable block {} from peer {}",
                            block_num,
                            short(&peer)
                        ),
                    }
                }
                Ok(Some((peer, reply))) => debug!(
                    "[qc-13] Peer {} has no block {} ({})",
                    short(&peer),
                    block_num,
                    reply.as_ref().map_or("timeout", NodeMessage::kind)
                ),
                Ok(None) | Err(_) => break,
            }
        }

        if sentinel_votes >= threshold {
            info!(
                "[qc-13] Block {} failed on {} peers; accepting failed block",
                block_num, sentinel_votes
            );
            return Ok(Some(Block::failed(prev_hash, block_num)));
        }
        Ok(None)
    }

    /// Store a verified block, then feed it to state.
    fn commit(&self, block: Block) -> CatchupResult<()> {
        let block_num = block.block_num;
        self.store.put_block(block.clone())?;
        self.state
            .apply_block(&block)
            .map_err(|reason| SyncError::StateUpdate { block_num, reason })
    }

    /// Fetch and commit every height above the tip up to `target`.
    async fn fetch_up_to(&self, target: u64) -> CatchupResult<u64> {
        let mut fetched = 0;
        while self.store.latest_height() < target {
            let block_num = self.store.latest_height() + 1;
            let prev_hash = self.store.latest_hash();
            match self.find_valid_block(block_num, prev_hash).await? {
                Some(block) => {
                    self.commit(block)?;
                    fetched += 1;
                }
                None => {
                    error!("[qc-13] No peer served a valid block {}", block_num);
                    return Err(SyncError::NoValidBlock { block_num });
                }
            }
        }
        Ok(fetched)
    }

    async fn fetch_to_confirmed(&self, session_id: Uuid) -> CatchupResult<u64> {
        let mut fetched = 0;
        loop {
            let local = self.store.latest_height();
            let target = match self.discover_height().await? {
                Some(target) if target > local => target,
                _ => return Ok(fetched),
            };
            info!(
                "[qc-13] Sync {}: fetching blocks {}..={}",
                session_id,
                local + 1,
                target
            );
            fetched += self.fetch_up_to(target).await?;
        }
    }

    /// Commit a notified block, fetching any gap before it from peers.
    async fn apply_notified(&self, block: Block) -> CatchupResult<NotificationOutcome> {
        let local = self.store.latest_height();
        if block.block_num <= local {
            return Ok(NotificationOutcome::AlreadyKnown);
        }

        let prev_hash = self.store.latest_hash();
        let verdict = classify_block(&block, local + 1, &prev_hash);
        if verdict == BlockVerdict::Verified {
            self.commit(block)?;
        } else {
            debug!(
                "[qc-13] Notified block {} not applicable at {}; fetching from peers",
                block.block_num,
                local + 1
            );
            self.fetch_up_to(block.block_num).await?;
        }
        Ok(NotificationOutcome::Applied)
    }

    async fn drain_notifications(&self) -> usize {
        let mut applied = 0;
        loop {
            let next = {
                let mut queue = self.queue.lock();
                let next = queue.pending.pop_front();
                if next.is_none() {
                    queue.syncing = false;
                }
                next
            };
            let Some(block) = next else {
                return applied;
            };
            match self.apply_notified(block).await {
                Ok(NotificationOutcome::Applied) => applied += 1,
                Ok(_) => {}
                Err(e) => warn!("[qc-13] Dropping queued notification: {}", e),
            }
        }
    }

    /// Commit a block this node aggregated itself.
    ///
    /// Serialized with syncs and notification commits. Fails with
    /// `Storage` if the chain already advanced past the block.
    pub async fn commit_local(&self, block: Block) -> CatchupResult<()> {
        let _chain = self.chain.lock().await;
        self.commit(block)
    }

    /// Replay stored blocks into a state collaborator that fell behind the
    /// block store. Returns the number of blocks replayed.
    pub async fn reconcile_state_with_storage(&self) -> CatchupResult<u64> {
        let _chain = self.chain.lock().await;
        let mut replayed = 0;
        while self.state.latest_block_num() < self.store.latest_height() {
            let block_num = self.state.latest_block_num() + 1;
            let block = self
                .store
                .get_block(BlockRef::Number(block_num))
                .ok_or(SyncError::MissingStoredBlock { block_num })?;
            self.state
                .apply_block(&block)
                .map_err(|reason| SyncError::StateUpdate { block_num, reason })?;
            if self.state.latest_block_num() < block_num {
                return Err(SyncError::StateUpdate {
                    block_num,
                    reason: "state did not advance".to_string(),
                });
            }
            replayed += 1;
        }
        if replayed > 0 {
            info!(
                "[qc-13] Replayed {} stored blocks into state (height {})",
                replayed,
                self.store.latest_height()
            );
        }
        Ok(replayed)
    }
}

#[async_trait]
impl<N, B, U> CatchupApi for CatchupService<N, B, U>
where
    N: PeerNetwork,
    B: BlockStore,
    U: StateUpdater,
{
    async fn sync(&self) -> CatchupResult<SyncReport> {
        let _chain = self.chain.lock().await;
        let session_id = Uuid::new_v4();
        self.queue.lock().syncing = true;
        let _guard = SyncingGuard(&self.queue);

        let blocks_fetched = self.fetch_to_confirmed(session_id).await?;
        let notifications_applied = self.drain_notifications().await;

        let report = SyncReport {
            session_id,
            blocks_fetched,
            notifications_applied,
            height: self.store.latest_height(),
        };
        info!(
            "[qc-13] Sync {} complete at height {} ({} fetched, {} notified)",
            session_id, report.height, blocks_fetched, notifications_applied
        );
        Ok(report)
    }

    async fn is_caught_up(&self) -> CatchupResult<bool> {
        Ok(match self.discover_height().await? {
            Some(target) => self.store.latest_height() >= target,
            None => true,
        })
    }

    async fn handle_notification(&self, block: Block) -> CatchupResult<NotificationOutcome> {
        {
            let mut queue = self.queue.lock();
            if queue.syncing {
                debug!(
                    "[qc-13] Sync running; queueing notification for block {}",
                    block.block_num
                );
                queue.pending.push_back(block);
                return Ok(NotificationOutcome::Queued);
            }
        }

        let _chain = self.chain.lock().await;
        self.apply_notified(block).await
    }
}

fn short(peer: &PublicKey) -> String {
    hex::encode(&peer[..4])
}
