//! # Subsystem Container
//!
//! Holds one masternode's subsystem instances.
//!
//! ```text
//!  ContenderSender ──→ BlockAggregator (qc-08) ──block──┐
//!                                                      ↓
//!  LocalTransport ──→ CatchupService (qc-13) ──→ InMemoryBlockStore ──→ InMemoryState
//!        ↑                                             │
//!        └────────────── BlockServer ←─────────────────┘
//! ```
//!
//! Both subsystems share the block store. Only the catch-up service writes
//! to it; the aggregator reads the tip when a round starts.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, instrument};

use qc_08_subblock_consensus::{
    contender_channel, AggregatorDependencies, BlockAggregator, ChannelContenderFeed,
    ContenderSender, Ed25519Verifier, StaticCommittee,
};
use qc_13_catchup_sync::{
    BlockServer, CatchupDependencies, CatchupService, InMemoryState, LocalPeerNetwork,
    ServerRegistry,
};
use shared_types::{InMemoryBlockStore, PublicKey, Wallet};

use crate::adapters::{Envelope, LocalBroadcast};
use crate::container::config::NodeConfig;

/// Contender groups buffered ahead of the aggregator.
const CONTENDER_QUEUE: usize = 256;

/// Envelopes buffered per bus subscriber.
const BUS_CAPACITY: usize = 1024;

pub type NodeStore = InMemoryBlockStore;

pub type NodeAggregator =
    BlockAggregator<ChannelContenderFeed, Ed25519Verifier, StaticCommittee, NodeStore>;

pub type NodeCatchup = CatchupService<LocalPeerNetwork<NodeStore>, NodeStore, InMemoryState>;

/// Peer lookup and notification bus shared by every masternode in the
/// process.
#[derive(Clone)]
pub struct LocalTransport {
    pub servers: ServerRegistry<NodeStore>,
    pub bus: broadcast::Sender<Envelope>,
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTransport {
    pub fn new() -> Self {
        Self {
            servers: Arc::default(),
            bus: LocalBroadcast::bus(BUS_CAPACITY),
        }
    }
}

/// One masternode's subsystems.
pub struct MasternodeContainer {
    pub identity: PublicKey,
    pub store: Arc<NodeStore>,
    pub state: Arc<InMemoryState>,
    pub committee: Arc<StaticCommittee>,
    /// Transport entry point for delegate contender groups.
    pub contenders: ContenderSender,
    pub aggregator: Arc<NodeAggregator>,
    pub catchup: Arc<NodeCatchup>,
    pub broadcaster: LocalBroadcast,
    /// Immutable after initialization.
    pub config: NodeConfig,
}

impl MasternodeContainer {
    /// Build the subsystems and make this node's blocks reachable through
    /// `transport`.
    #[instrument(name = "masternode_init", skip_all)]
    pub fn new(
        config: NodeConfig,
        wallet: &Wallet,
        transport: &LocalTransport,
        stop: watch::Receiver<bool>,
    ) -> Self {
        let identity = wallet.public_key();
        info!(
            "Initializing masternode {} ({} committee members, {} slots)",
            hex::encode(&identity[..4]),
            config.committee.len(),
            config.aggregator.slot_count
        );

        let store = Arc::new(InMemoryBlockStore::new());
        let state = Arc::new(InMemoryState::new());
        let committee = Arc::new(StaticCommittee::new(config.committee.clone()));

        let (contenders, feed) = contender_channel(CONTENDER_QUEUE);
        let aggregator = BlockAggregator::new(AggregatorDependencies {
            feed: Arc::new(feed),
            verifier: Arc::new(Ed25519Verifier),
            roster: Arc::clone(&committee),
            store: Arc::clone(&store),
            config: config.aggregator.clone(),
        })
        .with_stop(stop.clone());
        info!("  [qc-08] Block aggregator initialized");

        LocalPeerNetwork::register(
            &transport.servers,
            identity,
            Arc::new(BlockServer::new(Arc::clone(&store))),
        );
        let network = LocalPeerNetwork::new(identity, Arc::clone(&transport.servers));
        let catchup = CatchupService::new(CatchupDependencies {
            network: Arc::new(network),
            store: Arc::clone(&store),
            state: Arc::clone(&state),
            config: config.catchup.clone(),
        })
        .with_stop(stop);
        info!("  [qc-13] Catch-up sync initialized");

        Self {
            identity,
            store,
            state,
            committee,
            contenders,
            aggregator: Arc::new(aggregator),
            catchup: Arc::new(catchup),
            broadcaster: LocalBroadcast::new(identity, transport.bus.clone()),
            config,
        }
    }
}
