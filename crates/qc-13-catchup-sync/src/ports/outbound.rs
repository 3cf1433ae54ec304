//! # Outbound Ports
//!
//! Dependencies the Catch-up service needs from the outside world.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Block, NodeMessage, PublicKey};
use std::collections::HashMap;
use std::time::Duration;

/// Request/reply access to the other masternodes.
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Peers currently reachable, excluding this node.
    fn peers(&self) -> Vec<PublicKey>;

    /// Send `message` to `peer` and wait up to `timeout` for its reply.
    ///
    /// `None` covers every transport failure; the caller moves on to the
    /// remaining peers.
    async fn request(
        &self,
        peer: &PublicKey,
        message: NodeMessage,
        timeout: Duration,
    ) -> Option<NodeMessage>;
}

/// The node state fed by committed blocks.
pub trait StateUpdater: Send + Sync {
    /// Apply the state changes of `block`.
    fn apply_block(&self, block: &Block) -> Result<(), String>;

    /// Number of the last block applied.
    fn latest_block_num(&self) -> u64;
}

// =============================================================================
// Mock Implementation (for testing)
// =============================================================================

/// Mock peer for testing.
#[derive(Clone, Debug)]
pub struct MockPeer {
    /// Peer identity.
    pub id: PublicKey,
    /// Height reported to height requests.
    pub height: u64,
    /// Blocks served to data requests.
    pub blocks: HashMap<u64, Block>,
    /// Should stay silent?
    pub should_fail: bool,
    /// Simulated reply latency.
    pub delay: Duration,
}

impl MockPeer {
    pub fn new(id: PublicKey) -> Self {
        Self {
            id,
            height: 1,
            blocks: HashMap::new(),
            should_fail: false,
            delay: Duration::ZERO,
        }
    }

    /// Serve `blocks` and report the highest of them.
    pub fn serving(id: PublicKey, blocks: impl IntoIterator<Item = Block>) -> Self {
        let mut peer = Self::new(id);
        for block in blocks {
            peer.height = peer.height.max(block.block_num);
            peer.blocks.insert(block.block_num, block);
        }
        peer
    }

    fn reply(&self, message: &NodeMessage) -> NodeMessage {
        match message {
            NodeMessage::LatestBlockHeightRequest => NodeMessage::LatestBlockHeightReply {
                block_height: self.height,
            },
            NodeMessage::LatestBlockHashRequest => match self.blocks.get(&self.height) {
                Some(block) => NodeMessage::LatestBlockHashReply {
                    block_hash: block.block_hash,
                },
                None => NodeMessage::BadRequest,
            },
            NodeMessage::BlockDataRequest { block_num } => match self.blocks.get(block_num) {
                Some(block) => NodeMessage::BlockData(block.clone()),
                None => NodeMessage::BadRequest,
            },
            _ => NodeMessage::BadRequest,
        }
    }
}

/// In-memory peer set for testing.
#[derive(Debug, Default)]
pub struct MockPeerNetwork {
    peers: RwLock<Vec<MockPeer>>,
}

impl MockPeerNetwork {
    pub fn new(peers: Vec<MockPeer>) -> Self {
        Self {
            peers: RwLock::new(peers),
        }
    }

    /// Mutate every peer, e.g. to advance their chains.
    pub fn update(&self, f: impl Fn(&mut MockPeer)) {
        self.peers.write().iter_mut().for_each(f);
    }
}

#[async_trait]
impl PeerNetwork for MockPeerNetwork {
    fn peers(&self) -> Vec<PublicKey> {
        self.peers.read().iter().map(|p| p.id).collect()
    }

    async fn request(
        &self,
        peer: &PublicKey,
        message: NodeMessage,
        timeout: Duration,
    ) -> Option<NodeMessage> {
        let (delay, reply) = {
            let peers = self.peers.read();
            let peer = peers.iter().find(|p| p.id == *peer)?;
            if peer.should_fail {
                (timeout, None)
            } else {
                (peer.delay, Some(peer.reply(&message)))
            }
        };

        tokio::time::timeout(timeout, tokio::time::sleep(delay))
            .await
            .ok()?;
        reply
    }
}
