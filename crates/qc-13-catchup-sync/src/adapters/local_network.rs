//! In-process peer network.
//!
//! Routes requests to the `BlockServer` of other nodes in the same process,
//! through the wire codec. Used by the single-process runtime and by
//! integration tests.

use crate::application::BlockServer;
use crate::ports::PeerNetwork;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{BlockStore, NodeMessage, PublicKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Block servers of every node, by identity.
pub type ServerRegistry<B> = Arc<RwLock<BTreeMap<PublicKey, Arc<BlockServer<B>>>>>;

/// One node's view of the shared registry.
pub struct LocalPeerNetwork<B: BlockStore> {
    local: PublicKey,
    registry: ServerRegistry<B>,
}

impl<B: BlockStore> LocalPeerNetwork<B> {
    pub fn new(local: PublicKey, registry: ServerRegistry<B>) -> Self {
        Self { local, registry }
    }

    /// Make `server` reachable as `node`.
    pub fn register(registry: &ServerRegistry<B>, node: PublicKey, server: Arc<BlockServer<B>>) {
        registry.write().insert(node, server);
    }
}

#[async_trait]
impl<B: BlockStore> PeerNetwork for LocalPeerNetwork<B> {
    fn peers(&self) -> Vec<PublicKey> {
        self.registry
            .read()
            .keys()
            .filter(|peer| **peer != self.local)
            .copied()
            .collect()
    }

    async fn request(
        &self,
        peer: &PublicKey,
        message: NodeMessage,
        timeout: Duration,
    ) -> Option<NodeMessage> {
        let server = self.registry.read().get(peer).cloned()?;
        let request = message.encode().ok()?;

        let reply = tokio::time::timeout(timeout, async move {
            tokio::task::yield_now().await;
            server.handle_bytes(&request)
        })
        .await
        .ok()?;

        match reply.and_then(|bytes| NodeMessage::decode(&bytes)) {
            Ok(reply) => Some(reply),
            Err(e) => {
                debug!("[qc-13] Dropping reply from {}: {}", hex::encode(&peer[..4]), e);
                None
            }
        }
    }
}
