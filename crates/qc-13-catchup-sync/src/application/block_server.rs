//! # Block Server
//!
//! Answers other masternodes' catch-up requests from the local store.

use shared_types::{BlockRef, BlockStore, CodecError, NodeMessage};
use std::sync::Arc;
use tracing::{debug, warn};

/// Peer-facing request handler.
pub struct BlockServer<B: BlockStore> {
    store: Arc<B>,
}

impl<B: BlockStore> BlockServer<B> {
    pub fn new(store: Arc<B>) -> Self {
        Self { store }
    }

    /// Answer one decoded request.
    pub fn handle(&self, request: &NodeMessage) -> NodeMessage {
        match request {
            NodeMessage::LatestBlockHeightRequest => NodeMessage::LatestBlockHeightReply {
                block_height: self.store.latest_height(),
            },
            NodeMessage::LatestBlockHashRequest => NodeMessage::LatestBlockHashReply {
                block_hash: self.store.latest_hash(),
            },
            NodeMessage::BlockDataRequest { block_num } => {
                match self.store.get_block(BlockRef::Number(*block_num)) {
                    Some(block) => NodeMessage::BlockData(block),
                    None => {
                        debug!("[qc-13] Block {} requested but not stored", block_num);
                        NodeMessage::BadRequest
                    }
                }
            }
            other => {
                warn!("[qc-13] Unexpected request kind {}", other.kind());
                NodeMessage::BadRequest
            }
        }
    }

    /// Answer a raw request. Undecodable payloads get `BadRequest`.
    pub fn handle_bytes(&self, request: &[u8]) -> Result<Vec<u8>, CodecError> {
        let reply = match NodeMessage::decode(request) {
            Ok(message) => self.handle(&message),
            Err(e) => {
                warn!("[qc-13] Undecodable request: {}", e);
                NodeMessage::BadRequest
            }
        };
        reply.encode()
    }
}
