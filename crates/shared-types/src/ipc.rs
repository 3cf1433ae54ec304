//! # Wire Messages
//!
//! Every payload exchanged between masternodes and delegates is one variant
//! of [`NodeMessage`]. Payloads are decoded once, at the transport boundary,
//! and matched exhaustively afterwards.
//!
//! ## Design Rules
//!
//! - The bincode enum discriminant is the wire tag; there is no separate
//!   type byte.
//! - The sender identity travels outside the payload, in
//!   [`InboundMessage::sender`].

use crate::entities::*;
use crate::errors::CodecError;
use serde::{Deserialize, Serialize};

/// Tagged union of all known wire kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeMessage {
    /// One contender per slot, from a single delegate.
    SubBlockContenders(Vec<SubBlockContender>),

    /// Ask a peer for its latest block number.
    LatestBlockHeightRequest,
    LatestBlockHeightReply { block_height: u64 },

    /// Ask a peer for its latest block hash.
    LatestBlockHashRequest,
    LatestBlockHashReply { block_hash: Hash },

    /// Ask a peer for the stored block at `block_num`.
    BlockDataRequest { block_num: u64 },
    BlockData(Block),

    /// Published by a masternode after committing a block.
    BlockNotification(Block),

    /// The request could not be served.
    BadRequest,
}

impl NodeMessage {
    /// Encode for the wire.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a wire payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubBlockContenders(_) => "SubBlockContenders",
            Self::LatestBlockHeightRequest => "LatestBlockHeightRequest",
            Self::LatestBlockHeightReply { .. } => "LatestBlockHeightReply",
            Self::LatestBlockHashRequest => "LatestBlockHashRequest",
            Self::LatestBlockHashReply { .. } => "LatestBlockHashReply",
            Self::BlockDataRequest { .. } => "BlockDataRequest",
            Self::BlockData(_) => "BlockData",
            Self::BlockNotification(_) => "BlockNotification",
            Self::BadRequest => "BadRequest",
        }
    }
}

/// A decoded payload together with the identity that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: PublicKey,
    pub message: NodeMessage,
}

impl InboundMessage {
    /// Decode raw bytes received from `sender`.
    pub fn decode(sender: PublicKey, bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Self {
            sender,
            message: NodeMessage::decode(bytes)?,
        })
    }
}
