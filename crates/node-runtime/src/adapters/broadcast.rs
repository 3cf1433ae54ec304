//! # Broadcast Adapter
//!
//! Publishes encoded messages to every masternode subscribed to the same
//! in-process bus.
//!
//! The sender identity travels in the [`Envelope`], never in the payload.

use shared_types::{InboundMessage, NodeMessage, PublicKey};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// Topic for committed-block notifications.
pub const BLOCK_NOTIFICATION_TOPIC: &str = "block-notifications";

/// One published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub topic: String,
    pub sender: PublicKey,
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Decode the payload into a message attributed to `sender`.
    pub fn open(&self) -> Result<InboundMessage, shared_types::CodecError> {
        InboundMessage::decode(self.sender, &self.payload)
    }
}

/// Broadcast errors.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("Encoding failed: {0}")]
    Codec(#[from] shared_types::CodecError),
}

/// Outbound broadcast port.
pub trait Broadcaster: Send + Sync {
    /// Publish `message` on `topic`. Returns how many subscribers got it.
    fn broadcast(&self, topic: &str, message: &NodeMessage) -> Result<usize, BroadcastError>;
}

/// Broadcaster backed by a shared `tokio::sync::broadcast` channel.
#[derive(Clone)]
pub struct LocalBroadcast {
    sender: PublicKey,
    bus: broadcast::Sender<Envelope>,
}

impl LocalBroadcast {
    pub fn new(sender: PublicKey, bus: broadcast::Sender<Envelope>) -> Self {
        Self { sender, bus }
    }

    /// Create a bus that buffers `capacity` envelopes per subscriber.
    pub fn bus(capacity: usize) -> broadcast::Sender<Envelope> {
        broadcast::channel(capacity).0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.bus.subscribe()
    }
}

impl Broadcaster for LocalBroadcast {
    fn broadcast(&self, topic: &str, message: &NodeMessage) -> Result<usize, BroadcastError> {
        let envelope = Envelope {
            topic: topic.to_string(),
            sender: self.sender,
            payload: message.encode()?,
        };
        // No subscribers is not an error.
        let delivered = self.bus.send(envelope).unwrap_or(0);
        debug!(
            "Broadcast {} on {} to {} subscribers",
            message.kind(),
            topic,
            delivered
        );
        Ok(delivered)
    }
}
