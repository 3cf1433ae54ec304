//! Channel-backed contender feed
//!
//! The transport pushes raw payloads into a [`ContenderSender`]; they are
//! decoded once here and only `SubBlockContenders` reach the aggregator.

use crate::ports::{ContenderFeed, ContenderGroup};
use async_trait::async_trait;
use shared_types::{CodecError, NodeMessage, PublicKey};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

/// Create a bounded feed and its producer handle.
pub fn contender_channel(capacity: usize) -> (ContenderSender, ChannelContenderFeed) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        ContenderSender { tx },
        ChannelContenderFeed {
            rx: Mutex::new(rx),
        },
    )
}

/// Producer side, cloneable across transport tasks.
#[derive(Debug, Clone)]
pub struct ContenderSender {
    tx: mpsc::Sender<ContenderGroup>,
}

impl ContenderSender {
    /// Queue a decoded group. Returns `false` once the feed is gone.
    pub async fn submit(&self, group: ContenderGroup) -> bool {
        self.tx.send(group).await.is_ok()
    }

    /// Decode a wire payload from `sender` and queue it if it carries
    /// contenders. Other message kinds are ignored.
    pub async fn submit_bytes(&self, sender: PublicKey, bytes: &[u8]) -> Result<bool, CodecError> {
        match NodeMessage::decode(bytes)? {
            NodeMessage::SubBlockContenders(contenders) => Ok(self
                .submit(ContenderGroup { sender, contenders })
                .await),
            other => {
                debug!("[qc-08] Ignoring {} on the contender feed", other.kind());
                Ok(false)
            }
        }
    }
}

/// Consumer side handed to the aggregator.
#[derive(Debug)]
pub struct ChannelContenderFeed {
    rx: Mutex<mpsc::Receiver<ContenderGroup>>,
}

#[async_trait]
impl ContenderFeed for ChannelContenderFeed {
    async fn next_group(&self) -> Option<ContenderGroup> {
        self.rx.lock().await.recv().await
    }
}
