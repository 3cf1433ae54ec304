//! # Notification Handler
//!
//! Feeds `BlockNotification`s published by other masternodes into catch-up
//! sync. Everything else on the bus is ignored.

use std::sync::Arc;

use qc_13_catchup_sync::{CatchupApi, NotificationOutcome};
use shared_types::{stop_requested, NodeMessage, PublicKey};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::adapters::{Envelope, BLOCK_NOTIFICATION_TOPIC};

/// Handler for block notifications from peers.
pub struct NotificationHandler<C: CatchupApi> {
    catchup: Arc<C>,
    /// Our own notifications come back on the bus and are skipped.
    local: PublicKey,
}

impl<C: CatchupApi> NotificationHandler<C> {
    pub fn new(catchup: Arc<C>, local: PublicKey) -> Self {
        Self { catchup, local }
    }

    /// Run until the bus closes or `stop` is raised. A dropped stop sender
    /// never stops the handler.
    pub async fn run(
        self,
        mut receiver: broadcast::Receiver<Envelope>,
        mut stop: watch::Receiver<bool>,
    ) {
        info!("[qc-13] Notification handler started");

        let stopped = async move { stop_requested(&mut stop).await };
        tokio::pin!(stopped);

        loop {
            let received = tokio::select! {
                _ = &mut stopped => {
                    info!("[qc-13] Shutdown signal received");
                    return;
                }
                received = receiver.recv() => received,
            };

            match received {
                Ok(envelope) => self.dispatch(envelope).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("[qc-13] Lagged by {} notifications", n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("[qc-13] Bus closed, exiting");
                    return;
                }
            }
        }
    }

    async fn dispatch(&self, envelope: Envelope) {
        if envelope.topic != BLOCK_NOTIFICATION_TOPIC || envelope.sender == self.local {
            return;
        }

        let inbound = match envelope.open() {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(
                    "[qc-13] Undecodable notification from {}: {}",
                    hex::encode(&envelope.sender[..4]),
                    e
                );
                return;
            }
        };

        let NodeMessage::BlockNotification(block) = inbound.message else {
            debug!(
                "[qc-13] Ignoring {} on {}",
                inbound.message.kind(),
                BLOCK_NOTIFICATION_TOPIC
            );
            return;
        };

        let block_num = block.block_num;
        match self.catchup.handle_notification(block).await {
            Ok(NotificationOutcome::Applied) => {
                debug!("[qc-13] Applied notified block {}", block_num);
            }
            Ok(NotificationOutcome::Queued) => {
                debug!("[qc-13] Queued notified block {} behind running sync", block_num);
            }
            Ok(NotificationOutcome::AlreadyKnown) => {}
            Err(e) => warn!("[qc-13] Notified block {} rejected: {}", block_num, e),
        }
    }
}
