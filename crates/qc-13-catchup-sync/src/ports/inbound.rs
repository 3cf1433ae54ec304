//! # Inbound Ports
//!
//! API trait defining what the Catch-up service can do.

use crate::domain::{CatchupResult, NotificationOutcome, SyncReport};
use async_trait::async_trait;
use shared_types::Block;

/// Catch-up API - inbound port.
#[async_trait]
pub trait CatchupApi: Send + Sync {
    /// Bring the local chain up to the peers' confirmed height.
    ///
    /// Safe to call repeatedly; each call resumes from the stored tip.
    async fn sync(&self) -> CatchupResult<SyncReport>;

    /// Discover the confirmed height and compare without fetching.
    async fn is_caught_up(&self) -> CatchupResult<bool>;

    /// Accept a block announced by a peer that just committed it.
    async fn handle_notification(&self, block: Block) -> CatchupResult<NotificationOutcome>;
}
