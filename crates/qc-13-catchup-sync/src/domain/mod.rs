//! # Domain Layer
//!
//! Core types for Catch-up Sync.

pub mod errors;
pub mod tally;

pub use errors::*;
pub use tally::ConfirmationTally;

use uuid::Uuid;

/// Matching replies required before a reported height is trusted.
pub const DEFAULT_CONFIRMATIONS: usize = 3;

/// Summary of one completed `sync()` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    /// Correlates the log lines of one sync.
    pub session_id: Uuid,
    /// Blocks fetched from peers and committed.
    pub blocks_fetched: u64,
    /// Queued notifications applied after the bulk fetch.
    pub notifications_applied: usize,
    /// Local height when the sync finished.
    pub height: u64,
}

/// What happened to a new-block notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// A sync is running; the block will be applied when it finishes.
    Queued,
    /// The block (and any gap before it) was committed.
    Applied,
    /// The block is at or below the local height.
    AlreadyKnown,
}
