//! # Domain Errors
//!
//! Error types for Catch-up Sync. Every variant is retryable: the caller
//! re-invokes `sync()` and the service resumes from the stored tip.

use shared_types::{CodecError, StorageError};
use thiserror::Error;

/// Catch-up error types.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No height reached the confirmation threshold before the deadline.
    #[error("No height confirmed by {required} peers ({replies} replies)")]
    NoConfirmedHeight {
        /// Confirmations needed
        required: usize,
        /// Replies received
        replies: usize,
    },

    /// No peer returned a block that verifies at this height.
    #[error("No valid block found at height {block_num}")]
    NoValidBlock {
        /// Height that could not be fetched
        block_num: u64,
    },

    /// The block store holds fewer blocks than the state expects.
    #[error("Stored block {block_num} missing during state replay")]
    MissingStoredBlock {
        /// Height absent from the store
        block_num: u64,
    },

    /// The state collaborator refused a block.
    #[error("State update failed at block {block_num}: {reason}")]
    StateUpdate {
        /// Height being applied
        block_num: u64,
        /// Collaborator's reason
        reason: String,
    },

    /// Storage rejected a verified block.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A wire payload could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Stop was requested while syncing.
    #[error("Sync stopped")]
    Stopped,
}

/// Result alias for catch-up operations.
pub type CatchupResult<T> = Result<T, SyncError>;
