//! # Error Types
//!
//! Defines error types shared across subsystems.

use thiserror::Error;

/// Errors raised while producing canonical or wire encodings.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Binary encoding or decoding failed.
    #[error("Binary codec error: {0}")]
    Binary(#[from] bincode::Error),

    /// Record could not be converted to its structured form.
    #[error("Structured conversion error: {0}")]
    Structured(#[from] serde_json::Error),
}

/// Errors that can occur in block storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Block not found in storage.
    #[error("Block not found: {0}")]
    NotFound(String),

    /// Block number does not extend the stored chain.
    #[error("Non-sequential block: expected {expected}, got {actual}")]
    NonSequentialBlock { expected: u64, actual: u64 },

    /// Block does not link to the stored tip.
    #[error("Parent mismatch: block {block_num} does not extend the stored tip")]
    ParentMismatch { block_num: u64 },

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Node operational states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Aggregating rounds.
    Running,
    /// Catching up with peers.
    Syncing,
}
