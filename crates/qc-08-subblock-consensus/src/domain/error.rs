//! Error types for the aggregation subsystem

use shared_types::{CodecError, PublicKey};

/// Reasons a contender, or the group carrying it, is refused admission to
/// the tally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContenderError {
    #[error("Sub-block index mismatch: expected {expected}, got {actual}")]
    IndexMismatch { expected: u32, actual: u32 },

    #[error("Invalid contender signature from {signer}")]
    InvalidSignature { signer: String },

    #[error("Previous block hash mismatch: contender built on {claimed}")]
    BlockHashMismatch { claimed: String },

    #[error("Merkle leaf mismatch at leaf {index}")]
    MerkleLeafMismatch { index: usize },

    #[error("Contender group size mismatch: expected {expected}, got {actual}")]
    GroupSize { expected: usize, actual: usize },

    #[error("Contender group mixes signers")]
    MixedSigners,

    #[error("Duplicate vote from {0}")]
    DuplicateVote(String),
}

impl ContenderError {
    pub(crate) fn invalid_signature(signer: &PublicKey) -> Self {
        Self::InvalidSignature {
            signer: hex::encode(&signer[..4]),
        }
    }

    pub(crate) fn duplicate_vote(signer: &PublicKey) -> Self {
        Self::DuplicateVote(hex::encode(&signer[..4]))
    }

    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::IndexMismatch { .. } => "index_mismatch",
            Self::InvalidSignature { .. } => "invalid_signature",
            Self::BlockHashMismatch { .. } => "block_hash_mismatch",
            Self::MerkleLeafMismatch { .. } => "merkle_leaf_mismatch",
            Self::GroupSize { .. } => "group_size",
            Self::MixedSigners => "mixed_signers",
            Self::DuplicateVote(_) => "duplicate_vote",
        }
    }
}

/// Result type for contender validation
pub type ContenderResult<T> = Result<T, ContenderError>;

/// Failures of a whole round. All are retryable by calling
/// `gather_round` again.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("Committee roster is empty")]
    EmptyCommittee,

    #[error("Contender feed closed")]
    FeedClosed,

    #[error("Aggregation stopped")]
    Stopped,

    #[error("Block {block_num} failed its own hash check")]
    SelfCheckFailed { block_num: u64 },

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Result type for aggregation operations
pub type AggregationResult<T> = Result<T, AggregationError>;
