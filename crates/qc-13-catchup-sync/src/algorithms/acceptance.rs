//! # Block Acceptance Rule
//!
//! A fetched block is trusted only if its content re-hashes to its claimed
//! hash on top of the block we already hold.

use shared_types::{Block, CanonicalHasher, Hash};

/// Classification of one peer's block reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockVerdict {
    /// Content reverifies against our previous hash.
    Verified,
    /// The failed-block sentinel. Cannot be checked from content.
    FailedSentinel,
    /// Wrong height, wrong parent, or content that does not hash.
    Rejected,
}

/// Classify `block` as a candidate for `block_num` on top of `prev_hash`.
pub fn classify_block(block: &Block, block_num: u64, prev_hash: &Hash) -> BlockVerdict {
    if block.block_num != block_num || block.prev_block_hash != *prev_hash {
        return BlockVerdict::Rejected;
    }
    if block.is_failed() {
        return BlockVerdict::FailedSentinel;
    }

    // Slots must be present and in order; an empty slot list would hash
    // the parent alone.
    let ordered = !block.sub_blocks.is_empty()
        && (0u32..)
            .zip(&block.sub_blocks)
            .all(|(slot, sb)| sb.sub_block_num == slot && sb.prev_block_hash == *prev_hash);
    if !ordered {
        return BlockVerdict::Rejected;
    }

    if CanonicalHasher::verify(&block.sub_blocks, prev_hash, &block.block_hash) {
        BlockVerdict::Verified
    } else {
        BlockVerdict::Rejected
    }
}
