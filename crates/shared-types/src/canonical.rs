//! # Canonical Block Hashing
//!
//! Deterministic block identity over a sequence of finalized sub-blocks.
//!
//! Every sub-block record is normalized (keys sorted recursively, lists of
//! records normalized element-wise, scalars untouched) and encoded with
//! bincode. The previous block hash followed by each encoded sub-block, in
//! slot order, is fed into one SHA3-256 hasher.
//!
//! A block with any missing slot is a failed block and takes the fixed
//! all-zero hash instead; failed blocks are never hashed from content.

use crate::entities::{Block, Hash, SubBlock};
use crate::errors::CodecError;
use serde::Serialize;
use serde_json::Value;
use sha3::{Digest, Sha3_256};
use std::collections::BTreeSet;

/// Hash of the chain root.
pub const GENESIS_HASH: Hash = [0u8; 32];

/// Block number of the chain root.
pub const GENESIS_BLOCK_NUM: u64 = 1;

/// Hash assigned to every failed block.
pub const FAILED_BLOCK_HASH: Hash = [0u8; 32];

/// Recursively sort object keys so serialization order cannot leak into
/// the encoding.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> =
                map.into_iter().map(|(k, v)| (k, normalize(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        scalar => scalar,
    }
}

/// Canonical binary encoding of an already-structured record.
pub fn encode_value(value: Value) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(&normalize(value))?)
}

/// Canonical binary encoding of any serializable record.
pub fn encode_canonical<T: Serialize>(record: &T) -> Result<Vec<u8>, CodecError> {
    encode_value(serde_json::to_value(record)?)
}

/// Stateless block identity computation.
pub struct CanonicalHasher;

impl CanonicalHasher {
    /// Hash structured records on top of `prev_block_hash`.
    pub fn hash_values(records: &[Value], prev_block_hash: &Hash) -> Result<Hash, CodecError> {
        let mut hasher = Sha3_256::new();
        hasher.update(prev_block_hash);
        for record in records {
            hasher.update(encode_value(record.clone())?);
        }
        Ok(hasher.finalize().into())
    }

    /// Hash finalized sub-blocks in slot order.
    pub fn hash(sub_blocks: &[SubBlock], prev_block_hash: &Hash) -> Result<Hash, CodecError> {
        let records = sub_blocks
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Self::hash_values(&records, prev_block_hash)
    }

    /// Assemble a block from per-slot results.
    ///
    /// Any `None` slot yields the failed-block sentinel.
    pub fn block_from_sub_blocks(
        slots: Vec<Option<SubBlock>>,
        prev_block_hash: Hash,
        block_num: u64,
    ) -> Result<Block, CodecError> {
        let Some(sub_blocks) = slots.into_iter().collect::<Option<Vec<_>>>() else {
            return Ok(Block::failed(prev_block_hash, block_num));
        };

        let block_hash = Self::hash(&sub_blocks, &prev_block_hash)?;
        let block_owners = sub_blocks
            .iter()
            .flat_map(SubBlock::signers)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Block {
            block_hash,
            block_num,
            prev_block_hash,
            sub_blocks,
            block_owners,
        })
    }

    /// Recompute the hash of `sub_blocks` and compare it with `claimed`.
    pub fn verify(sub_blocks: &[SubBlock], prev_block_hash: &Hash, claimed: &Hash) -> bool {
        match Self::hash(sub_blocks, prev_block_hash) {
            Ok(computed) => computed == *claimed,
            Err(e) => {
                tracing::debug!("Canonical encoding failed during verify: {}", e);
                false
            }
        }
    }
}
