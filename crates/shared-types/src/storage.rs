//! # Block Storage Port
//!
//! The persistent storage engine is an external collaborator. Subsystems
//! only see [`BlockStore`]; [`InMemoryBlockStore`] backs tests and the
//! single-process runtime.

use crate::entities::{Block, BlockRef, Hash};
use crate::errors::StorageError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Append-only block log.
///
/// Blocks are appended strictly in height order and each must link to the
/// current tip.
pub trait BlockStore: Send + Sync {
    /// Append `block` to the chain.
    fn put_block(&self, block: Block) -> Result<(), StorageError>;

    /// Look a block up by number or hash.
    fn get_block(&self, by: BlockRef) -> Option<Block>;

    /// Number of the latest stored block.
    fn latest_height(&self) -> u64;

    /// Hash of the latest stored block.
    fn latest_hash(&self) -> Hash;
}

#[derive(Debug)]
struct ChainLog {
    blocks: Vec<Block>,
    by_hash: HashMap<Hash, u64>,
}

impl ChainLog {
    fn tip(&self) -> &Block {
        // Never empty: seeded with genesis.
        &self.blocks[self.blocks.len() - 1]
    }
}

/// In-memory block log seeded with the genesis block.
#[derive(Debug)]
pub struct InMemoryBlockStore {
    inner: RwLock<ChainLog>,
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ChainLog {
                blocks: vec![Block::genesis()],
                by_hash: HashMap::new(),
            }),
        }
    }
}

impl BlockStore for InMemoryBlockStore {
    fn put_block(&self, block: Block) -> Result<(), StorageError> {
        let mut log = self.inner.write();
        let tip = log.tip();

        let expected = tip.block_num + 1;
        if block.block_num != expected {
            return Err(StorageError::NonSequentialBlock {
                expected,
                actual: block.block_num,
            });
        }
        if block.prev_block_hash != tip.block_hash {
            return Err(StorageError::ParentMismatch {
                block_num: block.block_num,
            });
        }

        // Failed blocks share one sentinel hash and are reachable by number only.
        if !block.is_failed() {
            log.by_hash.insert(block.block_hash, block.block_num);
        }
        log.blocks.push(block);
        Ok(())
    }

    fn get_block(&self, by: BlockRef) -> Option<Block> {
        let log = self.inner.read();
        let first = log.blocks[0].block_num;
        let num = match by {
            BlockRef::Number(num) => num,
            BlockRef::Hash(hash) => *log.by_hash.get(&hash)?,
        };
        let index = usize::try_from(num.checked_sub(first)?).ok()?;
        log.blocks.get(index).cloned()
    }

    fn latest_height(&self) -> u64 {
        self.inner.read().tip().block_num
    }

    fn latest_hash(&self) -> Hash {
        self.inner.read().tip().block_hash
    }
}
