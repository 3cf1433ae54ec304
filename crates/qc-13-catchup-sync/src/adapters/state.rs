//! In-memory state collaborator.

use crate::ports::StateUpdater;
use parking_lot::RwLock;
use shared_types::{Block, Hash, GENESIS_BLOCK_NUM, GENESIS_HASH};
use std::collections::HashMap;

#[derive(Debug)]
struct StateInner {
    latest_block_num: u64,
    latest_block_hash: Hash,
    values: HashMap<String, String>,
}

/// Key/value state built from the recorded state changes of successful
/// transactions. Starts at genesis.
#[derive(Debug)]
pub struct InMemoryState {
    inner: RwLock<StateInner>,
}

impl Default for InMemoryState {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryState {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StateInner {
                latest_block_num: GENESIS_BLOCK_NUM,
                latest_block_hash: GENESIS_HASH,
                values: HashMap::new(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read().values.get(key).cloned()
    }

    pub fn latest_block_hash(&self) -> Hash {
        self.inner.read().latest_block_hash
    }
}

impl StateUpdater for InMemoryState {
    fn apply_block(&self, block: &Block) -> Result<(), String> {
        let mut inner = self.inner.write();
        if block.block_num != inner.latest_block_num + 1 {
            return Err(format!(
                "expected block {}, got {}",
                inner.latest_block_num + 1,
                block.block_num
            ));
        }

        let changes = block
            .sub_blocks
            .iter()
            .flat_map(|sb| &sb.transactions)
            .filter(|tx| tx.status == 0)
            .flat_map(|tx| &tx.state);
        for change in changes {
            inner.values.insert(change.key.clone(), change.value.clone());
        }

        inner.latest_block_num = block.block_num;
        inner.latest_block_hash = block.block_hash;
        Ok(())
    }

    fn latest_block_num(&self) -> u64 {
        self.inner.read().latest_block_num
    }
}
