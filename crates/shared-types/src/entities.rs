//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Work results**: `TransactionData`, `StateChange`
//! - **Voting**: `SubBlockContender`, `SubBlockSignature`
//! - **Chain**: `SubBlock`, `Block`, `BlockRef`
//! - **Networking**: `NodeId`

use crate::canonical::{FAILED_BLOCK_HASH, GENESIS_BLOCK_NUM, GENESIS_HASH};
use crate::errors::CodecError;
use crate::merkle::merklize;
use crate::wallet::Wallet;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A 32-byte SHA3-256 digest.
pub type Hash = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// A 32-byte Ed25519 verifying key. Committee members are identified by it.
pub type PublicKey = [u8; 32];

/// Unique identifier for a node in the network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

impl From<PublicKey> for NodeId {
    fn from(key: PublicKey) -> Self {
        Self(key)
    }
}

// =============================================================================
// WORK RESULTS
// =============================================================================

/// A key/value pair written while executing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub key: String,
    pub value: String,
}

/// An executed transaction as reported by a delegate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    /// The packed signed transaction as submitted by the client.
    pub transaction: Vec<u8>,
    /// Execution status code (0 = success).
    pub status: u8,
    /// State writes produced by the execution.
    pub state: Vec<StateChange>,
    /// Stamps consumed by the execution.
    pub stamps_used: u64,
}

impl TransactionData {
    /// Bytes hashed into this transaction's merkle leaf.
    pub fn leaf_bytes(&self) -> Result<Vec<u8>, CodecError> {
        crate::canonical::encode_canonical(self)
    }
}

// =============================================================================
// VOTING
// =============================================================================

/// A delegate's signed claim about the outcome of one sub-block slot.
///
/// Never mutated after validation.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubBlockContender {
    /// Identifier of the batch of work this contender processed.
    pub input_hash: Hash,
    /// Executed transactions, in execution order.
    pub transactions: Vec<TransactionData>,
    /// Merkle tree over `transactions` in array form; leaf 0 is the root.
    pub merkle_leaves: Vec<Hash>,
    /// Signature over leaf 0, or over `input_hash` for an empty slot.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
    pub signer: PublicKey,
    /// Slot index this contender claims to fill.
    pub sub_block_num: u32,
    /// Chain tip the signer built on.
    pub prev_block_hash: Hash,
}

impl SubBlockContender {
    /// Build and sign a contender the way a delegate does.
    ///
    /// An empty slot carries `merklize([input_hash])` and signs the input
    /// hash itself.
    pub fn build(
        wallet: &Wallet,
        input_hash: Hash,
        transactions: Vec<TransactionData>,
        sub_block_num: u32,
        prev_block_hash: Hash,
    ) -> Result<Self, CodecError> {
        let (merkle_leaves, signature) = if transactions.is_empty() {
            (merklize(&[input_hash]), wallet.sign(&input_hash))
        } else {
            let leaves = transactions
                .iter()
                .map(TransactionData::leaf_bytes)
                .collect::<Result<Vec<_>, _>>()?;
            let tree = merklize(&leaves);
            let signature = wallet.sign(&tree[0]);
            (tree, signature)
        };

        Ok(Self {
            input_hash,
            transactions,
            merkle_leaves,
            signature,
            signer: wallet.public_key(),
            sub_block_num,
            prev_block_hash,
        })
    }

    /// The hash votes are tallied under: leaf 0, falling back to the input
    /// hash when no tree was supplied.
    pub fn result_hash(&self) -> Hash {
        self.merkle_leaves.first().copied().unwrap_or(self.input_hash)
    }

    /// The bytes the signer must have signed, if they can be determined.
    pub fn signed_message(&self) -> Option<&[u8]> {
        if self.transactions.is_empty() {
            Some(self.input_hash.as_slice())
        } else {
            self.merkle_leaves.first().map(|leaf| leaf.as_slice())
        }
    }

    /// True when the slot produced no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// One committee member's signature over a sub-block result.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubBlockSignature {
    pub signer: PublicKey,
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

// =============================================================================
// CHAIN
// =============================================================================

/// A finalized slot: one representative contender plus every signature
/// collected for its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubBlock {
    pub input_hash: Hash,
    pub transactions: Vec<TransactionData>,
    pub merkle_leaves: Vec<Hash>,
    pub sub_block_num: u32,
    pub prev_block_hash: Hash,
    /// Sorted by signer so every masternode hashes the same bytes.
    pub signatures: Vec<SubBlockSignature>,
}

impl SubBlock {
    /// Assemble a sub-block from a representative contender and the
    /// signature set of its result.
    pub fn from_contender(
        representative: &SubBlockContender,
        mut signatures: Vec<SubBlockSignature>,
    ) -> Self {
        signatures.sort();
        signatures.dedup();
        Self {
            input_hash: representative.input_hash,
            transactions: representative.transactions.clone(),
            merkle_leaves: representative.merkle_leaves.clone(),
            sub_block_num: representative.sub_block_num,
            prev_block_hash: representative.prev_block_hash,
            signatures,
        }
    }

    /// True when the slot carries no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Identities that signed this sub-block.
    pub fn signers(&self) -> impl Iterator<Item = &PublicKey> {
        self.signatures.iter().map(|s| &s.signer)
    }
}

/// The finalized unit of the chain. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_hash: Hash,
    pub block_num: u64,
    pub prev_block_hash: Hash,
    /// One entry per slot, in slot order. Empty for genesis and failed blocks.
    pub sub_blocks: Vec<SubBlock>,
    /// Committee identities that contributed signatures. Not part of the hash.
    pub block_owners: Vec<PublicKey>,
}

impl Block {
    /// The fixed chain root.
    pub fn genesis() -> Self {
        Self {
            block_hash: GENESIS_HASH,
            block_num: GENESIS_BLOCK_NUM,
            prev_block_hash: GENESIS_HASH,
            sub_blocks: Vec::new(),
            block_owners: Vec::new(),
        }
    }

    /// The sentinel produced when a round could not finalize every slot.
    pub fn failed(prev_block_hash: Hash, block_num: u64) -> Self {
        Self {
            block_hash: FAILED_BLOCK_HASH,
            block_num,
            prev_block_hash,
            sub_blocks: Vec::new(),
            block_owners: Vec::new(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// True for the failed-block sentinel at any height.
    pub fn is_failed(&self) -> bool {
        !self.is_genesis()
            && self.block_hash == FAILED_BLOCK_HASH
            && self.sub_blocks.is_empty()
    }

    /// A skip block has slots, none of which carry transactions.
    pub fn is_skip(&self) -> bool {
        !self.sub_blocks.is_empty() && self.sub_blocks.iter().all(SubBlock::is_empty)
    }

    /// Total transactions across all slots.
    pub fn transaction_count(&self) -> usize {
        self.sub_blocks.iter().map(|sb| sb.transactions.len()).sum()
    }
}

/// Lookup key for stored blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    Number(u64),
    Hash(Hash),
}

impl From<u64> for BlockRef {
    fn from(num: u64) -> Self {
        Self::Number(num)
    }
}

impl From<Hash> for BlockRef {
    fn from(hash: Hash) -> Self {
        Self::Hash(hash)
    }
}
