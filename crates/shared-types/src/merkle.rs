//! Array-form merkle tree over SHA3-256.
//!
//! For `n` leaves the tree holds `2n - 1` nodes. Leaf hashes occupy the last
//! `n` positions and node `i` is the hash of nodes `2i + 1` and `2i + 2`, so
//! the root sits at index 0.

use crate::entities::Hash;
use sha3::{Digest, Sha3_256};

/// SHA3-256 of arbitrary bytes.
pub fn sha3_256(data: &[u8]) -> Hash {
    Sha3_256::digest(data).into()
}

/// Build the array-form tree over `leaves`. Returns an empty tree for no
/// leaves.
pub fn merklize<T: AsRef<[u8]>>(leaves: &[T]) -> Vec<Hash> {
    if leaves.is_empty() {
        return Vec::new();
    }

    let inner = leaves.len() - 1;
    let mut nodes = vec![[0u8; 32]; inner];
    nodes.extend(leaves.iter().map(|leaf| sha3_256(leaf.as_ref())));

    for i in (0..inner).rev() {
        let mut hasher = Sha3_256::new();
        hasher.update(nodes[2 * i + 1]);
        hasher.update(nodes[2 * i + 2]);
        nodes[i] = hasher.finalize().into();
    }

    nodes
}
