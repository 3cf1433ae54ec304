use crate::domain::{ContenderError, ContenderResult};
use crate::ports::SignatureVerifier;
use shared_types::{merklize, Hash, PublicKey, SubBlockContender, TransactionData};
use std::collections::BTreeSet;

/// Stateless admission checks for sub-block contenders.
pub struct ContenderValidator;

impl ContenderValidator {
    /// Validate one contender. Checks run in order and the first failure
    /// wins:
    ///
    /// 1. slot index
    /// 2. signature and committee membership
    /// 3. previous block hash
    /// 4. merkle leaves, when supplied
    pub fn validate(
        contender: &SubBlockContender,
        expected_slot: u32,
        expected_prev_hash: &Hash,
        committee: &BTreeSet<PublicKey>,
        verifier: &dyn SignatureVerifier,
    ) -> ContenderResult<()> {
        if contender.sub_block_num != expected_slot {
            return Err(ContenderError::IndexMismatch {
                expected: expected_slot,
                actual: contender.sub_block_num,
            });
        }

        Self::validate_signature(contender, committee, verifier)?;

        if contender.prev_block_hash != *expected_prev_hash {
            return Err(ContenderError::BlockHashMismatch {
                claimed: hex::encode(&contender.prev_block_hash[..4]),
            });
        }

        if !contender.merkle_leaves.is_empty() {
            Self::validate_merkle_leaves(contender)?;
        }

        Ok(())
    }

    fn validate_signature(
        contender: &SubBlockContender,
        committee: &BTreeSet<PublicKey>,
        verifier: &dyn SignatureVerifier,
    ) -> ContenderResult<()> {
        let signed = contender
            .signed_message()
            .filter(|_| committee.contains(&contender.signer))
            .ok_or_else(|| ContenderError::invalid_signature(&contender.signer))?;

        if !verifier.verify(&contender.signer, signed, &contender.signature) {
            return Err(ContenderError::invalid_signature(&contender.signer));
        }
        Ok(())
    }

    /// Recompute the tree and compare leaf by leaf. An empty slot's tree is
    /// built over its input hash.
    fn validate_merkle_leaves(contender: &SubBlockContender) -> ContenderResult<()> {
        let expected = if contender.transactions.is_empty() {
            merklize(&[contender.input_hash])
        } else {
            let leaves = contender
                .transactions
                .iter()
                .map(TransactionData::leaf_bytes)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ContenderError::MerkleLeafMismatch { index: 0 })?;
            merklize(&leaves)
        };

        if let Some(index) = expected
            .iter()
            .zip(&contender.merkle_leaves)
            .position(|(want, got)| want != got)
        {
            return Err(ContenderError::MerkleLeafMismatch { index });
        }
        if expected.len() != contender.merkle_leaves.len() {
            return Err(ContenderError::MerkleLeafMismatch {
                index: expected.len().min(contender.merkle_leaves.len()),
            });
        }
        Ok(())
    }

    /// Validate a full group: one contender per slot, all valid, all from
    /// one signer. A group is accepted or rejected as a unit.
    pub fn validate_group(
        contenders: &[SubBlockContender],
        slot_count: u32,
        expected_prev_hash: &Hash,
        committee: &BTreeSet<PublicKey>,
        verifier: &dyn SignatureVerifier,
    ) -> ContenderResult<PublicKey> {
        if contenders.len() != slot_count as usize {
            return Err(ContenderError::GroupSize {
                expected: slot_count as usize,
                actual: contenders.len(),
            });
        }

        for (slot, contender) in (0u32..).zip(contenders) {
            Self::validate(contender, slot, expected_prev_hash, committee, verifier)?;
        }

        let signer = contenders[0].signer;
        if contenders.iter().any(|c| c.signer != signer) {
            return Err(ContenderError::MixedSigners);
        }
        Ok(signer)
    }
}
