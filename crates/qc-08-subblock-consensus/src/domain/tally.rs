//! # Vote Tally
//!
//! Accumulates validated contenders for one round.
//!
//! Votes are counted per `input_hash`, then per result hash (merkle leaf 0).
//! A slot is decided the moment either:
//!
//! - some result hash reaches the quorum (**agreed**), or
//! - `votes_remaining + top_votes < quorum` for the slot's input hash, so no
//!   result can ever reach it (**impossible**).
//!
//! A decision is never revised. Sub-blocks are materialized from the
//! decisions when the round concludes, so signatures that arrive after a
//! slot was agreed still land in its signature set.

use shared_types::{Hash, SubBlock, SubBlockContender, SubBlockSignature};
use std::collections::{BTreeMap, HashMap};

/// Votes collected for one result hash.
#[derive(Debug, Default)]
struct ResultVotes {
    contenders: Vec<SubBlockContender>,
}

impl ResultVotes {
    fn count(&self) -> usize {
        self.contenders.len()
    }

    fn to_sub_block(&self) -> Option<SubBlock> {
        // All members share one merkle root, so any representative will do.
        let representative = self.contenders.first()?;
        let signatures = self
            .contenders
            .iter()
            .map(|c| SubBlockSignature {
                signer: c.signer,
                signature: c.signature,
            })
            .collect();
        Some(SubBlock::from_contender(representative, signatures))
    }
}

/// Votes collected for one input hash.
#[derive(Debug)]
struct InputVotes {
    sub_block_num: u32,
    votes_remaining: usize,
    top_votes: usize,
    by_result: HashMap<Hash, ResultVotes>,
}

impl InputVotes {
    /// Leading result: most votes, ties broken by the smaller hash.
    fn leader(&self) -> Option<(&Hash, &ResultVotes)> {
        self.by_result
            .iter()
            .max_by(|a, b| a.1.count().cmp(&b.1.count()).then_with(|| b.0.cmp(a.0)))
    }
}

/// Final state of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDecision {
    Agreed { input_hash: Hash, result_hash: Hash },
    Impossible,
}

/// Per-round vote accumulator. Owned by one round and dropped with it.
#[derive(Debug)]
pub struct VoteTally {
    committee_size: usize,
    quorum: usize,
    votes: HashMap<Hash, InputVotes>,
    decided: BTreeMap<u32, SlotDecision>,
}

impl VoteTally {
    pub fn new(committee_size: usize, quorum: usize) -> Self {
        Self {
            committee_size,
            quorum,
            votes: HashMap::new(),
            decided: BTreeMap::new(),
        }
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    /// Fold a validated contender group into the tally.
    pub fn add_contenders(&mut self, contenders: Vec<SubBlockContender>) {
        for contender in contenders {
            self.add_contender(contender);
        }
    }

    fn add_contender(&mut self, contender: SubBlockContender) {
        let slot = contender.sub_block_num;
        let input_hash = contender.input_hash;
        let result_hash = contender.result_hash();
        let committee_size = self.committee_size;

        let entry = self.votes.entry(input_hash).or_insert_with(|| InputVotes {
            sub_block_num: slot,
            votes_remaining: committee_size,
            top_votes: 0,
            by_result: HashMap::new(),
        });

        entry.votes_remaining = entry.votes_remaining.saturating_sub(1);
        let result = entry.by_result.entry(result_hash).or_default();
        result.contenders.push(contender);
        let count = result.count();
        entry.top_votes = entry.top_votes.max(count);

        if self.decided.contains_key(&slot) {
            return;
        }

        if count >= self.quorum {
            tracing::debug!(
                "[qc-08] Slot {} agreed on {} with {} votes",
                slot,
                hex::encode(&result_hash[..4]),
                count
            );
            self.decided.insert(
                slot,
                SlotDecision::Agreed {
                    input_hash,
                    result_hash,
                },
            );
        } else if entry.votes_remaining + entry.top_votes < self.quorum {
            tracing::debug!(
                "[qc-08] Slot {} cannot reach quorum ({} remaining, top {})",
                slot,
                entry.votes_remaining,
                entry.top_votes
            );
            self.decided.insert(slot, SlotDecision::Impossible);
        }
    }

    pub fn decision(&self, slot: u32) -> Option<SlotDecision> {
        self.decided.get(&slot).copied()
    }

    /// True once every slot in `0..slot_count` is decided either way.
    pub fn is_finalized(&self, slot_count: u32) -> bool {
        (0..slot_count).all(|slot| self.decided.contains_key(&slot))
    }

    /// True if any slot was decided impossible.
    pub fn has_impossible(&self) -> bool {
        self.decided
            .values()
            .any(|d| matches!(d, SlotDecision::Impossible))
    }

    /// Sub-blocks for every agreed slot, `None` elsewhere.
    pub fn resolved_slots(&self, slot_count: u32) -> Vec<Option<SubBlock>> {
        (0..slot_count)
            .map(|slot| match self.decided.get(&slot)? {
                SlotDecision::Agreed {
                    input_hash,
                    result_hash,
                } => self.votes.get(input_hash)?.by_result.get(result_hash)?.to_sub_block(),
                SlotDecision::Impossible => None,
            })
            .collect()
    }

    /// Highest vote count behind any result for `slot`.
    fn slot_top_votes(&self, slot: u32) -> usize {
        self.votes
            .values()
            .filter(|v| v.sub_block_num == slot)
            .map(|v| v.top_votes)
            .max()
            .unwrap_or(0)
    }

    /// Quorum every slot has reached so far: the weakest slot's leading
    /// vote count.
    pub fn quorum_reached(&self, slot_count: u32) -> usize {
        (0..slot_count)
            .map(|slot| self.slot_top_votes(slot))
            .min()
            .unwrap_or(0)
    }

    /// Sub-blocks built from each slot's current leader, keeping agreed
    /// slots as decided. Used when a timed-out round is accepted with a
    /// reduced quorum.
    pub fn leading_slots(&self, slot_count: u32) -> Vec<Option<SubBlock>> {
        let resolved = self.resolved_slots(slot_count);
        resolved
            .into_iter()
            .zip(0..slot_count)
            .map(|(decided, slot)| {
                decided.or_else(|| {
                    self.votes
                        .iter()
                        .filter(|(_, v)| v.sub_block_num == slot)
                        .filter_map(|(input, v)| v.leader().map(|(h, r)| (input, h, r)))
                        .max_by(|a, b| {
                            a.2.count()
                                .cmp(&b.2.count())
                                .then_with(|| (b.0, b.1).cmp(&(a.0, a.1)))
                        })
                        .and_then(|(_, _, votes)| votes.to_sub_block())
                })
            })
            .collect()
    }
}
