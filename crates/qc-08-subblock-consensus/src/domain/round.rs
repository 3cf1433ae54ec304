//! Per-round quorum state and round classification

use super::AggregatorConfig;
use shared_types::Block;
use std::fmt;

/// Classification of a concluded round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// At least one slot carries transactions.
    New,
    /// Every slot agreed on an empty result.
    Skip,
    /// Quorum was impossible or the deadline passed without enough votes.
    Fail,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Skip => "skip",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `gather_round` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    pub block: Block,
    pub kind: BlockKind,
    /// Quorum in effect when the round concluded (lower than configured if
    /// it was adapted on timeout).
    pub quorum: usize,
}

/// Quorum bookkeeping for the block currently being gathered.
///
/// Built fresh for every round and dropped when the round concludes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRound {
    pub current_quorum: usize,
    pub min_quorum: usize,
    pub max_quorum: usize,
    /// Set once the first contender group of the round arrives.
    pub started: bool,
}

impl PendingRound {
    pub fn new(config: &AggregatorConfig, committee_size: usize) -> Self {
        Self {
            current_quorum: config.quorum_for(committee_size),
            min_quorum: config.min_quorum.unwrap_or(1),
            max_quorum: committee_size,
            started: false,
        }
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    /// Whether a timed-out round that reached `reached` votes may still be
    /// accepted with a reduced quorum.
    pub fn can_adjust_quorum(&self, reached: usize) -> bool {
        reached >= self.min_quorum && reached >= 9 * self.current_quorum / 10
    }

    /// Lower the quorum to `reached`, bounded by the floor and ceiling.
    pub fn adjust_quorum(&mut self, reached: usize) {
        self.current_quorum = reached.clamp(self.min_quorum, self.max_quorum.max(self.min_quorum));
    }
}
