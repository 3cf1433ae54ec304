//! Aggregator configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default fraction of the committee that must agree on a slot.
pub const DEFAULT_QUORUM_RATIO: f64 = 0.66;

/// Default number of sub-block slots per block.
pub const DEFAULT_SLOT_COUNT: u32 = 4;

/// Default round deadline (milliseconds).
pub const DEFAULT_ROUND_TIMEOUT_MS: u64 = 60_000;

/// Block aggregation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Fraction of the committee needed to finalize a slot, in (0, 1].
    pub quorum_ratio: f64,
    /// Sub-block slots per block.
    pub slot_count: u32,
    /// Wall-clock deadline per round, counted from the first contender.
    pub round_timeout_ms: u64,
    /// Hard floor the quorum may be adapted down to on timeout.
    /// When unset, only the 90% rule applies.
    pub min_quorum: Option<usize>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            quorum_ratio: DEFAULT_QUORUM_RATIO,
            slot_count: DEFAULT_SLOT_COUNT,
            round_timeout_ms: DEFAULT_ROUND_TIMEOUT_MS,
            min_quorum: None,
        }
    }
}

impl AggregatorConfig {
    /// Create a config for testing (short deadline).
    pub fn for_testing() -> Self {
        Self {
            round_timeout_ms: 500,
            ..Self::default()
        }
    }

    pub fn round_timeout(&self) -> Duration {
        Duration::from_millis(self.round_timeout_ms)
    }

    /// Votes needed out of `committee_size`: `ceil(committee_size * ratio)`,
    /// never below one and never above the committee.
    pub fn quorum_for(&self, committee_size: usize) -> usize {
        let raw = (committee_size as f64 * self.quorum_ratio).ceil() as usize;
        raw.clamp(1, committee_size.max(1))
    }

    /// Reject configurations that can never finalize a block.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.quorum_ratio > 0.0 && self.quorum_ratio <= 1.0) {
            return Err(format!(
                "quorum_ratio must be in (0, 1], got {}",
                self.quorum_ratio
            ));
        }
        if self.slot_count == 0 {
            return Err("slot_count must be at least 1".to_string());
        }
        if self.round_timeout_ms == 0 {
            return Err("round_timeout_ms must be positive".to_string());
        }
        if self.min_quorum == Some(0) {
            return Err("min_quorum must be at least 1 when set".to_string());
        }
        Ok(())
    }
}
