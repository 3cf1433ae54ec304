//! Driving ports (Inbound API)

use crate::domain::{AggregationResult, RoundOutcome};
use async_trait::async_trait;

/// Primary aggregation API
#[async_trait]
pub trait BlockAggregationApi: Send + Sync {
    /// Gather one round of contenders and produce exactly one block.
    ///
    /// Waits for the first contender group, then folds groups until every
    /// slot is decided or the round deadline passes. A round that cannot
    /// reach quorum still yields a (failed) block.
    async fn gather_round(&self) -> AggregationResult<RoundOutcome>;
}
