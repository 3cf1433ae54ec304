//! Block Aggregator - round state machine
//!
//! ```text
//! WAITING_FIRST_CONTENDER ──first valid group──→ GATHERING ──┬─ every slot agreed ──→ NEW / SKIP
//!                                                            ├─ a slot impossible ──→ FAIL
//!                                                            └─ deadline ──→ NEW (reduced quorum) / FAIL
//! ```
//!
//! Each call to `gather_round` owns a fresh `PendingRound` and `VoteTally`
//! and produces exactly one block, so the chain advances by one per round.

use crate::domain::{
    AggregationError, AggregationResult, AggregatorConfig, BlockKind, ContenderError,
    PendingRound, RoundOutcome, VoteTally,
};
use crate::metrics;
use crate::ports::{
    BlockAggregationApi, CommitteeRoster, ContenderFeed, ContenderGroup, SignatureVerifier,
};
use crate::validation::ContenderValidator;
use async_trait::async_trait;
use shared_types::{
    stop_requested, Block, BlockStore, CanonicalHasher, Hash, PublicKey, SubBlock,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Block Aggregator
pub struct BlockAggregator<F, S, R, B>
where
    F: ContenderFeed,
    S: SignatureVerifier,
    R: CommitteeRoster,
    B: BlockStore,
{
    feed: Arc<F>,
    verifier: Arc<S>,
    roster: Arc<R>,
    store: Arc<B>,
    config: AggregatorConfig,
    stop: watch::Receiver<bool>,
}

/// Dependencies for BlockAggregator
pub struct AggregatorDependencies<F, S, R, B> {
    pub feed: Arc<F>,
    pub verifier: Arc<S>,
    pub roster: Arc<R>,
    /// Read-only here: the round builds on the stored tip.
    pub store: Arc<B>,
    pub config: AggregatorConfig,
}

/// Fixed inputs of one round.
struct RoundContext {
    committee: BTreeSet<PublicKey>,
    prev_hash: Hash,
    block_num: u64,
}

impl<F, S, R, B> BlockAggregator<F, S, R, B>
where
    F: ContenderFeed,
    S: SignatureVerifier,
    R: CommitteeRoster,
    B: BlockStore,
{
    pub fn new(deps: AggregatorDependencies<F, S, R, B>) -> Self {
        // Sender dropped immediately: never stops unless replaced.
        let (_, stop) = watch::channel(false);
        Self {
            feed: deps.feed,
            verifier: deps.verifier,
            roster: deps.roster,
            store: deps.store,
            config: deps.config,
            stop,
        }
    }

    /// Install a cooperative stop signal, checked at every suspension point.
    pub fn with_stop(mut self, stop: watch::Receiver<bool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    fn round_context(&self) -> AggregationResult<RoundContext> {
        let committee: BTreeSet<PublicKey> = self.roster.current_signers().into_iter().collect();
        if committee.is_empty() {
            return Err(AggregationError::EmptyCommittee);
        }
        Ok(RoundContext {
            committee,
            prev_hash: self.store.latest_hash(),
            block_num: self.store.latest_height() + 1,
        })
    }

    /// Validate a group and enforce one group per signer per round.
    fn admit(
        &self,
        ctx: &RoundContext,
        voted: &mut HashSet<PublicKey>,
        group: &ContenderGroup,
    ) -> Result<(), ContenderError> {
        let signer = ContenderValidator::validate_group(
            &group.contenders,
            self.config.slot_count,
            &ctx.prev_hash,
            &ctx.committee,
            self.verifier.as_ref(),
        )?;
        if !voted.insert(signer) {
            return Err(ContenderError::duplicate_vote(&signer));
        }
        Ok(())
    }

    fn reject(&self, group: &ContenderGroup, e: &ContenderError) {
        warn!(
            "[qc-08] Rejected contender group from {}: {}",
            hex::encode(&group.sender[..4]),
            e
        );
        metrics::record_contender_rejected(e.reason());
    }

    /// Count an admitted group and report a classification if the round is
    /// decided.
    fn tally_group(&self, tally: &mut VoteTally, group: ContenderGroup) -> Option<BlockKind> {
        debug!(
            "[qc-08] Folding contender group from {}",
            hex::encode(&group.sender[..4])
        );
        tally.add_contenders(group.contenders);

        if tally.has_impossible() {
            return Some(BlockKind::Fail);
        }
        if tally.is_finalized(self.config.slot_count) {
            let slots = tally.resolved_slots(self.config.slot_count);
            let all_empty = slots.iter().flatten().all(SubBlock::is_empty);
            return Some(if all_empty {
                BlockKind::Skip
            } else {
                BlockKind::New
            });
        }
        None
    }

    fn conclude(
        &self,
        ctx: &RoundContext,
        mut kind: BlockKind,
        slots: Vec<Option<SubBlock>>,
        round: &PendingRound,
        started: Instant,
    ) -> AggregationResult<RoundOutcome> {
        let block = match kind {
            BlockKind::Fail => Block::failed(ctx.prev_hash, ctx.block_num),
            BlockKind::New | BlockKind::Skip => {
                let block =
                    CanonicalHasher::block_from_sub_blocks(slots, ctx.prev_hash, ctx.block_num)?;
                if block.is_failed() {
                    kind = BlockKind::Fail;
                } else if !CanonicalHasher::verify(
                    &block.sub_blocks,
                    &ctx.prev_hash,
                    &block.block_hash,
                ) {
                    return Err(AggregationError::SelfCheckFailed {
                        block_num: ctx.block_num,
                    });
                }
                block
            }
        };

        metrics::record_round(kind.as_str());
        metrics::record_round_latency(started.elapsed().as_secs_f64());
        info!(
            "[qc-08] Block {} concluded as {} (quorum {}, hash {})",
            block.block_num,
            kind,
            round.current_quorum,
            hex::encode(&block.block_hash[..8])
        );

        Ok(RoundOutcome {
            block,
            kind,
            quorum: round.current_quorum,
        })
    }

    /// Deadline passed while gathering: accept a reduced quorum if it is
    /// close enough, otherwise fail the block.
    fn conclude_timed_out(
        &self,
        ctx: &RoundContext,
        tally: &VoteTally,
        round: &mut PendingRound,
        started: Instant,
    ) -> AggregationResult<RoundOutcome> {
        let slot_count = self.config.slot_count;
        let reached = tally.quorum_reached(slot_count);

        if !tally.has_impossible() && round.can_adjust_quorum(reached) {
            info!(
                "[qc-08] Round timed out; adapting quorum {} -> {}",
                round.current_quorum, reached
            );
            round.adjust_quorum(reached);
            let slots = tally.leading_slots(slot_count);
            return self.conclude(ctx, BlockKind::New, slots, round, started);
        }

        warn!(
            "[qc-08] Round timed out with quorum {} of {}",
            reached, round.current_quorum
        );
        self.conclude(ctx, BlockKind::Fail, Vec::new(), round, started)
    }
}

#[async_trait]
impl<F, S, R, B> BlockAggregationApi for BlockAggregator<F, S, R, B>
where
    F: ContenderFeed,
    S: SignatureVerifier,
    R: CommitteeRoster,
    B: BlockStore,
{
    async fn gather_round(&self) -> AggregationResult<RoundOutcome> {
        // Fail fast on an empty committee instead of waiting for contenders.
        self.round_context()?;
        let mut stop = self.stop.clone();
        let mut voted = HashSet::new();

        // WAITING_FIRST_CONTENDER: rejected groups leave the clock unstarted.
        let (ctx, first) = loop {
            let group = tokio::select! {
                group = self.feed.next_group() => group.ok_or(AggregationError::FeedClosed)?,
                _ = stop_requested(&mut stop) => return Err(AggregationError::Stopped),
            };
            // The tip may have moved while idle (a peer's block was committed).
            let ctx = self.round_context()?;
            match self.admit(&ctx, &mut voted, &group) {
                Ok(()) => break (ctx, group),
                Err(e) => self.reject(&group, &e),
            }
        };

        let mut round = PendingRound::new(&self.config, ctx.committee.len());
        let mut tally = VoteTally::new(ctx.committee.len(), round.current_quorum);

        // GATHERING
        round.start();
        let started = Instant::now();
        let deadline = started + self.config.round_timeout();
        info!(
            "[qc-08] Gathering block {} (committee {}, quorum {})",
            ctx.block_num,
            ctx.committee.len(),
            round.current_quorum
        );

        let mut decided = self.tally_group(&mut tally, first);
        loop {
            if let Some(kind) = decided {
                let slots = tally.resolved_slots(self.config.slot_count);
                return self.conclude(&ctx, kind, slots, &round, started);
            }
            if Instant::now() >= deadline {
                return self.conclude_timed_out(&ctx, &tally, &mut round, started);
            }

            let group = tokio::select! {
                received = timeout_at(deadline, self.feed.next_group()) => match received {
                    Ok(Some(group)) => group,
                    Ok(None) => return Err(AggregationError::FeedClosed),
                    Err(_) => {
                        return self.conclude_timed_out(&ctx, &tally, &mut round, started);
                    }
                },
                _ = stop_requested(&mut stop) => return Err(AggregationError::Stopped),
            };

            decided = match self.admit(&ctx, &mut voted, &group) {
                Ok(()) => self.tally_group(&mut tally, group),
                Err(e) => {
                    self.reject(&group, &e);
                    None
                }
            };
        }
    }
}

#[cfg(test)]
mod tests;
