//! # qc-08-subblock-consensus
//!
//! Sub-block aggregation subsystem for a fixed masternode committee.
//!
//! ## Architecture
//!
//! Delegates execute work in parallel slots and each submits one signed
//! contender per slot. The aggregator admits contender groups, counts votes
//! per slot and turns the agreed slots into exactly one block per round:
//!
//! ```text
//! [ContenderFeed] ──group──→ ContenderValidator ──ok──→ VoteTally
//!                                                          │
//!                          BlockAggregator ←──decisions────┘
//!                                │
//!                                └──→ CanonicalHasher ──→ Block (NEW / SKIP / FAIL)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_08_subblock_consensus::{AggregatorDependencies, BlockAggregator, BlockAggregationApi};
//!
//! let aggregator = BlockAggregator::new(AggregatorDependencies {
//!     feed,
//!     verifier,
//!     roster,
//!     store,
//!     config: AggregatorConfig::default(),
//! })
//! .with_stop(stop_rx);
//!
//! let outcome = aggregator.gather_round().await?;
//! ```
//!
//! ## Guarantees
//!
//! - A group is admitted whole or not at all
//! - One group per committee member per round
//! - Slot decisions are final once made
//! - Rounds never overlap; each yields one block, failed or not

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod validation;

// Re-export main types
pub use adapters::{
    contender_channel, ChannelContenderFeed, ContenderSender, Ed25519Verifier, StaticCommittee,
};
pub use domain::{
    AggregationError, AggregationResult, AggregatorConfig, BlockKind, ContenderError,
    ContenderResult, PendingRound, RoundOutcome, SlotDecision, VoteTally,
};
pub use ports::{
    BlockAggregationApi, CommitteeRoster, ContenderFeed, ContenderGroup, SignatureVerifier,
};
pub use service::{AggregatorDependencies, BlockAggregator};
pub use validation::ContenderValidator;
