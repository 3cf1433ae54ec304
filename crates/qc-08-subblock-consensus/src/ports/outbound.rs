//! Driven ports (Outbound dependencies)

use async_trait::async_trait;
use shared_types::{PublicKey, Signature, SubBlockContender};

/// Signature verification, treated as a black box.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool;
}

/// Source of the committee eligible to vote.
///
/// The returned set must stay stable for the duration of a round.
pub trait CommitteeRoster: Send + Sync {
    /// Current signers, in roster order.
    fn current_signers(&self) -> Vec<PublicKey>;
}

/// One delegate's submission: a contender per slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContenderGroup {
    /// Transport-level identity of the delegate that sent the group.
    pub sender: PublicKey,
    pub contenders: Vec<SubBlockContender>,
}

/// Subscription feed of decoded contender groups.
#[async_trait]
pub trait ContenderFeed: Send + Sync {
    /// Next group in arrival order, or `None` once the feed is closed.
    ///
    /// Must be cancel-safe: a dropped call loses no group.
    async fn next_group(&self) -> Option<ContenderGroup>;
}
