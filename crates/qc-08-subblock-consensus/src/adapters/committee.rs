//! Fixed committee roster

use crate::ports::CommitteeRoster;
use parking_lot::RwLock;
use shared_types::PublicKey;

/// Committee held in memory, replaceable between rounds.
#[derive(Debug, Default)]
pub struct StaticCommittee {
    signers: RwLock<Vec<PublicKey>>,
}

impl StaticCommittee {
    pub fn new(signers: Vec<PublicKey>) -> Self {
        Self {
            signers: RwLock::new(signers),
        }
    }

    /// Replace the roster. Takes effect from the next round.
    pub fn set_signers(&self, signers: Vec<PublicKey>) {
        *self.signers.write() = signers;
    }
}

impl CommitteeRoster for StaticCommittee {
    fn current_signers(&self) -> Vec<PublicKey> {
        self.signers.read().clone()
    }
}
