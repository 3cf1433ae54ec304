//! # QC-13 Catch-up Sync
//!
//! Brings a masternode that fell behind back to the height its peers agree
//! on, trusting no single peer.
//!
//! **Subsystem ID:** 13
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Defenses
//!
//! | Defense | Description |
//! |---------|-------------|
//! | Confirmation counting | A height is trusted once several peers report it |
//! | Content reverification | Every fetched block is re-hashed on top of our tip |
//! | First honest reply wins | A lying or stale peer never blocks progress |
//! | Deferred notifications | Live blocks wait until the bulk fetch completes |
//!
//! ## Module Structure
//!
//! ```text
//! qc-13-catchup-sync/
//! ├── domain/          # ConfirmationTally, SyncError, SyncReport
//! ├── algorithms/      # Confirmation threshold, block acceptance rule
//! ├── ports/           # CatchupApi (inbound) + PeerNetwork, StateUpdater (outbound)
//! ├── application/     # CatchupService, BlockServer
//! ├── adapters/        # In-process peer network, in-memory state
//! └── config.rs        # CatchupConfig
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{InMemoryState, LocalPeerNetwork, ServerRegistry};
pub use algorithms::{classify_block, effective_confirmations, BlockVerdict};
pub use application::{BlockServer, CatchupDependencies, CatchupService};
pub use config::CatchupConfig;
pub use domain::{
    CatchupResult, ConfirmationTally, NotificationOutcome, SyncError, SyncReport,
    DEFAULT_CONFIRMATIONS,
};
pub use ports::{CatchupApi, MockPeer, MockPeerNetwork, PeerNetwork, StateUpdater};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
