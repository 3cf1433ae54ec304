//! # Shared Types Crate
//!
//! Data model shared by the aggregation (qc-08) and catch-up (qc-13)
//! subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: contenders, sub-blocks and blocks are defined
//!   once here and travel unchanged between subsystems.
//! - **One Block Identity**: every component that needs a block hash goes
//!   through [`CanonicalHasher`], so aggregation and catch-up always agree.
//! - **Decode Once**: wire payloads become a [`NodeMessage`] at the transport
//!   boundary and are matched exhaustively afterwards.

pub mod canonical;
pub mod entities;
pub mod errors;
pub mod ipc;
pub mod merkle;
pub mod shutdown;
pub mod storage;
pub mod wallet;

pub use canonical::{CanonicalHasher, FAILED_BLOCK_HASH, GENESIS_BLOCK_NUM, GENESIS_HASH};
pub use entities::*;
pub use errors::*;
pub use ipc::{InboundMessage, NodeMessage};
pub use merkle::{merklize, sha3_256};
pub use shutdown::stop_requested;
pub use storage::{BlockStore, InMemoryBlockStore};
pub use wallet::{verify_signature, Wallet};
