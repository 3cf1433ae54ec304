//! # Masternode Container
//!
//! Builds one masternode's subsystems around a single block store and wires
//! them to the shared in-process transport.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, NodeConfig};
pub use subsystems::{
    LocalTransport, MasternodeContainer, NodeAggregator, NodeCatchup, NodeStore,
};
