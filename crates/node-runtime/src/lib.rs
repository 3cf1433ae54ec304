//! # Node Runtime Library
//!
//! Wires block aggregation (qc-08) and catch-up sync (qc-13) into a
//! masternode. The `main.rs` binary runs a single node; integration tests
//! run several on one [`LocalTransport`].
//!
//! ## Module Structure
//!
//! - `container/` - Configuration and subsystem wiring
//! - `adapters/` - Notification broadcast over the in-process bus
//! - `handlers/` - Bus consumers
//! - `runtime` - Round loop, startup sync and shutdown

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod runtime;

pub use adapters::{Broadcaster, Envelope, LocalBroadcast, BLOCK_NOTIFICATION_TOPIC};
pub use container::{ConfigError, LocalTransport, MasternodeContainer, NodeConfig};
pub use handlers::NotificationHandler;
pub use runtime::{Masternode, NodeError, NodeRuntime, RuntimeHandles};
