//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements outbound port traits for catch-up.

mod local_network;
mod state;

pub use local_network::{LocalPeerNetwork, ServerRegistry};
pub use state::InMemoryState;
