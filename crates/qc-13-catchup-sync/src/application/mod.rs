//! # Application Module
//!
//! Application services orchestrating the domain and outbound ports.

pub mod block_server;
pub mod service;

pub use block_server::BlockServer;
pub use service::{CatchupDependencies, CatchupService};
