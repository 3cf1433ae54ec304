//! Domain layer for the aggregation subsystem
//!
//! - config: quorum ratio, slot count, round deadline
//! - tally: per-round vote accumulation and slot decisions
//! - round: quorum adaptation and round classification

mod config;
mod error;
mod round;
mod tally;

pub use config::*;
pub use error::*;
pub use round::*;
pub use tally::*;
