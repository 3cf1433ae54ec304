//! # Algorithms Module
//!
//! Pure decision rules used by the catch-up service.

pub mod acceptance;
pub mod confirmation;

pub use acceptance::{classify_block, BlockVerdict};
pub use confirmation::effective_confirmations;
