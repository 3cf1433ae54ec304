//! Adapters layer (Hexagonal Architecture)

mod committee;
mod feed;
mod verifier;

pub use committee::*;
pub use feed::*;
pub use verifier::*;
