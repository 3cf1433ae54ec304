//! # Runtime Adapters
//!
//! Transport-side implementations used by the single-process runtime.

pub mod broadcast;

pub use broadcast::{
    BroadcastError, Broadcaster, Envelope, LocalBroadcast, BLOCK_NOTIFICATION_TOPIC,
};
