//! # Event Handlers
//!
//! Loops that consume the broadcast bus and hand messages to a subsystem.

pub mod notifications;

pub use notifications::NotificationHandler;
