//! # Catch-up Configuration
//!
//! Configuration for the Catch-up service.

use crate::domain::DEFAULT_CONFIRMATIONS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Catch-up configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatchupConfig {
    /// Matching height replies required before a height is trusted.
    /// Capped at the number of peers minus one.
    pub confirmations: usize,

    /// Deadline for collecting height replies, in milliseconds.
    pub discovery_timeout_ms: u64,

    /// Timeout for a single peer request, in milliseconds.
    pub request_timeout_ms: u64,

    /// Deadline for fetching one block from all peers, in milliseconds.
    pub fetch_timeout_ms: u64,
}

impl Default for CatchupConfig {
    fn default() -> Self {
        Self {
            confirmations: DEFAULT_CONFIRMATIONS,
            discovery_timeout_ms: 3_000,
            request_timeout_ms: 3_000,
            fetch_timeout_ms: 10_000,
        }
    }
}

impl CatchupConfig {
    /// Create a config for testing (short deadlines).
    pub fn for_testing() -> Self {
        Self {
            confirmations: DEFAULT_CONFIRMATIONS,
            discovery_timeout_ms: 200,
            request_timeout_ms: 100,
            fetch_timeout_ms: 300,
        }
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Reject settings that can never confirm anything.
    pub fn validate(&self) -> Result<(), String> {
        if self.confirmations == 0 {
            return Err("confirmations must be at least 1".to_string());
        }
        if self.discovery_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err("discovery and request timeouts must be non-zero".to_string());
        }
        if self.fetch_timeout_ms < self.request_timeout_ms {
            return Err(format!(
                "fetch timeout {}ms is shorter than request timeout {}ms",
                self.fetch_timeout_ms, self.request_timeout_ms
            ));
        }
        Ok(())
    }
}
