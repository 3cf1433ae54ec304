//! # Aggregation Metrics
//!
//! Prometheus metrics for monitoring round outcomes.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-08-subblock-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `aggregation_rounds_total` - Counter of concluded rounds (by kind)
//! - `aggregation_contenders_rejected_total` - Counter of rejected groups (by reason)
//! - `aggregation_round_latency_seconds` - Histogram of first-contender-to-block times

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_counter_vec, register_histogram, CounterVec, Histogram};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Concluded rounds, labeled by block kind
    pub static ref ROUNDS: CounterVec = register_counter_vec!(
        "aggregation_rounds_total",
        "Total number of concluded aggregation rounds",
        &["kind"]
    )
    .expect("Failed to create ROUNDS metric");

    /// Rejected contender groups, labeled by rejection reason
    pub static ref CONTENDERS_REJECTED: CounterVec = register_counter_vec!(
        "aggregation_contenders_rejected_total",
        "Total number of contender groups rejected",
        &["reason"]
    )
    .expect("Failed to create CONTENDERS_REJECTED metric");

    /// Histogram of round latency
    pub static ref ROUND_LATENCY: Histogram = register_histogram!(
        "aggregation_round_latency_seconds",
        "Time from first contender to block in seconds",
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("Failed to create ROUND_LATENCY metric");
}

/// Record a concluded round
#[cfg(feature = "metrics")]
pub fn record_round(kind: &str) {
    ROUNDS.with_label_values(&[kind]).inc();
}

/// Record a rejected contender group with reason
#[cfg(feature = "metrics")]
pub fn record_contender_rejected(reason: &str) {
    CONTENDERS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record round latency
#[cfg(feature = "metrics")]
pub fn record_round_latency(seconds: f64) {
    ROUND_LATENCY.observe(seconds);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_round(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_contender_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_round_latency(_seconds: f64) {}
