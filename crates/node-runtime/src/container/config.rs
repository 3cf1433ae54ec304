//! # Node Configuration
//!
//! Unified configuration for both subsystems and runtime parameters.
//!
//! Every field has a default; `QC_*` environment variables override them:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `QC_QUORUM_RATIO` | `aggregator.quorum_ratio` |
//! | `QC_SLOT_COUNT` | `aggregator.slot_count` |
//! | `QC_ROUND_TIMEOUT_MS` | `aggregator.round_timeout_ms` |
//! | `QC_MIN_QUORUM` | `aggregator.min_quorum` |
//! | `QC_CONFIRMATIONS` | `catchup.confirmations` |
//! | `QC_COMMITTEE` | `committee` (comma-separated hex public keys) |
//! | `QC_NODE_SEED` | `node_seed` (64 hex chars) |

use qc_08_subblock_consensus::AggregatorConfig;
use qc_13_catchup_sync::CatchupConfig;
use serde::{Deserialize, Serialize};
use shared_types::PublicKey;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Block aggregation (qc-08).
    pub aggregator: AggregatorConfig,
    /// Catch-up sync (qc-13).
    pub catchup: CatchupConfig,
    /// Delegates allowed to submit contenders.
    pub committee: Vec<PublicKey>,
    /// Seed of this node's identity key. Random when unset.
    pub node_seed: Option<[u8; 32]>,
    /// Pause between failed startup sync attempts, in milliseconds.
    pub sync_retry_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            aggregator: AggregatorConfig::default(),
            catchup: CatchupConfig::default(),
            committee: Vec::new(),
            node_seed: None,
            sync_retry_ms: 1_000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    /// No delegate keys configured.
    #[error("Committee is empty. Set QC_COMMITTEE to the delegates' public keys.")]
    EmptyCommittee,

    #[error("Aggregator config: {0}")]
    Aggregator(String),

    #[error("Catch-up config: {0}")]
    Catchup(String),
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup, starting from defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(ratio) = parse(&lookup, "QC_QUORUM_RATIO")? {
            config.aggregator.quorum_ratio = ratio;
        }
        if let Some(slots) = parse(&lookup, "QC_SLOT_COUNT")? {
            config.aggregator.slot_count = slots;
        }
        if let Some(timeout) = parse(&lookup, "QC_ROUND_TIMEOUT_MS")? {
            config.aggregator.round_timeout_ms = timeout;
        }
        if let Some(min_quorum) = parse(&lookup, "QC_MIN_QUORUM")? {
            config.aggregator.min_quorum = Some(min_quorum);
        }
        if let Some(confirmations) = parse(&lookup, "QC_CONFIRMATIONS")? {
            config.catchup.confirmations = confirmations;
        }
        if let Some(committee) = lookup("QC_COMMITTEE") {
            config.committee = committee
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(|key| decode_key("QC_COMMITTEE", key))
                .collect::<Result<_, _>>()?;
        }
        if let Some(seed) = lookup("QC_NODE_SEED") {
            config.node_seed = Some(decode_key("QC_NODE_SEED", seed.trim())?);
        }

        Ok(config)
    }

    /// Fail fast on settings the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.committee.is_empty() {
            return Err(ConfigError::EmptyCommittee);
        }
        self.aggregator.validate().map_err(ConfigError::Aggregator)?;
        self.catchup.validate().map_err(ConfigError::Catchup)?;
        Ok(())
    }

    pub fn sync_retry(&self) -> Duration {
        Duration::from_millis(self.sync_retry_ms)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value })
        })
        .transpose()
}

fn decode_key(key: &'static str, value: &str) -> Result<[u8; 32], ConfigError> {
    hex::decode(value)
        .ok()
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}
