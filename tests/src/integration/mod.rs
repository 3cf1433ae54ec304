//! # Integration Tests
//!
//! Several masternodes on one [`node_runtime::LocalTransport`], driven by a
//! fixed delegate committee.

pub mod catchup;
pub mod masternodes;
