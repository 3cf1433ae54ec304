//! # Masternode Test Suite
//!
//! Cross-crate tests and shared fixtures.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── fixtures.rs     # Delegates, contender groups, local clusters
//! │   └── integration/    # Multi-masternode flows on one LocalTransport
//! └── benches/            # Canonical hashing, validation, vote tally
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests
//! cargo test -p qc-tests integration::catchup
//! cargo bench -p qc-tests
//! ```

pub mod fixtures;
pub mod integration;
