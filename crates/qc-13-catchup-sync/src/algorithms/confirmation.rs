//! # Confirmation Threshold
//!
//! How many matching peer replies make an answer trustworthy.

/// Confirmations needed given `peer_count` reachable peers.
///
/// Capped at `peer_count - 1` so one silent peer cannot stall discovery,
/// but never below one.
pub fn effective_confirmations(configured: usize, peer_count: usize) -> usize {
    configured.min(peer_count.saturating_sub(1)).max(1)
}
