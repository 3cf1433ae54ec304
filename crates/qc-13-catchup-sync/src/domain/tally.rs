//! Confirmation counting over peer replies.

use std::collections::BTreeMap;

/// Counts how many peers asserted each value.
///
/// Lives for one discovery or fetch round and is then dropped.
#[derive(Clone, Debug)]
pub struct ConfirmationTally<T: Ord> {
    counts: BTreeMap<T, usize>,
    replies: usize,
}

impl<T: Ord> Default for ConfirmationTally<T> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
            replies: 0,
        }
    }
}

impl<T: Ord + Clone> ConfirmationTally<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one peer's answer and return its new count.
    pub fn add(&mut self, value: T) -> usize {
        self.replies += 1;
        let count = self.counts.entry(value).or_insert(0);
        *count += 1;
        *count
    }

    /// The most asserted value. Ties go to the larger value.
    pub fn top_item(&self) -> Option<&T> {
        self.leader().map(|(value, _)| value)
    }

    pub fn top_count(&self) -> usize {
        self.leader().map_or(0, |(_, count)| count)
    }

    /// Total replies recorded.
    pub fn replies(&self) -> usize {
        self.replies
    }

    /// The leading value once it has at least `threshold` confirmations.
    pub fn confirmed(&self, threshold: usize) -> Option<T> {
        self.leader()
            .filter(|(_, count)| *count >= threshold)
            .map(|(value, _)| value.clone())
    }

    fn leader(&self) -> Option<(&T, usize)> {
        // Iteration is ascending, so max_by_key keeps the last (largest) tie.
        self.counts
            .iter()
            .map(|(value, count)| (value, *count))
            .max_by_key(|(_, count)| *count)
    }
}
