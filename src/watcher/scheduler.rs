//! Per-resource settle deadlines.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::time::Instant;

/// Tracks one pending deadline per key.
///
/// Every touch pushes the key's deadline out to `now + quiet`, so a key is
/// only due once it has gone a full quiet period without being touched.
#[derive(Debug)]
pub struct DeadlineScheduler<K> {
    deadlines: BTreeMap<K, Instant>,
}

impl<K: Ord + Copy> Default for DeadlineScheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy> DeadlineScheduler<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            deadlines: BTreeMap::new(),
        }
    }

    /// Reset the key's deadline.
    pub fn touch(&mut self, key: K, quiet: Duration, now: Instant) {
        self.deadlines.insert(key, now + quiet);
    }

    /// Forget a pending deadline.
    pub fn cancel(&mut self, key: K) -> bool {
        self.deadlines.remove(&key).is_some()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every key whose deadline is at or before `now`, in key order.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| *key)
            .collect();
        for key in &due {
            self.deadlines.remove(key);
        }
        due
    }

    #[must_use]
    pub fn is_pending(&self, key: K) -> bool {
        self.deadlines.contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
