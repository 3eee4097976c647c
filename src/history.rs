//! Bounded history of recent readings for trend display.

use std::collections::VecDeque;

use crate::snapshot::HistoryEntry;

/// Default number of readings retained for the dashboard trend graph.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// A fixed-capacity ring of timestamped readings.
///
/// Strict FIFO: once at capacity, pushing a new entry evicts the oldest.
/// Entries only leave through eviction or a full [`clear`](Self::clear).
/// The ring is owned by the acquisition task; readers only ever see its
/// contents through published snapshots, so no partial state is observable.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryRing {
    /// Create an empty ring with the given capacity.
    ///
    /// A capacity of zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest if at capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current contents, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries the ring retains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
