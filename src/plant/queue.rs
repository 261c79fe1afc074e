//! Backwash queue: filters past their soft cap, oldest first.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::FilterId;

/// FIFO queue of filters awaiting backwash, de-duplicated by identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackwashQueue {
    entries: IndexSet<FilterId>,
}

impl BackwashQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless it is already waiting.
    ///
    /// Returns `true` if the filter was newly queued.
    pub fn enqueue(&mut self, id: FilterId) -> bool {
        self.entries.insert(id)
    }

    /// Remove and return the oldest entry.
    pub fn pop_front(&mut self) -> Option<FilterId> {
        self.entries.shift_remove_index(0)
    }

    /// Remove a specific entry, keeping the order of the rest.
    pub fn remove(&mut self, id: FilterId) -> bool {
        self.entries.shift_remove(&id)
    }

    /// Oldest entry, if any.
    #[must_use]
    pub fn front(&self) -> Option<FilterId> {
        self.entries.first().copied()
    }

    /// Whether `id` is waiting.
    #[must_use]
    pub fn contains(&self, id: FilterId) -> bool {
        self.entries.contains(&id)
    }

    /// Number of waiting filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Waiting filters, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = FilterId> + '_ {
        self.entries.iter().copied()
    }
}
