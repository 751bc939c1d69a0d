//! Main and fast queues of the async buffer

use super::buffered_entry::BufferedEntry;
use super::structured_entry::StructuredLogEntry;
use std::collections::VecDeque;
use std::sync::Arc;

/// Slots reserved for simple entries
pub const FAST_QUEUE_CAPACITY: usize = 1000;
/// Fast-queue length above which a flush is started
pub const FAST_FLUSH_THRESHOLD: usize = 800;

/// Priority-ordered queue
///
/// Sorted by ascending priority; equal priorities keep insertion order.
/// Flushes and evictions take from the front.
#[derive(Debug, Default)]
pub(crate) struct MainQueue {
    entries: VecDeque<BufferedEntry>,
}

impl MainQueue {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert after the last entry whose priority is not greater
    pub fn insert(&mut self, entry: BufferedEntry) {
        let pos = self
            .entries
            .iter()
            .rposition(|e| e.priority <= entry.priority)
            .map_or(0, |i| i + 1);
        self.entries.insert(pos, entry);
    }

    /// Bypass ordering; used for retries and final drains
    pub fn push_front(&mut self, entry: BufferedEntry) {
        self.entries.push_front(entry);
    }

    pub fn take_front(&mut self, n: usize) -> Vec<BufferedEntry> {
        let n = n.min(self.entries.len());
        self.entries.drain(..n).collect()
    }

    pub fn evict_front(&mut self) -> Option<BufferedEntry> {
        self.entries.pop_front()
    }

    /// Remove every entry with priority below `priority`
    pub fn drain_below(&mut self, priority: u32) -> Vec<BufferedEntry> {
        let mut removed = Vec::new();
        self.entries.retain(|e| {
            if e.priority < priority {
                removed.push(e.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn has_priority_at_least(&self, priority: u32) -> bool {
        self.entries.iter().any(|e| e.priority >= priority)
    }

    pub fn drain_all(&mut self) -> Vec<BufferedEntry> {
        self.entries.drain(..).collect()
    }

    #[cfg(test)]
    pub fn seqs(&self) -> Vec<u64> {
        self.entries.iter().map(|e| e.seq).collect()
    }
}

/// Pre-sized slot vector for simple entries
#[derive(Debug)]
pub(crate) struct FastQueue {
    slots: Vec<Arc<StructuredLogEntry>>,
}

impl Default for FastQueue {
    fn default() -> Self {
        Self {
            slots: Vec::with_capacity(FAST_QUEUE_CAPACITY),
        }
    }
}

impl FastQueue {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn has_room(&self) -> bool {
        self.slots.len() < FAST_QUEUE_CAPACITY
    }

    /// Caller checks [`has_room`](Self::has_room) first
    pub fn push(&mut self, entry: Arc<StructuredLogEntry>) {
        self.slots.push(entry);
    }

    pub fn needs_flush(&self) -> bool {
        self.slots.len() > FAST_FLUSH_THRESHOLD
    }

    /// Empty the slots, keeping their allocation
    pub fn take_all(&mut self) -> Vec<Arc<StructuredLogEntry>> {
        self.slots.drain(..).collect()
    }
}
