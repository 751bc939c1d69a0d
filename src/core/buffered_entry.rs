//! Engine-side wrapper around a queued entry

use super::structured_entry::StructuredLogEntry;
use std::sync::Arc;
use std::time::Instant;

/// A log entry while it is owned by the buffer
#[derive(Debug, Clone)]
pub(crate) struct BufferedEntry {
    /// `log-{seq}`, unique per buffer
    pub id: String,
    pub seq: u64,
    pub entry: Arc<StructuredLogEntry>,
    pub enqueue_time: Instant,
    pub priority: u32,
    pub retry_count: u32,
    /// Cached estimate, credited back when the entry leaves
    pub size: usize,
}

impl BufferedEntry {
    pub fn new(seq: u64, entry: Arc<StructuredLogEntry>, priority: u32) -> Self {
        let size = entry.estimated_size();
        Self {
            id: format!("log-{}", seq),
            seq,
            entry,
            enqueue_time: Instant::now(),
            priority,
            retry_count: 0,
            size,
        }
    }
}
