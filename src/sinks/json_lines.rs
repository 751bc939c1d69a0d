//! JSON lines sink for structured logging

use crate::core::{LogSink, Result, StructuredLogEntry};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File sink writing one JSON object per line (JSONL)
///
/// Compatible with log aggregation tools like ELK, Loki, etc. Writes go to a
/// buffered writer that is flushed once per delivered batch.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it if needed
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSink for JsonLinesSink {
    async fn write(&self, entry: &StructuredLogEntry) -> Result<()> {
        let json = entry.to_json()?;
        writeln!(self.writer.lock(), "{}", json)?;
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "json_lines"
    }
}
