//! Console sink implementation

use crate::core::{LogLevel, LogSink, Result, StructuredLogEntry};
use async_trait::async_trait;
use chrono::SecondsFormat;
use colored::Colorize;

/// Rendering used by [`ConsoleSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    /// `[timestamp] [LEVEL] message` followed by payload and fields
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Writes entries to stdout, error and fatal to stderr
///
/// Also the fallback when a buffer is created without a sink.
pub struct ConsoleSink {
    use_colors: bool,
    format: ConsoleFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            format: ConsoleFormat::Text,
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            format: ConsoleFormat::Text,
        }
    }

    /// JSON lines on the console
    pub fn json() -> Self {
        Self {
            use_colors: false,
            format: ConsoleFormat::Json,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: ConsoleFormat) -> Self {
        self.format = format;
        self
    }

    pub fn render(&self, entry: &StructuredLogEntry) -> Result<String> {
        match self.format {
            ConsoleFormat::Text => Ok(self.format_text(entry)),
            ConsoleFormat::Json => Ok(entry.to_json()?),
        }
    }

    /// Format as text with optional colors
    fn format_text(&self, entry: &StructuredLogEntry) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", entry.level.to_str())
                .color(entry.level.color_code())
                .to_string()
        } else {
            format!("{:5}", entry.level.to_str())
        };

        let mut line = format!(
            "[{}] [{}] {}",
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            level_str,
            entry.message
        );

        if let Some(data) = &entry.data {
            line.push(' ');
            line.push_str(&data.to_string());
        }
        if let Some(error) = &entry.error {
            line.push_str(&format!(" error={}: {}", error.name, error.message));
        }
        if let Some(context) = &entry.context {
            line.push(' ');
            line.push_str(&context.format_fields());
        }
        line
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogSink for ConsoleSink {
    async fn write(&self, entry: &StructuredLogEntry) -> Result<()> {
        let output = self.render(entry)?;

        // Route Error and Fatal levels to stderr, others to stdout
        match entry.level {
            LogLevel::Error | LogLevel::Fatal => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        use std::io::Write;
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
