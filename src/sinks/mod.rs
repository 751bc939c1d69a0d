//! Sink implementations

pub mod console;
pub mod json_lines;

pub use console::{ConsoleFormat, ConsoleSink};
pub use json_lines::JsonLinesSink;
