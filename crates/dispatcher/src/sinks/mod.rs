//! Built-in sinks: a tracing log line per output and a JSONL recording.

mod file;
mod log;

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
