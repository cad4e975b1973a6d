//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink could not be built from its configuration
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Sink worker is gone; the output was not delivered
    #[error("sink '{sink_name}' worker closed, tick {tick_id} not delivered")]
    SinkClosed { sink_name: String, tick_id: u64 },
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn sink_closed(sink_name: impl Into<String>, tick_id: u64) -> Self {
        Self::SinkClosed {
            sink_name: sink_name.into(),
            tick_id,
        }
    }
}
