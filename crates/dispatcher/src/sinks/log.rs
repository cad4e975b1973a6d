//! LogSink - logs output summary via tracing

use std::collections::HashMap;

use contracts::{ContractError, DataSink, TickOutput};
use tracing::{debug, info, instrument};

/// Sink that logs output summaries for debugging
pub struct LogSink {
    name: String,
    /// Also log every command and signal at debug level
    verbose: bool,
    /// Log batches without commands and signals
    include_empty: bool,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verbose: false,
            include_empty: false,
        }
    }

    /// Create from params map (`verbose`, `include_empty`)
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Self {
        let flag = |key: &str| params.get(key).is_some_and(|v| v == "true" || v == "1");
        Self {
            name: name.into(),
            verbose: flag("verbose"),
            include_empty: flag("include_empty"),
        }
    }

    fn log_output_summary(&self, output: &TickOutput) {
        if output.is_empty() && !self.include_empty {
            return;
        }

        info!(
            sink = %self.name,
            tick_id = output.tick_id,
            origin = ?output.origin,
            skipped = output.skipped,
            commands = output.commands.len(),
            signals = output.signals.len(),
            overlay = output.overlay.state.as_str(),
            zoom = output.camera.zoom,
            "TickOutput received"
        );

        if self.verbose {
            for command in &output.commands {
                debug!(sink = %self.name, tick_id = output.tick_id, command = ?command, "render command");
            }
            for signal in &output.signals {
                debug!(sink = %self.name, tick_id = output.tick_id, signal = ?signal, "ui signal");
            }
        }
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, output),
        fields(sink = %self.name, tick_id = output.tick_id)
    )]
    async fn write(&mut self, output: &TickOutput) -> Result<(), ContractError> {
        self.log_output_summary(output);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
