//! FileSink - appends outputs to a JSON lines file

use chrono::{SecondsFormat, Utc};
use contracts::{ContractError, DataSink, TickOutput};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,

    /// File name inside `base_path`; defaults to `<sink name>.jsonl`
    pub file_name: Option<String>,

    /// Truncate an existing file instead of appending
    pub truncate: bool,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self {
            base_path,
            file_name: params.get("file_name").cloned(),
            truncate: params.get("truncate").is_some_and(|v| v == "true"),
        }
    }
}

/// One line of the output file
#[derive(Serialize)]
struct RecordedOutput<'a> {
    recorded_at: String,
    #[serde(flatten)]
    output: &'a TickOutput,
}

/// Sink that appends one JSON line per engine output
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines: u64,
}

impl FileSink {
    /// Create a new FileSink, creating the directory and opening the file
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        fs::create_dir_all(&config.base_path)?;

        let file_name = config
            .file_name
            .clone()
            .unwrap_or_else(|| format!("{name}.jsonl"));
        let path = config.base_path.join(file_name);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!config.truncate)
            .truncate(config.truncate)
            .open(&path)?;

        debug!(sink = %name, path = %path.display(), "FileSink opened");

        Ok(Self {
            name,
            path,
            writer: Some(BufWriter::new(file)),
            lines: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    /// Output file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn write_line(&mut self, output: &TickOutput) -> Result<(), ContractError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ContractError::sink_write(&self.name, "sink already closed"))?;

        let record = RecordedOutput {
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            output,
        };
        serde_json::to_writer(&mut *writer, &record)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, output),
        fields(sink = %self.name, tick_id = output.tick_id)
    )]
    async fn write(&mut self, output: &TickOutput) -> Result<(), ContractError> {
        self.write_line(output)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        info!(sink = %self.name, lines = self.lines, path = %self.path.display(), "FileSink closed");
        Ok(())
    }
}
