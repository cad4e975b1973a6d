//! Ingestion Pipeline main entry

use std::sync::Arc;

use contracts::{FeedEvent, SourceConfig};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::config::IngestionMetrics;
use crate::error::Result;
use crate::mock::MockDriveSource;
use crate::replay::ReplaySource;
use crate::source::FeedSource;

/// Ingestion Pipeline
///
/// Owns one feed source and the channel it delivers into.
pub struct IngestionPipeline {
    source: Box<dyn FeedSource>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Data sender (handed to the source on start)
    tx: Option<mpsc::Sender<FeedEvent>>,

    /// Data receiver
    rx: Option<mpsc::Receiver<FeedEvent>>,

    task: Option<JoinHandle<()>>,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    ///
    /// # Arguments
    /// * `source` - Feed source
    /// * `channel_capacity` - Channel capacity
    pub fn new(source: Box<dyn FeedSource>, channel_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));

        Self {
            source,
            metrics: Arc::new(IngestionMetrics::new()),
            tx: Some(tx),
            rx: Some(rx),
            task: None,
        }
    }

    /// Build the source described by the configuration
    #[instrument(name = "ingestion_from_config", skip(config), fields(kind = config.kind()))]
    pub fn from_config(config: &SourceConfig, channel_capacity: usize) -> Result<Self> {
        let source: Box<dyn FeedSource> = match config {
            SourceConfig::Replay {
                path,
                speed,
                loop_playback,
            } => Box::new(ReplaySource::open(path, *speed, *loop_playback)?),
            SourceConfig::Mock(mock) => Box::new(MockDriveSource::new("mock", mock.clone())),
        };
        Ok(Self::new(source, channel_capacity))
    }

    /// Start the source
    ///
    /// The sender is moved into the source task, so the receiver sees the end
    /// of the stream once the source finishes.
    #[instrument(name = "ingestion_start", skip(self), fields(source = %self.source.name()))]
    pub fn start(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        info!(kind = self.source.kind(), "starting feed source");
        self.task = self.source.start(tx, self.metrics.clone());
    }

    /// Stop the source
    #[instrument(name = "ingestion_stop", skip(self), fields(source = %self.source.name()))]
    pub fn stop(&self) {
        if self.source.is_running() {
            info!("stopping feed source");
            self.source.stop();
        }
    }

    /// Wait for the source task to finish
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "feed source task failed");
            }
        }
    }

    /// Get data stream receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<FeedEvent>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn source_kind(&self) -> &'static str {
        self.source.kind()
    }

    pub fn is_running(&self) -> bool {
        self.source.is_running()
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MockDriveConfig;
    use std::path::PathBuf;

    fn mock_config(max_ticks: u64) -> SourceConfig {
        SourceConfig::Mock(MockDriveConfig {
            frequency_hz: 1000.0,
            max_ticks: Some(max_ticks),
            ..Default::default()
        })
    }

    #[test]
    fn test_take_receiver_once() {
        let mut pipeline = IngestionPipeline::from_config(&mock_config(1), 8).unwrap();
        assert_eq!(pipeline.source_kind(), "mock");
        assert!(pipeline.take_receiver().is_some());
        assert!(pipeline.take_receiver().is_none());
    }

    #[test]
    fn test_missing_replay_file() {
        let config = SourceConfig::Replay {
            path: PathBuf::from("/nonexistent/drive.jsonl"),
            speed: 1.0,
            loop_playback: false,
        };
        assert!(IngestionPipeline::from_config(&config, 8).is_err());
    }

    #[tokio::test]
    async fn test_stream_ends_with_source() {
        let mut pipeline = IngestionPipeline::from_config(&mock_config(2), 8).unwrap();
        let mut rx = pipeline.take_receiver().unwrap();
        pipeline.start();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        pipeline.join().await;

        assert_eq!(events.len(), 2);
        assert_eq!(pipeline.metrics().snapshot().events_sent, 2);
        assert!(!pipeline.is_running());
    }
}
