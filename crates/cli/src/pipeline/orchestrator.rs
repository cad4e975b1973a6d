//! Pipeline orchestrator - coordinates all components.
//!
//! Feed source → `FeedDriver` → dispatcher. Every event is routed through
//! the engine on the orchestrator task; sinks run on their own workers.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{FeedEvent, MapBlueprint, StaticParams, TickOutput};
use ingestion::IngestionPipeline;
use observability::{record_feed_event, record_tick_latency_ms, record_tick_metrics};
use sync_engine::FeedDriver;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Time allowed for sinks to drain after the feed ends
const DISPATCHER_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The run blueprint
    pub blueprint: MapBlueprint,

    /// Maximum number of ticks to process (None = unlimited)
    pub max_ticks: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

/// Why the event loop ended
enum StopReason {
    FeedEnded,
    MaxTicks,
    Timeout,
    Shutdown,
    DispatcherClosed,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the feed ends, a limit is reached or `shutdown` resolves
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Setup Ingestion
        info!(kind = blueprint.source.kind(), "Setting up feed source...");
        let mut ingestion = IngestionPipeline::from_config(&blueprint.source, self.config.buffer_size)
            .map_err(|e| CliError::source(blueprint.source.kind(), e.to_string()))?;
        let mut feed_rx = ingestion
            .take_receiver()
            .context("Failed to get ingestion receiver")?;

        // Setup Engine
        let mut driver = FeedDriver::new(blueprint.engine.clone(), StaticParams::new());
        info!(
            zoom = ?[blueprint.engine.min_zoom, blueprint.engine.max_zoom],
            style = blueprint.engine.default_style_url(),
            "Map synchronizer configured"
        );

        // Setup Dispatcher
        let (output_tx, output_rx) = mpsc::channel::<TickOutput>(self.config.buffer_size.max(1));
        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - tick outputs will be dropped");
        }
        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), output_rx)
            .await
            .map_err(|e| CliError::pipeline_execution(e.to_string()))?;
        let dispatcher_handle = dispatcher.spawn();
        info!(active_sinks = blueprint.sinks.len(), "Dispatcher started");

        let mut stats = PipelineStats {
            source: format!("{} ({})", ingestion.source_name(), ingestion.source_kind()),
            active_sinks: blueprint.sinks.len(),
            ..Default::default()
        };

        ingestion.start();
        info!(max_ticks = ?self.config.max_ticks, "Pipeline running");

        let deadline = self.config.timeout;
        let timeout = async move {
            match deadline {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(timeout);
        tokio::pin!(shutdown);

        let reason = loop {
            let event = tokio::select! {
                event = feed_rx.recv() => match event {
                    Some(event) => event,
                    None => break StopReason::FeedEnded,
                },
                _ = &mut timeout => break StopReason::Timeout,
                _ = &mut shutdown => break StopReason::Shutdown,
            };

            stats.events_received += 1;
            record_feed_event(event.kind());
            if let FeedEvent::Gesture { gesture } = &event {
                stats.tick_metrics.record_gesture(gesture.kind());
            }

            let started = Instant::now();
            let outputs = driver.handle(&event);
            let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
            record_tick_latency_ms(latency_ms);
            stats.tick_metrics.record_latency_ms(latency_ms);

            if !self.forward(outputs, &output_tx, &mut stats).await {
                break StopReason::DispatcherClosed;
            }

            if matches!(event, FeedEvent::Tick { .. }) {
                stats.ticks_processed += 1;
                if self
                    .config
                    .max_ticks
                    .is_some_and(|max| stats.ticks_processed >= max)
                {
                    break StopReason::MaxTicks;
                }
            }
        };

        match reason {
            StopReason::FeedEnded => info!("Feed source finished"),
            StopReason::MaxTicks => info!(ticks = stats.ticks_processed, "Reached max ticks limit"),
            StopReason::Timeout => {
                warn!(
                    timeout_secs = deadline.map(|d| d.as_secs()),
                    "Pipeline timed out"
                );
                stats.timed_out = true;
            }
            StopReason::Shutdown => {
                warn!("Received shutdown signal, stopping pipeline...");
                stats.interrupted = true;
            }
            StopReason::DispatcherClosed => warn!("Dispatcher channel closed"),
        }

        // Shutdown
        info!("Shutting down pipeline...");
        ingestion.stop();
        drop(feed_rx);
        ingestion.join().await;
        stats.ingestion = ingestion.metrics().snapshot();

        drop(output_tx);
        match tokio::time::timeout(DISPATCHER_FLUSH_TIMEOUT, dispatcher_handle).await {
            Ok(Ok(sink_metrics)) => stats.sink_metrics = sink_metrics,
            Ok(Err(e)) => warn!(error = %e, "Dispatcher task failed"),
            Err(_) => warn!("Timed out waiting for sinks to flush"),
        }

        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            tick_rate = format!("{:.2}", stats.tick_rate()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }

    /// Record and forward one event's outputs; false once the dispatcher is gone
    async fn forward(
        &self,
        outputs: Vec<TickOutput>,
        output_tx: &mpsc::Sender<TickOutput>,
        stats: &mut PipelineStats,
    ) -> bool {
        for output in outputs {
            record_tick_metrics(&output);
            stats.tick_metrics.update(&output);

            debug!(
                tick_id = output.tick_id,
                origin = ?output.origin,
                commands = output.commands.len(),
                signals = output.signals.len(),
                overlay = output.overlay.state.as_str(),
                "Tick output produced"
            );

            if output_tx.send(output).await.is_err() {
                return false;
            }
        }
        true
    }
}
