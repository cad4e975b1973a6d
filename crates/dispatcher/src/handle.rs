//! Per-sink delivery: a bounded queue in front of a dedicated writer task.
//!
//! Outputs fall into two classes. View updates (camera moves, the car
//! marker, the model path) are superseded by the next tick, so a full
//! queue drops them. Everything else changes what a replaying surface
//! would draw from then on (layer installs, route and pin geometry,
//! visibility, UI signals); those wait for queue space instead.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{DataSink, RenderCommand, TickOutput};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;

/// Sources rewritten on every tick
const TRANSIENT_SOURCES: [&str; 2] = ["carPosSource", "modelPathSource"];

/// How an output was handed to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued immediately
    Queued,
    /// Queue was full; waited for space
    Waited,
    /// Queue was full; output discarded
    Dropped,
}

/// Whether losing this output would leave a sink's picture of the map wrong
pub fn must_deliver(output: &TickOutput) -> bool {
    !output.signals.is_empty() || output.commands.iter().any(|c| !is_transient(c))
}

fn is_transient(command: &RenderCommand) -> bool {
    match command {
        RenderCommand::SetCamera(_) | RenderCommand::MoveBy { .. } | RenderCommand::ScaleBy { .. } => {
            true
        }
        RenderCommand::SetSourceGeoJson { source, .. } => {
            TRANSIENT_SOURCES.contains(&source.as_str())
        }
        _ => false,
    }
}

/// Handle to a running sink worker
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<TickOutput>,
    metrics: Arc<SinkMetrics>,
    worker: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the writer task for `sink` behind a queue of `queue_capacity`
    pub fn spawn<S: DataSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker = SinkWorker {
            sink,
            rx,
            metrics: Arc::clone(&metrics),
            name: name.clone(),
        };

        Self {
            name,
            tx,
            metrics,
            worker: tokio::spawn(worker.run()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Hand one output to the sink.
    ///
    /// Transient outputs never block; retained ones wait while the queue
    /// is full. Errors only when the worker has gone away.
    pub async fn offer(&self, output: TickOutput) -> Result<Delivery, DispatcherError> {
        let tick_id = output.tick_id;
        let retained = must_deliver(&output);

        let delivery = match self.tx.try_send(output) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(output)) if retained => {
                self.metrics.inc_waited_count();
                debug!(sink = %self.name, tick_id, "Queue full, waiting for retained output");
                self.tx
                    .send(output)
                    .await
                    .map_err(|_| DispatcherError::sink_closed(&self.name, tick_id))?;
                Delivery::Waited
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.inc_dropped_count();
                warn!(sink = %self.name, tick_id, "Queue full, view update dropped");
                Delivery::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                return Err(DispatcherError::sink_closed(&self.name, tick_id));
            }
        };

        self.metrics
            .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
        Ok(delivery)
    }

    /// Close the queue and wait for the worker to drain and close the sink
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!(sink = %self.name, error = ?e, "Sink worker panicked");
        }
    }
}

/// Writer side of a sink queue
struct SinkWorker<S> {
    sink: S,
    rx: mpsc::Receiver<TickOutput>,
    metrics: Arc<SinkMetrics>,
    name: String,
}

impl<S: DataSink> SinkWorker<S> {
    #[instrument(name = "sink_worker", skip(self), fields(sink = %self.name))]
    async fn run(mut self) {
        debug!("Sink worker started");

        while let Some(output) = self.rx.recv().await {
            self.metrics.set_queue_len(self.rx.len());
            let written = self.write(&output).await;
            observability::record_output_dispatched(&self.name, written);
        }

        if let Err(e) = self.sink.flush().await {
            error!(error = %e, "Flush failed on shutdown");
        }
        if let Err(e) = self.sink.close().await {
            error!(error = %e, "Close failed on shutdown");
        }

        debug!(
            written = self.metrics.write_count(),
            failed = self.metrics.failure_count(),
            "Sink worker stopped"
        );
    }

    async fn write(&mut self, output: &TickOutput) -> bool {
        match self.sink.write(output).await {
            Ok(()) => {
                self.metrics.inc_write_count();
                self.metrics.set_last_tick_id(output.tick_id);
                true
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                error!(tick_id = output.tick_id, error = %e, "Write failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CameraUpdate, ContractError, Coordinate, Geometry, OverlayState, UiSignal};
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::{sleep, Duration};

    struct MockSink {
        write_count: Arc<AtomicU64>,
        should_fail: bool,
        delay_ms: u64,
    }

    impl MockSink {
        fn new(write_count: &Arc<AtomicU64>) -> Self {
            Self {
                write_count: Arc::clone(write_count),
                should_fail: false,
                delay_ms: 0,
            }
        }
    }

    impl DataSink for MockSink {
        fn name(&self) -> &str {
            "mock"
        }

        async fn write(&mut self, _output: &TickOutput) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.should_fail {
                return Err(ContractError::sink_write("mock", "mock failure"));
            }
            self.write_count.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn camera_tick(tick_id: u64) -> TickOutput {
        TickOutput {
            tick_id,
            commands: vec![
                RenderCommand::SetCamera(CameraUpdate::pitch(0.0)),
                RenderCommand::source(
                    "carPosSource",
                    Geometry::point(Coordinate::new(32.7, -117.1)),
                ),
            ],
            ..Default::default()
        }
    }

    fn route_tick(tick_id: u64) -> TickOutput {
        TickOutput {
            tick_id,
            commands: vec![RenderCommand::source(
                "navSource",
                Geometry::line_string(&[Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)]),
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_must_deliver() {
        assert!(!must_deliver(&camera_tick(1)));
        assert!(must_deliver(&route_tick(1)));

        let mut signalled = camera_tick(2);
        signalled.signals.push(UiSignal::OverlayChanged {
            state: OverlayState::Normal,
        });
        assert!(must_deliver(&signalled));
    }

    #[tokio::test]
    async fn test_sink_handle_basic() {
        let write_count = Arc::new(AtomicU64::new(0));
        let handle = SinkHandle::spawn(MockSink::new(&write_count), 10);
        let metrics = Arc::clone(handle.metrics());

        for i in 1..=5 {
            assert_eq!(handle.offer(camera_tick(i)).await.unwrap(), Delivery::Queued);
        }

        handle.shutdown().await;
        assert_eq!(write_count.load(Ordering::Relaxed), 5);
        assert_eq!(metrics.snapshot().last_tick_id, 5);
    }

    #[tokio::test]
    async fn test_full_queue_drops_view_updates_only() {
        let write_count = Arc::new(AtomicU64::new(0));
        let sink = MockSink {
            delay_ms: 20,
            ..MockSink::new(&write_count)
        };
        let handle = SinkHandle::spawn(sink, 2);
        let metrics = Arc::clone(handle.metrics());

        for i in 0..10 {
            handle.offer(camera_tick(i)).await.unwrap();
        }
        assert!(metrics.dropped_count() > 0);

        for i in 10..14 {
            let delivery = handle.offer(route_tick(i)).await.unwrap();
            assert_ne!(delivery, Delivery::Dropped);
        }
        assert!(metrics.waited_count() > 0);

        handle.shutdown().await;
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.last_tick_id, 13);
        assert_eq!(
            write_count.load(Ordering::Relaxed) + snapshot.dropped_count,
            14
        );
    }

    #[tokio::test]
    async fn test_sink_handle_failure_isolation() {
        let write_count = Arc::new(AtomicU64::new(0));
        let sink = MockSink {
            should_fail: true,
            ..MockSink::new(&write_count)
        };
        let handle = SinkHandle::spawn(sink, 10);
        let metrics = Arc::clone(handle.metrics());

        for i in 0..3 {
            handle.offer(route_tick(i)).await.unwrap();
        }

        handle.shutdown().await;
        assert_eq!(metrics.failure_count(), 3);
        assert_eq!(write_count.load(Ordering::Relaxed), 0);
    }
}
