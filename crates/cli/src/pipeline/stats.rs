//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::TickMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Feed events received from the source
    pub events_received: u64,

    /// `Tick` events routed through the engine
    pub ticks_processed: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Source description, `name (kind)`
    pub source: String,

    /// Number of configured sinks
    pub active_sinks: usize,

    /// Stopped by Ctrl+C / SIGTERM
    pub interrupted: bool,

    /// Stopped by the run timeout
    pub timed_out: bool,

    /// Engine output aggregation
    pub tick_metrics: TickMetricsAggregator,

    /// Final source counters
    pub ingestion: ingestion::MetricsSnapshot,

    /// Final per-sink counters
    pub sink_metrics: Vec<(String, dispatcher::MetricsSnapshot)>,
}

impl PipelineStats {
    /// Ticks per second
    pub fn tick_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.ticks_processed as f64 / secs
        } else {
            0.0
        }
    }

    /// Outputs dropped across all sink queues
    pub fn sink_drops(&self) -> u64 {
        self.sink_metrics.iter().map(|(_, m)| m.dropped_count).sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let status = if self.interrupted {
            "interrupted"
        } else if self.timed_out {
            "timed out"
        } else {
            "completed"
        };

        println!("📊 Overview");
        println!("   ├─ Status: {}", status);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Source: {}", self.source);
        println!("   ├─ Events received: {}", self.events_received);
        println!("   ├─ Ticks processed: {}", self.ticks_processed);
        println!("   ├─ Tick rate: {:.2}/s", self.tick_rate());
        println!("   └─ Active sinks: {}", self.active_sinks);

        println!("\n📥 Source");
        println!("   ├─ Sent: {}", self.ingestion.events_sent);
        println!("   ├─ Dropped: {}", self.ingestion.events_dropped);
        println!("   ├─ Parse errors: {}", self.ingestion.parse_errors);
        println!("   └─ Replay passes: {}", self.ingestion.replay_passes);

        println!("\n📈 Engine");
        for line in self.tick_metrics.summary().to_string().lines().skip(1) {
            println!("   {}", line);
        }

        if !self.sink_metrics.is_empty() {
            println!("\n📤 Sinks (dropped total: {})", self.sink_drops());
            for (i, (name, metrics)) in self.sink_metrics.iter().enumerate() {
                let prefix = if i + 1 == self.sink_metrics.len() { "└─" } else { "├─" };
                println!("   {} {}: {}", prefix, name, metrics);
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_rate() {
        let stats = PipelineStats {
            ticks_processed: 100,
            duration: Duration::from_secs(5),
            ..Default::default()
        };
        assert!((stats.tick_rate() - 20.0).abs() < 1e-9);
        assert_eq!(PipelineStats::default().tick_rate(), 0.0);
    }

    #[test]
    fn test_sink_drops() {
        let stats = PipelineStats {
            sink_metrics: vec![
                (
                    "a".to_string(),
                    dispatcher::MetricsSnapshot {
                        dropped_count: 2,
                        ..Default::default()
                    },
                ),
                (
                    "b".to_string(),
                    dispatcher::MetricsSnapshot {
                        dropped_count: 3,
                        ..Default::default()
                    },
                ),
            ],
            ..Default::default()
        };
        assert_eq!(stats.sink_drops(), 5);
    }
}
