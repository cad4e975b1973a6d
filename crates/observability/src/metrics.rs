//! Map Sync 指标收集模块
//!
//! 基于 TickOutput 收集和统计地图同步引擎的运行指标。

use std::collections::HashMap;

use contracts::{OverlayState, RenderCommand, TickOrigin, TickOutput, UiSignal};
use metrics::{counter, gauge, histogram};

/// 从 TickOutput 记录指标
///
/// 每次引擎产生输出时调用此函数来记录指标。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_tick_metrics;
///
/// let output = engine.tick(&snapshot, &params, view);
/// record_tick_metrics(&output);
/// ```
pub fn record_tick_metrics(output: &TickOutput) {
    // 输出批次计数
    counter!("map_sync_outputs_total", "origin" => origin_label(output.origin)).increment(1);

    // 批次 ID (用于检测跳号)
    gauge!("map_sync_last_tick_id").set(output.tick_id as f64);

    if output.skipped {
        return;
    }

    // 每批命令 / 信号数
    histogram!("map_sync_commands_per_output").record(output.commands.len() as f64);
    histogram!("map_sync_signals_per_output").record(output.signals.len() as f64);

    for command in &output.commands {
        counter!("map_sync_render_commands_total", "command" => command.kind()).increment(1);
    }

    // 相机状态
    gauge!("map_sync_camera_zoom").set(output.camera.zoom);
    gauge!("map_sync_camera_pitch").set(output.camera.pitch);
    gauge!("map_sync_camera_bearing").set(output.camera.bearing);

    // 显示请求
    let visible_requests = output.visibility_requests(true);
    if visible_requests > 0 {
        counter!("map_sync_visible_requests_total").increment(visible_requests as u64);
    }
}

/// 记录输入事件
pub fn record_feed_event(kind: &str) {
    counter!("map_sync_feed_events_total", "kind" => kind.to_string()).increment(1);
}

/// 记录输出分发
pub fn record_output_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "map_sync_outputs_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录单次处理耗时
pub fn record_tick_latency_ms(latency_ms: f64) {
    histogram!("map_sync_tick_latency_ms").record(latency_ms);
}

fn origin_label(origin: TickOrigin) -> &'static str {
    match origin {
        TickOrigin::Tick => "tick",
        TickOrigin::Gesture => "gesture",
        TickOrigin::Surface => "surface",
        TickOrigin::Offroad => "offroad",
        TickOrigin::Resize => "resize",
        TickOrigin::Initialize => "initialize",
    }
}

/// Tick 指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct TickMetricsAggregator {
    /// 输出批次总数
    pub total_outputs: u64,

    /// 未启动而跳过的 tick 数
    pub skipped_ticks: u64,

    /// 渲染命令总数
    pub total_commands: u64,

    /// 相机写入次数
    pub camera_writes: u64,

    /// 路线写入次数
    pub route_writes: u64,

    /// 显示请求次数
    pub visible_requests: u64,

    /// 缩放级别统计
    pub zoom_stats: RunningStats,

    /// 每批命令数统计
    pub commands_per_output: RunningStats,

    /// 处理耗时统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各覆盖层状态出现次数 (按 tick)
    pub overlay_counts: HashMap<OverlayState, u64>,

    /// 各手势次数
    pub gesture_counts: HashMap<String, u64>,
}

impl TickMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, output: &TickOutput) {
        self.total_outputs += 1;

        if output.skipped {
            self.skipped_ticks += 1;
            return;
        }

        self.total_commands += output.commands.len() as u64;
        self.commands_per_output.push(output.commands.len() as f64);
        self.camera_writes += output
            .commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::SetCamera(_)))
            .count() as u64;
        self.route_writes += output.source_writes("navSource") as u64;
        self.visible_requests += output
            .signals
            .iter()
            .filter(|s| matches!(s, UiSignal::RequestVisible { visible: true }))
            .count() as u64;

        if output.origin == TickOrigin::Tick {
            self.zoom_stats.push(output.camera.zoom);
            *self.overlay_counts.entry(output.overlay.state).or_insert(0) += 1;
        }
    }

    /// 记录一次手势
    pub fn record_gesture(&mut self, kind: &str) {
        *self.gesture_counts.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// 记录处理耗时
    pub fn record_latency_ms(&mut self, latency_ms: f64) {
        self.latency_stats.push(latency_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let evaluated = self.total_outputs - self.skipped_ticks;
        MetricsSummary {
            total_outputs: self.total_outputs,
            skipped_ticks: self.skipped_ticks,
            total_commands: self.total_commands,
            camera_writes: self.camera_writes,
            route_writes: self.route_writes,
            visible_requests: self.visible_requests,
            skip_rate: if self.total_outputs > 0 {
                self.skipped_ticks as f64 / self.total_outputs as f64 * 100.0
            } else {
                0.0
            },
            commands_per_output: if evaluated > 0 {
                StatsSummary::from(&self.commands_per_output)
            } else {
                StatsSummary::default()
            },
            zoom: StatsSummary::from(&self.zoom_stats),
            latency_ms: StatsSummary::from(&self.latency_stats),
            overlay_counts: self
                .overlay_counts
                .iter()
                .map(|(state, count)| (state.as_str().to_string(), *count))
                .collect(),
            gesture_counts: self.gesture_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_outputs: u64,
    pub skipped_ticks: u64,
    pub total_commands: u64,
    pub camera_writes: u64,
    pub route_writes: u64,
    pub visible_requests: u64,
    pub skip_rate: f64,
    pub commands_per_output: StatsSummary,
    pub zoom: StatsSummary,
    pub latency_ms: StatsSummary,
    pub overlay_counts: HashMap<String, u64>,
    pub gesture_counts: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Map Sync Metrics Summary ===")?;
        writeln!(f, "Total outputs: {}", self.total_outputs)?;
        writeln!(
            f,
            "Skipped ticks: {} ({:.2}%)",
            self.skipped_ticks, self.skip_rate
        )?;
        writeln!(f, "Render commands: {}", self.total_commands)?;
        writeln!(f, "Camera writes: {}", self.camera_writes)?;
        writeln!(f, "Route writes: {}", self.route_writes)?;
        writeln!(f, "Visible requests: {}", self.visible_requests)?;
        writeln!(f, "Commands per output: {}", self.commands_per_output)?;
        writeln!(f, "Zoom: {}", self.zoom)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;

        if !self.overlay_counts.is_empty() {
            writeln!(f, "Overlay states:")?;
            let mut states: Vec<_> = self.overlay_counts.iter().collect();
            states.sort();
            for (state, count) in states {
                writeln!(f, "  {}: {}", state, count)?;
            }
        }

        if !self.gesture_counts.is_empty() {
            writeln!(f, "Gestures:")?;
            let mut gestures: Vec<_> = self.gesture_counts.iter().collect();
            gestures.sort();
            for (gesture, count) in gestures {
                writeln!(f, "  {}: {}", gesture, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CameraState, CameraUpdate, Coordinate, Geometry, OverlayContent};

    fn tick_output(zoom: f64, overlay: OverlayState) -> TickOutput {
        TickOutput {
            tick_id: 1,
            origin: TickOrigin::Tick,
            skipped: false,
            commands: vec![
                RenderCommand::SetCamera(CameraUpdate {
                    zoom: Some(zoom),
                    ..Default::default()
                }),
                RenderCommand::source(
                    "navSource",
                    Geometry::line_string(&[Coordinate::new(1.0, 2.0), Coordinate::new(1.1, 2.1)]),
                ),
            ],
            signals: vec![UiSignal::RequestVisible { visible: true }],
            overlay: OverlayContent {
                state: overlay,
                ..Default::default()
            },
            camera: CameraState {
                zoom,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = TickMetricsAggregator::new();
        aggregator.update(&tick_output(15.0, OverlayState::Normal));
        aggregator.update(&tick_output(16.0, OverlayState::WaitingForGps));
        aggregator.update(&TickOutput {
            skipped: true,
            ..Default::default()
        });
        aggregator.record_gesture("wheel");

        assert_eq!(aggregator.total_outputs, 3);
        assert_eq!(aggregator.skipped_ticks, 1);
        assert_eq!(aggregator.total_commands, 4);
        assert_eq!(aggregator.camera_writes, 2);
        assert_eq!(aggregator.route_writes, 2);
        assert_eq!(aggregator.visible_requests, 2);
        assert_eq!(aggregator.overlay_counts.get(&OverlayState::Normal), Some(&1));
        assert!((aggregator.zoom_stats.mean() - 15.5).abs() < 1e-10);
        assert_eq!(aggregator.gesture_counts.get("wheel"), Some(&1));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = TickMetricsAggregator::new();
        aggregator.update(&tick_output(15.0, OverlayState::Normal));
        aggregator.record_gesture("pinch");

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Total outputs: 1"));
        assert!(output.contains("0.00%"));
        assert!(output.contains("normal: 1"));
        assert!(output.contains("pinch: 1"));
    }
}
