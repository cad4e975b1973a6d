//! 回放来源
//!
//! 读取 JSONL 录制文件，每行 `{ "t": 秒, "event": FeedEvent }`，
//! 按录制时间间隔 (除以倍速) 重新发送。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, FeedEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};
use crate::source::{send_event, FeedSource};

/// 一条录制记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// 录制时间 (秒)
    pub t: f64,
    pub event: FeedEvent,
}

impl ReplayRecord {
    pub fn new(t: f64, event: FeedEvent) -> Self {
        Self { t, event }
    }

    /// 序列化为一行 JSON
    pub fn to_line(&self) -> std::result::Result<String, ContractError> {
        serde_json::to_string(self).map_err(|e| ContractError::Other(e.to_string()))
    }
}

/// 解析 JSONL 内容
///
/// 空行跳过；无法解析的行作为错误单独返回，不影响其他行。
pub fn parse_records(content: &str) -> (Vec<ReplayRecord>, Vec<ContractError>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ReplayRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => errors.push(ContractError::feed_parse(idx + 1, e.to_string())),
        }
    }

    (records, errors)
}

/// Delay before `next`, scaled by `speed`
fn gap(previous: f64, next: f64, speed: f64) -> Option<Duration> {
    let secs = (next - previous) / speed;
    (secs.is_finite() && secs > 0.0).then(|| Duration::from_secs_f64(secs))
}

/// JSONL 回放来源
pub struct ReplaySource {
    name: String,
    records: Arc<Vec<ReplayRecord>>,
    parse_errors: u64,
    speed: f64,
    loop_playback: bool,
    running: Arc<AtomicBool>,
}

impl ReplaySource {
    /// 从文件加载
    ///
    /// 无法解析的行记录警告后跳过；没有任何有效记录时返回错误。
    pub fn open(path: &Path, speed: f64, loop_playback: bool) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| IngestionError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let (records, errors) = parse_records(&content);
        for err in &errors {
            warn!(path = %path.display(), error = %err, "skipping replay line");
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "replay".to_string());

        let mut source = Self::from_records(name, records, speed, loop_playback)?;
        source.parse_errors = errors.len() as u64;

        info!(
            path = %path.display(),
            records = source.records.len(),
            skipped = source.parse_errors,
            speed,
            loop_playback,
            "replay loaded"
        );
        Ok(source)
    }

    /// 从内存中的记录创建
    pub fn from_records(
        name: impl Into<String>,
        records: Vec<ReplayRecord>,
        speed: f64,
        loop_playback: bool,
    ) -> Result<Self> {
        let name = name.into();
        if !(speed > 0.0 && speed.is_finite()) {
            return Err(IngestionError::invalid_parameter(
                "speed",
                format!("speed must be > 0, got {speed}"),
            ));
        }
        if records.is_empty() {
            return Err(IngestionError::EmptyReplay { name });
        }

        Ok(Self {
            name,
            records: Arc::new(records),
            parse_errors: 0,
            speed,
            loop_playback,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 记录数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 加载时跳过的行数
    pub fn parse_errors(&self) -> u64 {
        self.parse_errors
    }

    /// 录制时长 (秒)
    pub fn duration(&self) -> f64 {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => (last.t - first.t).max(0.0),
            _ => 0.0,
        }
    }
}

impl FeedSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "replay"
    }

    fn start(
        &self,
        tx: mpsc::Sender<FeedEvent>,
        metrics: Arc<IngestionMetrics>,
    ) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return None;
        }

        let name = self.name.clone();
        let records = self.records.clone();
        let running = self.running.clone();
        let speed = self.speed;
        let loop_playback = self.loop_playback;
        metrics.record_parse_errors(self.parse_errors);

        Some(tokio::spawn(async move {
            debug!(source = %name, records = records.len(), "replay started");

            'playback: loop {
                let mut previous: Option<f64> = None;
                for record in records.iter() {
                    if !running.load(Ordering::Relaxed) {
                        break 'playback;
                    }
                    if let Some(delay) = previous.and_then(|p| gap(p, record.t, speed)) {
                        tokio::time::sleep(delay).await;
                    }
                    previous = Some(record.t);

                    if !send_event(&tx, record.event.clone(), &metrics, &name).await {
                        break 'playback;
                    }
                }

                metrics.record_replay_pass();
                if !loop_playback {
                    break;
                }
                debug!(source = %name, "replay reached end, looping");
            }

            running.store(false, Ordering::SeqCst);
            debug!(source = %name, "replay stopped");
        }))
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GestureEvent, SurfaceEvent};
    use std::io::Write;

    fn sample_lines() -> String {
        [
            r#"{"t": 0.0, "event": {"type": "surface", "event": {"event": "map_loaded"}}}"#,
            "",
            r#"{"t": 0.05, "event": {"type": "tick", "snapshot": {"started": true}}}"#,
            r#"not json"#,
            r#"{"t": 0.10, "event": {"type": "gesture", "gesture": {"gesture": "double_tap"}}}"#,
        ]
        .join("\n")
    }

    #[test]
    fn test_parse_records_skips_bad_lines() {
        let (records, errors) = parse_records(&sample_lines());
        assert_eq!(records.len(), 3);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ContractError::FeedParse { line: 4, .. }));
        assert_eq!(
            records[2].event,
            FeedEvent::Gesture {
                gesture: GestureEvent::DoubleTap
            }
        );
    }

    #[test]
    fn test_gap_scaled_by_speed() {
        assert_eq!(gap(1.0, 2.0, 2.0), Some(Duration::from_millis(500)));
        assert_eq!(gap(2.0, 1.0, 1.0), None);
        assert_eq!(gap(1.0, 1.0, 1.0), None);
    }

    #[test]
    fn test_invalid_speed() {
        let records = vec![ReplayRecord::new(
            0.0,
            FeedEvent::Offroad { offroad: true },
        )];
        let result = ReplaySource::from_records("r", records, 0.0, false);
        assert!(matches!(result, Err(IngestionError::InvalidParameter { .. })));

        let result = ReplaySource::from_records("r", Vec::new(), 1.0, false);
        assert!(matches!(result, Err(IngestionError::EmptyReplay { .. })));
    }

    #[test]
    fn test_record_line_round_trip() {
        let record = ReplayRecord::new(
            1.5,
            FeedEvent::Surface {
                event: SurfaceEvent::StyleLoaded,
            },
        );
        let line = record.to_line().unwrap();
        let (records, errors) = parse_records(&line);
        assert!(errors.is_empty());
        assert_eq!(records, vec![record]);
    }

    #[tokio::test]
    async fn test_replay_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", sample_lines()).unwrap();

        let source = ReplaySource::open(file.path(), 100.0, false).unwrap();
        assert_eq!(source.len(), 3);
        assert_eq!(source.parse_errors(), 1);
        assert!((source.duration() - 0.1).abs() < 1e-9);

        let (tx, mut rx) = mpsc::channel(8);
        let metrics = Arc::new(IngestionMetrics::new());
        let handle = source.start(tx, metrics.clone()).unwrap();

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            kinds.push(event.kind());
        }
        handle.await.unwrap();

        assert_eq!(kinds, vec!["surface", "tick", "gesture"]);
        assert!(!source.is_running());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_sent, 3);
        assert_eq!(snapshot.parse_errors, 1);
        assert_eq!(snapshot.replay_passes, 1);
    }

    #[tokio::test]
    async fn test_replay_loops_until_stopped() {
        let records = vec![
            ReplayRecord::new(0.0, FeedEvent::Offroad { offroad: false }),
            ReplayRecord::new(0.001, FeedEvent::Offroad { offroad: true }),
        ];
        let source = ReplaySource::from_records("loop", records, 1.0, true).unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let metrics = Arc::new(IngestionMetrics::new());
        let handle = source.start(tx, metrics.clone()).unwrap();
        assert!(source.start(mpsc::channel(1).0, metrics.clone()).is_none());

        for _ in 0..6 {
            assert!(rx.recv().await.is_some());
        }
        source.stop();
        drop(rx);
        handle.await.unwrap();

        assert!(metrics.snapshot().replay_passes >= 2);
    }
}
