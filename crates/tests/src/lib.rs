//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（Mock 驾驶 → 引擎 → Dispatcher）
//! - 录制 / 回放一致性

#[cfg(test)]
mod contract_tests {
    use contracts::{FeedEvent, OverlayState, TickOutput};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_tick_output_json_shape() {
        let output = TickOutput::default();
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["tick_id"], 0);
        assert_eq!(value["overlay"]["state"], "loading");
        assert!(value["commands"].as_array().unwrap().is_empty());

        let event: FeedEvent =
            serde_json::from_str(r#"{"type":"resize","width":1920.0,"height":1080.0}"#).unwrap();
        assert_eq!(event.kind(), "resize");
        assert_eq!(OverlayState::default(), OverlayState::Loading);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;

    use contracts::{
        Coordinate, FeedEvent, GestureEvent, MapEngineConfig, MockDriveConfig, OverlayState,
        RenderCommand, ScreenPoint, SourceConfig, StaticParams, TickOrigin, TickOutput, UiSignal,
    };
    use dispatcher::create_dispatcher;
    use ingestion::{IngestionPipeline, MockDrive, ReplayRecord, ReplaySource};
    use observability::TickMetricsAggregator;
    use sync_engine::FeedDriver;
    use tokio::sync::mpsc;

    fn drive_config(max_ticks: u64) -> MockDriveConfig {
        MockDriveConfig {
            destination: Some(Coordinate::new(32.7300, -117.1500)),
            frequency_hz: 1000.0,
            max_ticks: Some(max_ticks),
            ..Default::default()
        }
    }

    /// Run every event through a fresh driver
    fn drive(
        events: impl IntoIterator<Item = FeedEvent>,
        config: MapEngineConfig,
    ) -> (FeedDriver, Vec<TickOutput>) {
        let mut driver = FeedDriver::new(config, StaticParams::new());
        let outputs = events
            .into_iter()
            .flat_map(|event| driver.handle(&event))
            .collect();
        (driver, outputs)
    }

    fn overlay_changes(outputs: &[TickOutput]) -> Vec<OverlayState> {
        outputs
            .iter()
            .flat_map(|o| &o.signals)
            .filter_map(|s| match s {
                UiSignal::OverlayChanged { state } => Some(*state),
                _ => None,
            })
            .collect()
    }

    fn follows(output: &TickOutput) -> bool {
        output
            .commands
            .iter()
            .any(|c| matches!(c, RenderCommand::SetCamera(u) if u.center.is_some()))
    }

    /// Mock drive → FeedDriver: loading, GPS lock, route and camera follow
    #[test]
    fn test_e2e_mock_drive_lifecycle() {
        let config = drive_config(60);
        let mock = MockDrive::new(config.clone());
        let (driver, outputs) = drive(mock.clone(), MapEngineConfig::default());

        assert_eq!(outputs[0].origin, TickOrigin::Initialize);
        assert!(outputs.iter().all(|o| !o.skipped));

        // overlay transitions are reported once each
        let changes = overlay_changes(&outputs);
        assert!(
            changes.windows(2).all(|w| w[0] != w[1]),
            "overlay changes repeat: {changes:?}"
        );
        let gps = changes.iter().position(|s| *s == OverlayState::WaitingForGps);
        let normal = changes.iter().position(|s| *s == OverlayState::Normal);
        assert!(gps.is_some() && normal.is_some(), "changes: {changes:?}");
        assert!(gps < normal);
        assert_eq!(driver.engine().overlay_state(), OverlayState::Normal);

        // route drawn, map opened for the new destination
        let route_writes: usize = outputs.iter().map(|o| o.source_writes("navSource")).sum();
        assert!(route_writes >= 1);
        let open_requests: usize = outputs.iter().map(|o| o.visibility_requests(true)).sum();
        assert!(open_requests >= 1);

        // no camera follow before the lock, then the camera tracks the vehicle
        let ticks: Vec<&TickOutput> = outputs
            .iter()
            .filter(|o| o.origin == TickOrigin::Tick)
            .collect();
        assert_eq!(ticks.len(), 60);
        let first_follow = ticks.iter().position(|o| follows(o)).unwrap();
        assert_eq!(first_follow as u64, config.gps_lock_after_ticks);

        let engine = driver.engine();
        let expected = mock.position_at(59);
        let center = engine.camera().center;
        assert!((center.latitude - expected.latitude).abs() < 1e-9);
        assert!((center.longitude - expected.longitude).abs() < 1e-9);
        let zoom = engine.camera().zoom;
        assert!((14.0..=17.0).contains(&zoom), "zoom {zoom}");

        // instruction shown once located
        let last = outputs.last().unwrap();
        assert!(last.overlay.eta.is_some());
        assert!(last.overlay.maneuver.is_some());
    }

    /// A drag hands the camera to the user for `interaction_timeout_ticks`
    #[test]
    fn test_e2e_gesture_suspends_follow() {
        let engine_config = MapEngineConfig {
            interaction_timeout_ticks: 5,
            ..Default::default()
        };
        let mut events: Vec<FeedEvent> = MockDrive::new(drive_config(40)).collect();
        let ticks: Vec<FeedEvent> = events
            .iter()
            .filter(|e| matches!(e, FeedEvent::Tick { .. }))
            .cloned()
            .collect();
        let tail = ticks[20..30].to_vec();

        events.extend([
            FeedEvent::Gesture {
                gesture: GestureEvent::Press {
                    position: ScreenPoint::new(100.0, 100.0),
                },
            },
            FeedEvent::Gesture {
                gesture: GestureEvent::Drag {
                    position: ScreenPoint::new(160.0, 140.0),
                },
            },
        ]);
        let gestures_at = events.len();
        events.extend(tail);

        let mut driver = FeedDriver::new(engine_config, StaticParams::new());
        let mut per_event = Vec::new();
        for event in &events {
            per_event.push(driver.handle(event));
        }

        // the drag pans the map
        let drag = per_event[gestures_at - 1].last().unwrap();
        assert!(drag
            .commands
            .iter()
            .any(|c| matches!(c, RenderCommand::MoveBy { .. })));

        let after: Vec<bool> = per_event[gestures_at..]
            .iter()
            .map(|outputs| outputs.iter().any(follows))
            .collect();
        assert_eq!(after[..5], [false; 5]);
        assert!(after[5..].iter().all(|f| *f));
    }

    /// Recorded feed replayed through ingestion gives the same engine outputs
    #[tokio::test]
    async fn test_e2e_replay_matches_live() {
        let events: Vec<FeedEvent> = MockDrive::new(drive_config(30)).collect();
        let (_, live) = drive(events.clone(), MapEngineConfig::default());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        for (i, event) in events.into_iter().enumerate() {
            let line = ReplayRecord::new(i as f64 * 0.001, event).to_line().unwrap();
            writeln!(file, "{line}").unwrap();
        }

        let source = ReplaySource::open(file.path(), 1000.0, false).unwrap();
        let mut pipeline = IngestionPipeline::new(Box::new(source), 16);
        let mut rx = pipeline.take_receiver().unwrap();
        pipeline.start();

        let mut driver = FeedDriver::new(MapEngineConfig::default(), StaticParams::new());
        let mut replayed = Vec::new();
        let collect = async {
            while let Some(event) = rx.recv().await {
                replayed.extend(driver.handle(&event));
            }
        };
        tokio::time::timeout(Duration::from_secs(10), collect)
            .await
            .expect("replay timed out");
        pipeline.join().await;

        assert_eq!(replayed.len(), live.len());
        for (a, b) in replayed.iter().zip(&live) {
            assert_eq!(a.tick_id, b.tick_id);
            assert_eq!(a.origin, b.origin);
            assert_eq!(a.overlay.state, b.overlay.state);
            assert_eq!(a.commands.len(), b.commands.len());
            assert_eq!(a.signals.len(), b.signals.len());
        }
        assert_eq!(pipeline.metrics().snapshot().replay_passes, 1);
    }

    /// Config → mock source → engine → dispatcher → JSONL file
    #[tokio::test]
    async fn test_e2e_mock_pipeline_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            r#"
[engine]
interaction_timeout_ticks = 10

[source]
kind = "mock"
frequency_hz = 500.0
max_ticks = 40
destination = {{ latitude = 32.73, longitude = -117.15 }}

[[sinks]]
name = "log"
sink_type = "log"

[[sinks]]
name = "recording"
sink_type = "file"
queue_capacity = 256

[sinks.params]
base_path = '{}'
"#,
            dir.path().display()
        );
        let blueprint =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert!(matches!(blueprint.source, SourceConfig::Mock(_)));

        let mut ingestion = IngestionPipeline::from_config(&blueprint.source, 64).unwrap();
        let mut feed_rx = ingestion.take_receiver().unwrap();

        let (output_tx, output_rx) = mpsc::channel::<TickOutput>(64);
        let dispatcher = create_dispatcher(blueprint.sinks.clone(), output_rx)
            .await
            .unwrap();
        let dispatcher_handle = dispatcher.spawn();

        ingestion.start();

        let mut driver = FeedDriver::new(blueprint.engine.clone(), StaticParams::new());
        let mut aggregator = TickMetricsAggregator::new();
        let run = async {
            while let Some(event) = feed_rx.recv().await {
                for output in driver.handle(&event) {
                    aggregator.update(&output);
                    output_tx.send(output).await.unwrap();
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(10), run)
            .await
            .expect("pipeline timed out");
        drop(output_tx);

        let sink_metrics = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle)
            .await
            .expect("dispatcher did not finish")
            .unwrap();
        let sink_metrics: HashMap<_, _> = sink_metrics.into_iter().collect();
        assert_eq!(sink_metrics.len(), 2);
        assert_eq!(sink_metrics["log"].write_count, sink_metrics["recording"].write_count);
        assert_eq!(sink_metrics["recording"].dropped_count, 0);

        let content = std::fs::read_to_string(dir.path().join("recording.jsonl")).unwrap();
        let records: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len() as u64, sink_metrics["recording"].write_count);
        assert!(records.iter().all(|r| r["recorded_at"].is_string()));

        let tick_ids: Vec<u64> = records.iter().map(|r| r["tick_id"].as_u64().unwrap()).collect();
        assert!(tick_ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            sink_metrics["recording"].last_tick_id,
            *tick_ids.last().unwrap()
        );

        let summary = aggregator.summary();
        assert!(summary.route_writes >= 1);
        assert!(summary.camera_writes > 0);
        assert!(summary.overlay_counts.get("normal").is_some_and(|n| *n > 0));
    }
}
