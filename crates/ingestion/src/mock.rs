//! Mock 驾驶来源
//!
//! 用于无车辆环境的测试：沿圆形轨迹合成定位、路线、导航指令和预测路径。

use std::collections::{HashMap, VecDeque};
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{
    Coordinate, FeedEvent, Instruction, InstructionUpdate, Maneuver, Measurement,
    MockDriveConfig, NavigationFlags, PoseSample, PredictedPath, RouteUpdate, SurfaceEvent,
    TelemetrySnapshot, Vector3, ViewStatus, PARAM_NAV_DESTINATION,
};
use nalgebra::{Matrix3, Rotation3};
use sync_engine::geometry::{geodetic_to_ecef, Geodetic};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::IngestionMetrics;
use crate::source::{send_event, FeedSource};

/// Meters per degree of latitude (spherical approximation)
const METERS_PER_DEGREE: f64 = 111_320.0;
/// Position std reported once the localizer is locked (m)
const LOCKED_STD: f64 = 2.0;
/// Position std reported before lock (m)
const UNLOCKED_STD: f64 = 500.0;
/// Predicted path length (points, 1 m apart)
const PATH_POINTS: usize = 33;

/// 合成驾驶事件生成器
///
/// 纯函数式生成，不依赖时钟：每调用一次 `next` 产生一个事件，
/// 每个 tick 依次输出 (可选的) 表面事件和一个 `Tick`。
#[derive(Debug, Clone)]
pub struct MockDrive {
    config: MockDriveConfig,
    tick: u64,
    pending: VecDeque<FeedEvent>,
}

impl MockDrive {
    pub fn new(config: MockDriveConfig) -> Self {
        Self {
            config,
            tick: 0,
            pending: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &MockDriveConfig {
        &self.config
    }

    /// 已生成的 tick 数
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// 第 `tick` 个 tick 的车辆位置 (沿圆周逆时针)
    pub fn position_at(&self, tick: u64) -> Coordinate {
        let angle = self.angle_at(tick);
        offset(
            self.config.center,
            self.config.radius_m * angle.cos(),
            self.config.radius_m * angle.sin(),
        )
    }

    fn angle_at(&self, tick: u64) -> f64 {
        let t = tick as f64 / self.config.frequency_hz;
        (self.config.speed_mps * t / self.config.radius_m) % TAU
    }

    /// 航向 (rad, 北为 0，顺时针为正)，沿圆周切线
    fn heading_at(&self, tick: u64) -> f64 {
        (self.angle_at(tick) + std::f64::consts::FRAC_PI_2) % TAU
    }

    fn generate_tick(&mut self) {
        let i = self.tick;
        let cfg = &self.config;

        if i == cfg.map_loaded_after_ticks {
            self.pending.push_back(FeedEvent::Surface {
                event: SurfaceEvent::StyleLoaded,
            });
            self.pending.push_back(FeedEvent::Surface {
                event: SurfaceEvent::MapLoaded,
            });
        }

        let time_valid = i >= cfg.time_valid_after_ticks;
        let locked = i >= cfg.gps_lock_after_ticks;
        let navigating = cfg.destination.is_some();

        let snapshot = TelemetrySnapshot {
            started: true,
            time_valid,
            pose: Some(self.pose_at(i, locked)),
            nav: NavigationFlags {
                nav_enabled: navigating,
                longitudinal_engaged: navigating && locked,
                always_on_lateral_active: false,
            },
            route: cfg.destination.map(|dest| self.route(dest)),
            instruction: cfg.destination.map(|dest| self.instruction_at(i, dest)),
            predicted_path: Some(PredictedPath {
                sequence: i + 1,
                points: (0..PATH_POINTS)
                    .map(|x| Vector3::new(x as f64, 0.0, 0.0))
                    .collect(),
            }),
        };

        let mut params = HashMap::new();
        if let Some(dest) = cfg.destination {
            params.insert(
                PARAM_NAV_DESTINATION.to_string(),
                format!(
                    r#"{{"latitude": {}, "longitude": {}}}"#,
                    dest.latitude, dest.longitude
                ),
            );
        }

        self.pending.push_back(FeedEvent::Tick {
            snapshot,
            params,
            view: ViewStatus {
                visible: cfg.visible,
                surface_loaded: i >= cfg.map_loaded_after_ticks,
            },
        });
        self.tick += 1;
    }

    fn pose_at(&self, tick: u64, locked: bool) -> PoseSample {
        let position = self.position_at(tick);
        let heading = self.heading_at(tick);
        let std = if locked { LOCKED_STD } else { UNLOCKED_STD };

        let geodetic = Geodetic {
            latitude: position.latitude,
            longitude: position.longitude,
            altitude: 0.0,
        };
        let ecef = geodetic_to_ecef(&geodetic);
        let (roll, pitch, yaw) = ecef_from_body(position, heading).euler_angles();

        PoseSample {
            position_geodetic: Measurement {
                value: Vector3::new(position.latitude, position.longitude, 0.0),
                std: Vector3::new(std, std, std),
                valid: locked,
            },
            orientation_ned: Measurement::valid(Vector3::new(0.0, 0.0, heading)),
            velocity_calibrated: Measurement::valid(Vector3::new(self.config.speed_mps, 0.0, 0.0)),
            position_ecef: Measurement {
                value: Vector3::new(ecef.x, ecef.y, ecef.z),
                std: Vector3::new(std, std, std),
                valid: true,
            },
            orientation_ecef: Measurement::valid(Vector3::new(roll, pitch, yaw)),
        }
    }

    /// 从起点到目的地的直线路线，只发布一次 (序号固定)
    fn route(&self, destination: Coordinate) -> RouteUpdate {
        let start = self.position_at(0);
        let n = self.config.route_points.max(2);
        let coordinates = (0..n)
            .map(|k| {
                let f = k as f64 / (n - 1) as f64;
                Coordinate::new(
                    start.latitude + (destination.latitude - start.latitude) * f,
                    start.longitude + (destination.longitude - start.longitude) * f,
                )
            })
            .collect();

        RouteUpdate {
            sequence: 1,
            coordinates,
        }
    }

    /// 每 `instruction_every_ticks` 个 tick 发布一次新指令
    fn instruction_at(&self, tick: u64, destination: Coordinate) -> InstructionUpdate {
        let every = self.config.instruction_every_ticks.max(1);
        let sequence = tick / every + 1;

        let position = self.position_at(tick);
        let distance = distance_m(position, destination);
        let speed = self.config.speed_mps.max(1.0);

        InstructionUpdate {
            sequence,
            valid: true,
            instruction: Instruction {
                time_remaining: distance / speed,
                time_remaining_typical: distance / speed * 1.1,
                distance_remaining: distance,
                maneuver: Some(Maneuver {
                    primary_text: "Continue on Mock Loop".to_string(),
                    secondary_text: None,
                    distance: self.config.radius_m * TAU / 4.0,
                    maneuver_type: Some("turn".to_string()),
                    modifier: Some("left".to_string()),
                }),
            },
        }
    }
}

impl Iterator for MockDrive {
    type Item = FeedEvent;

    fn next(&mut self) -> Option<FeedEvent> {
        if self.pending.is_empty() {
            if self.config.max_ticks.is_some_and(|max| self.tick >= max) {
                return None;
            }
            self.generate_tick();
        }
        self.pending.pop_front()
    }
}

/// Move `origin` by `north`/`east` meters
fn offset(origin: Coordinate, north: f64, east: f64) -> Coordinate {
    let lat = origin.latitude + north / METERS_PER_DEGREE;
    let lon =
        origin.longitude + east / (METERS_PER_DEGREE * origin.latitude.to_radians().cos());
    Coordinate::new(lat, lon)
}

/// Equirectangular distance (m)
fn distance_m(a: Coordinate, b: Coordinate) -> f64 {
    let north = (b.latitude - a.latitude) * METERS_PER_DEGREE;
    let east = (b.longitude - a.longitude)
        * METERS_PER_DEGREE
        * ((a.latitude + b.latitude) / 2.0).to_radians().cos();
    north.hypot(east)
}

/// Vehicle frame (x forward, y right, z down) to ECEF
fn ecef_from_body(position: Coordinate, heading: f64) -> Rotation3<f64> {
    let (slat, clat) = position.latitude.to_radians().sin_cos();
    let (slon, clon) = position.longitude.to_radians().sin_cos();

    // columns: north, east, down in ECEF
    let ecef_from_ned = Matrix3::new(
        -slat * clon, -slon, -clat * clon,
        -slat * slon, clon, -clat * slon,
        clat, 0.0, -slat,
    );
    let ned_from_body = Rotation3::from_euler_angles(0.0, 0.0, heading);

    Rotation3::from_matrix_unchecked(ecef_from_ned) * ned_from_body
}

/// Mock 驾驶来源
///
/// 以 `frequency_hz` 的节奏发送 `MockDrive` 生成的事件。
pub struct MockDriveSource {
    name: String,
    config: MockDriveConfig,
    running: Arc<AtomicBool>,
}

impl MockDriveSource {
    /// 创建新的 Mock 来源
    pub fn new(name: impl Into<String>, config: MockDriveConfig) -> Self {
        Self {
            name: name.into(),
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &MockDriveConfig {
        &self.config
    }
}

impl FeedSource for MockDriveSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        "mock"
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
        let config = self.config.clone();
        let running = self.running.clone();

        Some(tokio::spawn(async move {
            let interval = Duration::from_secs_f64(1.0 / config.frequency_hz);
            debug!(
                source = %name,
                frequency_hz = config.frequency_hz,
                max_ticks = ?config.max_ticks,
                "mock drive started"
            );

            for event in MockDrive::new(config) {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                let is_tick = matches!(event, FeedEvent::Tick { .. });
                if !send_event(&tx, event, &metrics, &name).await {
                    break;
                }
                if is_tick {
                    tokio::time::sleep(interval).await;
                }
            }

            running.store(false, Ordering::SeqCst);
            debug!(source = %name, "mock drive stopped");
        }))
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
