//! MapBlueprint - Config Loader 输出
//!
//! 描述一次运行的完整配置：引擎参数、遥测来源、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::{Coordinate, MapEngineConfig};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的运行配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 地图同步引擎参数
    #[serde(default)]
    pub engine: MapEngineConfig,

    /// 遥测来源
    pub source: SourceConfig,

    /// 输出路由配置
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// 遥测来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// 回放录制的 JSONL 事件流
    Replay {
        path: PathBuf,

        /// 回放倍速，必须 > 0
        #[serde(default = "default_replay_speed")]
        speed: f64,

        /// 到达末尾后从头开始
        #[serde(default)]
        loop_playback: bool,
    },

    /// 合成的模拟驾驶
    Mock(MockDriveConfig),
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Replay { .. } => "replay",
            Self::Mock(_) => "mock",
        }
    }
}

fn default_replay_speed() -> f64 {
    1.0
}

/// 模拟驾驶参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockDriveConfig {
    /// 圆形轨迹中心
    pub center: Coordinate,

    /// 车速 (m/s)
    pub speed_mps: f64,

    /// 圆形轨迹半径 (m)
    pub radius_m: f64,

    /// Tick 频率 (Hz)，必须 > 0
    pub frequency_hz: f64,

    /// 导航目的地 (可选)，设置后会发布一次路线
    pub destination: Option<Coordinate>,

    /// 前 N 个 tick 系统时间无效
    pub time_valid_after_ticks: u64,

    /// 定位有效前的 tick 数
    pub gps_lock_after_ticks: u64,

    /// 每 N 个 tick 发布一次导航指令
    pub instruction_every_ticks: u64,

    /// 路线点数
    pub route_points: usize,

    /// 最大 tick 数 (None 表示无限)
    pub max_ticks: Option<u64>,

    /// 地图视图是否可见
    pub visible: bool,

    /// 在第 N 个 tick 后上报地图加载完成
    pub map_loaded_after_ticks: u64,
}

impl Default for MockDriveConfig {
    fn default() -> Self {
        Self {
            center: Coordinate::new(32.7157, -117.1611),
            speed_mps: 15.0,
            radius_m: 250.0,
            frequency_hz: 20.0,
            destination: None,
            time_valid_after_ticks: 5,
            gps_lock_after_ticks: 10,
            instruction_every_ticks: 20,
            route_points: 16,
            max_ticks: Some(400),
            visible: false,
            map_loaded_after_ticks: 3,
        }
    }
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 文件输出 (JSONL)
    File,
}

impl MapBlueprint {
    /// Blueprint with a default engine, the given source and no sinks
    pub fn with_source(source: SourceConfig) -> Self {
        Self {
            version: ConfigVersion::V1,
            engine: MapEngineConfig::default(),
            source,
            sinks: Vec::new(),
        }
    }
}
