//! # Sync Engine
//!
//! 地图与遥测同步引擎。
//!
//! 负责：
//! - 位姿有效性判定与速度低通滤波
//! - 用户交互覆盖计时
//! - 路线 / 导航指令状态机与帧序号去重
//! - 输出 `TickOutput`（渲染命令 + UI 信号）
//!
//! ## 使用示例
//!
//! ```ignore
//! use contracts::{MapEngineConfig, StaticParams, ViewStatus};
//! use sync_engine::MapSynchronizer;
//!
//! let params = StaticParams::new();
//! let mut engine = MapSynchronizer::new(MapEngineConfig::default(), &params);
//! let init = engine.initialize();
//!
//! // On every upstream state update
//! let output = engine.tick(&snapshot, &params, ViewStatus::default());
//! for command in &output.commands {
//!     // Forward to the map surface
//! }
//! ```

mod driver;
mod engine;
pub mod filter;
pub mod gate;
pub mod geometry;
pub mod gestures;
pub mod interaction;
pub mod latch;
pub mod layers;
pub mod params;
pub mod route_state;
pub mod sequence;
pub mod style;

// Re-exports
pub use driver::FeedDriver;
pub use engine::{zoom_for_speed, MapSynchronizer};
pub use filter::SpeedFilter;
pub use interaction::InteractionTimer;
pub use latch::{Edge, EdgeLatch, StickyLatch};
pub use route_state::{overlay_state, RouteState};
pub use sequence::SequenceGate;

// Re-export contracts types
pub use contracts::{MapEngineConfig, TelemetrySnapshot, TickOutput};
