//! # Dispatcher
//!
//! 数据分发模块。
//!
//! 负责：
//! - 消费 `TickOutput`
//! - Fan-out 到多个 sinks
//! - 隔离慢 sink：视图更新在队列满时丢弃，状态变更等待入队

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, TickOutput};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::{must_deliver, Delivery, SinkHandle};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink};
