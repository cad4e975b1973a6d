//! # Ingestion Pipeline
//!
//! Telemetry feed ingestion module.
//!
//! Responsibilities:
//! - Replay recorded `FeedEvent` JSONL files with their original timing
//! - Synthesize a mock drive for runs without a vehicle
//! - Deliver events downstream over a tokio channel
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::IngestionPipeline;
//!
//! let mut pipeline = IngestionPipeline::from_config(&blueprint.source, 256)?;
//! let mut rx = pipeline.take_receiver().unwrap();
//! pipeline.start();
//! while let Some(event) = rx.recv().await {
//!     // Feed the map engine
//! }
//! ```
//!
//! ## Mock Testing
//!
//! ```ignore
//! use ingestion::MockDrive;
//!
//! for event in MockDrive::new(MockDriveConfig::default()) {
//!     driver.handle(&event);
//! }
//! ```

mod config;
mod error;
mod mock;
mod pipeline;
mod replay;
mod source;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use contracts::FeedEvent;
pub use error::{IngestionError, Result};
pub use mock::{MockDrive, MockDriveSource};
pub use pipeline::IngestionPipeline;
pub use replay::{parse_records, ReplayRecord, ReplaySource};
pub use source::FeedSource;
