//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Tick Model
//! - One `TelemetrySnapshot` per upstream state-update notification
//! - Streams carry their own monotonically increasing `sequence` numbers
//! - Renderer output is a list of `RenderCommand`s per tick, never a retained scene

mod blueprint;
mod engine_config;
mod error;
mod events;
mod geo;
mod overlay;
mod params;
mod render;
mod sink;
mod telemetry;
mod tick;

pub use blueprint::*;
pub use engine_config::*;
pub use error::*;
pub use events::*;
pub use geo::*;
pub use overlay::*;
pub use params::*;
pub use render::*;
pub use sink::*;
pub use telemetry::*;
pub use tick::*;
