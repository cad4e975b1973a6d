//! TickOutput - map engine output
//!
//! Commands and signals produced by one tick, gesture or surface event.

use serde::{Deserialize, Serialize};

use crate::{CameraState, OverlayContent, RenderCommand, UiSignal};

/// What produced a `TickOutput`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOrigin {
    #[default]
    Tick,
    Gesture,
    Surface,
    Offroad,
    Resize,
    Initialize,
}

/// Output batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    /// Tick sequence number (monotonically increasing, shared by all origins)
    pub tick_id: u64,

    pub origin: TickOrigin,

    /// Upstream reported not started; nothing was evaluated
    #[serde(default)]
    pub skipped: bool,

    /// Surface commands in issue order
    pub commands: Vec<RenderCommand>,

    /// Host UI signals in issue order
    pub signals: Vec<UiSignal>,

    /// Overlay after this batch
    pub overlay: OverlayContent,

    /// Engine's camera model after this batch
    pub camera: CameraState,
}

impl TickOutput {
    /// Number of GeoJSON writes to `source`
    pub fn source_writes(&self, source: &str) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::SetSourceGeoJson { source: s, .. } if s == source))
            .count()
    }

    /// Camera writes that move center, bearing or zoom
    pub fn view_writes(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::SetCamera(update) if update.touches_view()))
            .count()
    }

    /// Number of `RequestVisible { visible }` signals
    pub fn visibility_requests(&self, visible: bool) -> usize {
        self.signals
            .iter()
            .filter(|s| matches!(s, UiSignal::RequestVisible { visible: v } if *v == visible))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.signals.is_empty()
    }
}
