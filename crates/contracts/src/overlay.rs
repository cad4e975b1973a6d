//! Overlay state and UI-facing signals.

use serde::{Deserialize, Serialize};

use crate::{Instruction, Maneuver};

/// Non-map UI layered above the surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayState {
    /// Surface has not finished loading yet
    #[default]
    Loading,
    WaitingForGps,
    WaitingForRoute,
    Normal,
}

impl OverlayState {
    /// Error banner text, `None` when no banner is shown
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Loading => Some("Map Loading"),
            Self::WaitingForGps => Some("Waiting for GPS"),
            Self::WaitingForRoute => Some("Waiting for route"),
            Self::Normal => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.message().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::WaitingForGps => "waiting_for_gps",
            Self::WaitingForRoute => "waiting_for_route",
            Self::Normal => "normal",
        }
    }

    /// Stable numeric code for gauges
    pub fn code(&self) -> u8 {
        match self {
            Self::Loading => 0,
            Self::WaitingForGps => 1,
            Self::WaitingForRoute => 2,
            Self::Normal => 3,
        }
    }
}

/// ETA panel content
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EtaPayload {
    pub time_remaining: f64,
    pub time_remaining_typical: f64,
    pub distance_remaining: f64,
}

impl From<&Instruction> for EtaPayload {
    fn from(i: &Instruction) -> Self {
        Self {
            time_remaining: i.time_remaining,
            time_remaining_typical: i.time_remaining_typical,
            distance_remaining: i.distance_remaining,
        }
    }
}

/// Overlay as presented after a tick
///
/// Payloads are only reported while `state` is `Normal`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayContent {
    pub state: OverlayState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<EtaPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maneuver: Option<Maneuver>,
}

/// Signal to the hosting UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum UiSignal {
    /// Show or hide the map view
    RequestVisible { visible: bool },

    /// Open or close the map settings panel
    RequestSettingsPanel { open: bool },

    /// Overlay banner changed
    OverlayChanged { state: OverlayState },

    EtaUpdated(EtaPayload),
    EtaHidden,

    InstructionsUpdated(Instruction),
    InstructionsHidden,
}
