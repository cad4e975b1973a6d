//! Asynchronous inputs: gestures, surface callbacks and feed records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ScreenPoint, TelemetrySnapshot};

/// Host view state sampled at tick time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewStatus {
    /// Map view currently shown
    pub visible: bool,

    /// Surface reports all tiles and style resources loaded
    #[serde(default)]
    pub surface_loaded: bool,
}

/// Wheel orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelOrientation {
    #[default]
    Vertical,
    Horizontal,
}

/// User input on the map widget, in widget pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gesture", rename_all = "snake_case")]
pub enum GestureEvent {
    /// Pointer pressed, starts a drag
    Press { position: ScreenPoint },

    /// Pointer moved while pressed
    Drag { position: ScreenPoint },

    /// Recenter on the vehicle
    DoubleTap,

    /// Wheel delta in eighths of a degree (120 per notch)
    Wheel {
        delta: f64,
        #[serde(default)]
        orientation: WheelOrientation,
        anchor: ScreenPoint,
    },

    /// Pinch scale factor change about `anchor`
    Pinch { scale_factor: f64, anchor: ScreenPoint },
}

impl GestureEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Press { .. } => "press",
            Self::Drag { .. } => "drag",
            Self::DoubleTap => "double_tap",
            Self::Wheel { .. } => "wheel",
            Self::Pinch { .. } => "pinch",
        }
    }
}

/// Map surface lifecycle callbacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SurfaceEvent {
    StyleLoaded,
    MapLoaded,
    LoadFailed { code: i32, reason: String },
}

/// One record of a telemetry feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// Upstream state update
    Tick {
        snapshot: TelemetrySnapshot,
        #[serde(default)]
        params: HashMap<String, String>,
        #[serde(default)]
        view: ViewStatus,
    },

    Gesture { gesture: GestureEvent },

    Surface { event: SurfaceEvent },

    /// Onroad/offroad transition
    Offroad { offroad: bool },

    /// Widget resized (widget pixels)
    Resize { width: f64, height: f64 },
}

impl FeedEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Tick { .. } => "tick",
            Self::Gesture { .. } => "gesture",
            Self::Surface { .. } => "surface",
            Self::Offroad { .. } => "offroad",
            Self::Resize { .. } => "resize",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_event_json_lines() {
        let line = r#"{"type":"gesture","gesture":{"gesture":"wheel","delta":120.0,"anchor":{"x":10.0,"y":20.0}}}"#;
        let event: FeedEvent = serde_json::from_str(line).unwrap();
        match event {
            FeedEvent::Gesture {
                gesture: GestureEvent::Wheel { delta, orientation, .. },
            } => {
                assert_eq!(delta, 120.0);
                assert_eq!(orientation, WheelOrientation::Vertical);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_tick_record_defaults() {
        let line = r#"{"type":"tick","snapshot":{"started":true}}"#;
        let event: FeedEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.kind(), "tick");
        if let FeedEvent::Tick { params, view, .. } = event {
            assert!(params.is_empty());
            assert!(!view.visible);
        }
    }
}
