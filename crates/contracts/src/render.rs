//! RenderCommand - map surface command vocabulary
//!
//! Everything the engine asks of the external map-drawing library. Commands
//! are fire-and-forget; the surface never answers through this channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Coordinate, ScreenPoint};

/// Camera pose of the map surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: Coordinate,
    /// Degrees clockwise from north
    pub bearing: f64,
    pub zoom: f64,
    /// Degrees from nadir
    pub pitch: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            center: Coordinate::new(0.0, 0.0),
            bearing: 0.0,
            zoom: 0.0,
            pitch: 0.0,
        }
    }
}

/// Partial camera write
///
/// Fields left `None` are not touched on the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Coordinate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
}

impl CameraUpdate {
    pub fn pitch(pitch: f64) -> Self {
        Self {
            pitch: Some(pitch),
            ..Default::default()
        }
    }

    /// Full pose write
    pub fn from_state(state: &CameraState) -> Self {
        Self {
            center: Some(state.center),
            bearing: Some(state.bearing),
            zoom: Some(state.zoom),
            pitch: Some(state.pitch),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.center.is_none() && self.bearing.is_none() && self.zoom.is_none() && self.pitch.is_none()
    }

    /// Whether this write touches the user-owned fields (center, bearing, zoom)
    pub fn touches_view(&self) -> bool {
        self.center.is_some() || self.bearing.is_some() || self.zoom.is_some()
    }
}

/// GeoJSON geometry, positions in `[lon, lat]` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
}

impl Geometry {
    pub fn point(coordinate: Coordinate) -> Self {
        Self::Point(coordinate.to_lon_lat())
    }

    pub fn line_string<'a>(coordinates: impl IntoIterator<Item = &'a Coordinate>) -> Self {
        Self::LineString(coordinates.into_iter().map(|c| c.to_lon_lat()).collect())
    }

    /// Wrap as a GeoJSON `Feature` object with empty properties
    pub fn to_feature(&self) -> Value {
        serde_json::json!({
            "type": "Feature",
            "geometry": self,
            "properties": {},
        })
    }
}

/// Surface padding in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Command issued to the map surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand {
    /// (Re)create the surface with a fresh session
    Initialize {
        center: Coordinate,
        zoom: f64,
        pitch: f64,
        margins: Margins,
        style_url: String,
    },

    /// Resize the surface (map pixels)
    Resize { width: f64, height: f64 },

    /// Camera write
    SetCamera(CameraUpdate),

    /// Replace the style
    SetStyle { url: String },

    /// Global transition options
    SetTransitionOptions { duration_ms: u32, delay_ms: u32 },

    /// Register a named icon image
    AddImage { name: String, path: String },

    /// Add a style layer, optionally below `before`
    AddLayer {
        id: String,
        definition: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<String>,
    },

    SetPaintProperty {
        layer: String,
        property: String,
        value: Value,
    },

    SetLayoutProperty {
        layer: String,
        property: String,
        value: Value,
    },

    SetFilter { layer: String, filter: Value },

    SetLayerVisibility { layer: String, visible: bool },

    /// Replace a GeoJSON source's data
    SetSourceGeoJson { source: String, geometry: Geometry },

    /// Translate the view by a pixel delta (surface pixels)
    MoveBy { delta: ScreenPoint },

    /// Scale the view about a surface pixel
    ScaleBy { factor: f64, anchor: ScreenPoint },
}

impl RenderCommand {
    pub fn paint(layer: &str, property: &str, value: impl Into<Value>) -> Self {
        Self::SetPaintProperty {
            layer: layer.to_string(),
            property: property.to_string(),
            value: value.into(),
        }
    }

    pub fn layout(layer: &str, property: &str, value: impl Into<Value>) -> Self {
        Self::SetLayoutProperty {
            layer: layer.to_string(),
            property: property.to_string(),
            value: value.into(),
        }
    }

    pub fn visibility(layer: &str, visible: bool) -> Self {
        Self::SetLayerVisibility {
            layer: layer.to_string(),
            visible,
        }
    }

    pub fn source(source: &str, geometry: Geometry) -> Self {
        Self::SetSourceGeoJson {
            source: source.to_string(),
            geometry,
        }
    }

    /// Short name used for logs and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::Resize { .. } => "resize",
            Self::SetCamera(_) => "set_camera",
            Self::SetStyle { .. } => "set_style",
            Self::SetTransitionOptions { .. } => "set_transition_options",
            Self::AddImage { .. } => "add_image",
            Self::AddLayer { .. } => "add_layer",
            Self::SetPaintProperty { .. } => "set_paint_property",
            Self::SetLayoutProperty { .. } => "set_layout_property",
            Self::SetFilter { .. } => "set_filter",
            Self::SetLayerVisibility { .. } => "set_layer_visibility",
            Self::SetSourceGeoJson { .. } => "set_source_geojson",
            Self::MoveBy { .. } => "move_by",
            Self::ScaleBy { .. } => "scale_by",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_serializes_as_geojson() {
        let geometry = Geometry::point(Coordinate::new(1.0, 2.0));
        let value = serde_json::to_value(&geometry).unwrap();
        assert_eq!(value["type"], "Point");
        assert_eq!(value["coordinates"][0], 2.0);

        let feature = geometry.to_feature();
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["geometry"]["type"], "Point");
    }

    #[test]
    fn test_command_tagging() {
        let cmd = RenderCommand::visibility("navLayer", false);
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["command"], "set_layer_visibility");
        assert_eq!(value["layer"], "navLayer");

        let cmd = RenderCommand::SetCamera(CameraUpdate::pitch(50.0));
        let json = serde_json::to_string(&cmd).unwrap();
        let back: RenderCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn test_camera_update_touches_view() {
        assert!(!CameraUpdate::pitch(0.0).touches_view());
        let update = CameraUpdate {
            zoom: Some(15.0),
            ..Default::default()
        };
        assert!(update.touches_view());
        assert!(CameraUpdate::default().is_empty());
    }
}
