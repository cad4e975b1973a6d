//! Map engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::{Coordinate, Margins, ViewportSize};

/// Map synchronization engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapEngineConfig {
    /// Zoom bounds of the follow camera
    pub min_zoom: f64,
    pub max_zoom: f64,

    /// Pitch bounds (degrees); max pitch is used while navigating
    pub min_pitch: f64,
    pub max_pitch: f64,

    /// Widget pixels per surface pixel
    pub map_scale: f64,

    /// Ticks a gesture suppresses camera auto-follow
    pub interaction_timeout_ticks: u32,

    /// Pose gate threshold on the ECEF position std norm
    pub max_position_std: f64,

    /// Speed filter settings
    pub speed_filter: SpeedFilterConfig,

    /// Speed range mapped onto `[max_zoom, min_zoom]`
    pub zoom_speed_range: [f64; 2],

    /// Initial center when no position was ever known
    pub fallback_center: Coordinate,

    /// Initial surface size (surface pixels)
    pub viewport: ViewportSize,

    pub margins: Margins,

    /// Style lookup table, indexed by the `MapStyle` parameter
    pub style_urls: Vec<String>,

    /// Style applied on (re)initialization
    pub default_style_index: usize,

    /// Route tint
    pub nav_colors: NavColors,
}

impl Default for MapEngineConfig {
    fn default() -> Self {
        Self {
            min_zoom: 14.0,
            max_zoom: 17.0,
            min_pitch: 0.0,
            max_pitch: 50.0,
            map_scale: 2.0,
            interaction_timeout_ticks: 100,
            max_position_std: 100.0,
            speed_filter: SpeedFilterConfig::default(),
            zoom_speed_range: [0.0, 30.0],
            fallback_center: Coordinate::new(64.31990695292795, -149.79038934046247),
            viewport: ViewportSize::default(),
            margins: Margins {
                left: 0.0,
                top: 350.0,
                right: 0.0,
                bottom: 50.0,
            },
            style_urls: default_style_urls(),
            default_style_index: 0,
            nav_colors: NavColors::default(),
        }
    }
}

impl MapEngineConfig {
    /// Style URL for an index, if it is inside the table
    pub fn style_url(&self, index: usize) -> Option<&str> {
        self.style_urls.get(index).map(String::as_str)
    }

    pub fn default_style_url(&self) -> &str {
        self.style_url(self.default_style_index).unwrap_or_default()
    }
}

/// First-order low-pass filter over vehicle speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedFilterConfig {
    /// Initial value
    pub initial: f64,
    /// Time constant (s)
    pub time_constant: f64,
    /// Step size (s)
    pub dt: f64,
    /// Inputs are raised to at least this value (m/s)
    pub floor: f64,
}

impl Default for SpeedFilterConfig {
    fn default() -> Self {
        Self {
            initial: 0.0,
            time_constant: 10.0,
            dt: 0.05,
            floor: 10.0,
        }
    }
}

/// Route line colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavColors {
    /// Navigate-on-openpilot active
    pub engaged: String,
    pub idle: String,
}

impl Default for NavColors {
    fn default() -> Self {
        Self {
            engaged: "#31ee73".to_string(),
            idle: "#31a1ee".to_string(),
        }
    }
}

impl NavColors {
    pub fn for_state(&self, navigate_on_openpilot: bool) -> &str {
        if navigate_on_openpilot {
            &self.engaged
        } else {
            &self.idle
        }
    }
}

/// Stock style table
pub fn default_style_urls() -> Vec<String> {
    [
        "mapbox://styles/commaai/clkqztk0f00ou01qyhsa5bzpj",
        "mapbox://styles/mapbox/streets-v11",
        "mapbox://styles/mapbox/outdoors-v11",
        "mapbox://styles/mapbox/light-v10",
        "mapbox://styles/mapbox/dark-v10",
        "mapbox://styles/mapbox/navigation-day-v1",
        "mapbox://styles/mapbox/navigation-night-v1",
        "mapbox://styles/mapbox/satellite-v9",
        "mapbox://styles/mapbox/satellite-streets-v11",
        "mapbox://styles/mapbox/traffic-night-v2",
        "mapbox://styles/mike854/clt0hm8mw01ok01p4blkr27jp",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MapEngineConfig::default();
        assert_eq!(config.interaction_timeout_ticks, 100);
        assert_eq!(config.style_urls.len(), 11);
        assert_eq!(
            config.default_style_url(),
            "mapbox://styles/commaai/clkqztk0f00ou01qyhsa5bzpj"
        );
        assert_eq!(config.style_url(11), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: MapEngineConfig = toml::from_str("max_zoom = 18.0\n").unwrap();
        assert_eq!(config.max_zoom, 18.0);
        assert_eq!(config.min_zoom, 14.0);
        assert_eq!(config.speed_filter.floor, 10.0);
    }

    #[test]
    fn test_nav_colors() {
        let colors = NavColors::default();
        assert_eq!(colors.for_state(true), "#31ee73");
        assert_eq!(colors.for_state(false), "#31a1ee");
    }
}
