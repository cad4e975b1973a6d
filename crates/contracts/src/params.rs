//! ParamsSnapshot - read-only key-value view of the persisted parameter store

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// Destination set by the user, JSON coordinate
pub const PARAM_NAV_DESTINATION: &str = "NavDestination";
/// Last known GPS position, JSON coordinate
pub const PARAM_LAST_GPS_POSITION: &str = "LastGPSPosition";
/// Map style index into the style table
pub const PARAM_MAP_STYLE: &str = "MapStyle";

/// Read-only parameter snapshot injected at tick time
pub trait ParamsSnapshot {
    fn get(&self, key: &str) -> Option<&str>;
}

impl ParamsSnapshot for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}

/// Owned parameter snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticParams(HashMap<String, String>);

impl StaticParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Store a coordinate in the `{"latitude", "longitude"}` format
    pub fn with_coordinate(self, key: impl Into<String>, coordinate: Coordinate) -> Self {
        let value = serde_json::json!({
            "latitude": coordinate.latitude,
            "longitude": coordinate.longitude,
        });
        self.with(key, value.to_string())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }
}

impl ParamsSnapshot for StaticParams {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl From<HashMap<String, String>> for StaticParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}
