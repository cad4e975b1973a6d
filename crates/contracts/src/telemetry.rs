//! TelemetrySnapshot - upstream multiplexer input
//!
//! Latest known value of every stream the map engine consumes in one tick.

use serde::{Deserialize, Serialize};

use crate::{Coordinate, Vector3};

/// A single localizer measurement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Measured value
    pub value: Vector3,

    /// Per-axis standard deviation
    #[serde(default)]
    pub std: Vector3,

    /// Producer-side validity flag
    pub valid: bool,
}

impl Measurement {
    pub fn valid(value: Vector3) -> Self {
        Self {
            value,
            std: Vector3::default(),
            valid: true,
        }
    }
}

/// Localizer pose sample
///
/// Each sub-measurement carries its own validity; the engine only trusts the
/// sample as a whole (see the validity gate in `sync_engine`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    /// Geodetic position: x = latitude (deg), y = longitude (deg), z = altitude (m)
    pub position_geodetic: Measurement,

    /// Calibrated NED orientation: x = roll, y = pitch, z = yaw (rad)
    pub orientation_ned: Measurement,

    /// Calibrated velocity, x forward (m/s)
    pub velocity_calibrated: Measurement,

    /// ECEF position (m); its `std` is the position uncertainty
    pub position_ecef: Measurement,

    /// Calibrated ECEF orientation as roll/pitch/yaw (rad)
    #[serde(default)]
    pub orientation_ecef: Measurement,
}

impl PoseSample {
    /// Geodetic position
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(
            self.position_geodetic.value.x,
            self.position_geodetic.value.y,
        )
    }

    /// Heading in degrees, from the NED yaw
    pub fn bearing(&self) -> f64 {
        self.orientation_ned.value.z.to_degrees()
    }

    /// Forward speed (m/s)
    pub fn speed(&self) -> f64 {
        self.velocity_calibrated.value.x
    }

    /// Position uncertainty (ECEF std, m)
    pub fn uncertainty(&self) -> Vector3 {
        self.position_ecef.std
    }
}

/// Navigation route published by the route planner
///
/// Replaces the previous route wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteUpdate {
    /// Receive frame (monotonically increasing per stream)
    pub sequence: u64,

    /// Ordered route polyline
    #[serde(default)]
    pub coordinates: Vec<Coordinate>,
}

/// Upcoming maneuver
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Maneuver {
    pub primary_text: String,
    #[serde(default)]
    pub secondary_text: Option<String>,
    /// Distance to the maneuver (m)
    pub distance: f64,
    #[serde(default)]
    pub maneuver_type: Option<String>,
    #[serde(default)]
    pub modifier: Option<String>,
}

/// Turn-by-turn instruction payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Time remaining to destination (s)
    pub time_remaining: f64,

    /// Typical time remaining without traffic (s)
    pub time_remaining_typical: f64,

    /// Distance remaining to destination (m)
    pub distance_remaining: f64,

    /// Next maneuver, if known
    #[serde(default)]
    pub maneuver: Option<Maneuver>,
}

/// Instruction stream message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionUpdate {
    /// Receive frame
    pub sequence: u64,

    /// Stream validity. Invalid with a destination set means a routing problem.
    pub valid: bool,

    #[serde(default)]
    pub instruction: Instruction,
}

/// Predicted path, vehicle-relative (x forward, y right, z down, meters)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictedPath {
    pub sequence: u64,
    #[serde(default)]
    pub points: Vec<Vector3>,
}

/// Inputs of the navigate-on-openpilot flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationFlags {
    /// Path planner reports navigation enabled
    pub nav_enabled: bool,

    /// Longitudinal control engaged
    pub longitudinal_engaged: bool,

    /// Always-on lateral mode active
    pub always_on_lateral_active: bool,
}

impl NavigationFlags {
    /// `nav_enabled && (longitudinal_engaged || always_on_lateral_active)`
    pub fn navigate_on_openpilot(&self) -> bool {
        self.nav_enabled && (self.longitudinal_engaged || self.always_on_lateral_active)
    }
}

/// Snapshot of every stream for one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// System started (onroad)
    pub started: bool,

    /// System clock is valid
    #[serde(default)]
    pub time_valid: bool,

    /// Latest pose sample, `None` if the localizer never published
    #[serde(default)]
    pub pose: Option<PoseSample>,

    #[serde(default)]
    pub nav: NavigationFlags,

    #[serde(default)]
    pub route: Option<RouteUpdate>,

    #[serde(default)]
    pub instruction: Option<InstructionUpdate>,

    #[serde(default)]
    pub predicted_path: Option<PredictedPath>,
}
