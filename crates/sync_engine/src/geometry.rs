//! Coordinate and projection helpers.
//!
//! Pure functions: WGS84 geodetic/ECEF conversion, vehicle-frame path
//! transformation, Web Mercator pixel math and the speed-to-zoom mapping.

use contracts::{Coordinate, ScreenPoint, Vector3};
use nalgebra::{Rotation3, Vector3 as NVector3};

/// WGS84 semi-major axis (m)
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 semi-minor axis (m)
const WGS84_B: f64 = 6_356_752.314_245;
/// First eccentricity squared
const WGS84_ESQ: f64 = 1.0 - (WGS84_B * WGS84_B) / (WGS84_A * WGS84_A);
/// Second eccentricity squared
const WGS84_E1SQ: f64 = (WGS84_A * WGS84_A) / (WGS84_B * WGS84_B) - 1.0;

/// Tile size used by the map surface
pub const TILE_SIZE: f64 = 512.0;
/// Web Mercator latitude limit
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

/// Geodetic position with altitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl Geodetic {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Geodetic (degrees, m) to ECEF (m)
pub fn geodetic_to_ecef(geodetic: &Geodetic) -> NVector3<f64> {
    let lat = geodetic.latitude.to_radians();
    let lon = geodetic.longitude.to_radians();
    let n = WGS84_A / (1.0 - WGS84_ESQ * lat.sin().powi(2)).sqrt();

    NVector3::new(
        (n + geodetic.altitude) * lat.cos() * lon.cos(),
        (n + geodetic.altitude) * lat.cos() * lon.sin(),
        (n * (1.0 - WGS84_ESQ) + geodetic.altitude) * lat.sin(),
    )
}

/// ECEF (m) to geodetic (degrees, m), closed form (Ferrari)
pub fn ecef_to_geodetic(ecef: &NVector3<f64>) -> Geodetic {
    let (x, y, z) = (ecef.x, ecef.y, ecef.z);
    let r = (x * x + y * y).sqrt();
    let e_sq_ab = WGS84_A * WGS84_A - WGS84_B * WGS84_B;

    let f = 54.0 * WGS84_B * WGS84_B * z * z;
    let g = r * r + (1.0 - WGS84_ESQ) * z * z - WGS84_ESQ * e_sq_ab;
    let c = (WGS84_ESQ * WGS84_ESQ * f * r * r) / g.powi(3);
    let s = (1.0 + c + (c * c + 2.0 * c).sqrt()).cbrt();
    let p = f / (3.0 * (s + 1.0 / s + 1.0).powi(2) * g * g);
    let q = (1.0 + 2.0 * WGS84_ESQ * WGS84_ESQ * p).sqrt();
    let r0 = -(p * WGS84_ESQ * r) / (1.0 + q)
        + (0.5 * WGS84_A * WGS84_A * (1.0 + 1.0 / q)
            - p * (1.0 - WGS84_ESQ) * z * z / (q * (1.0 + q))
            - 0.5 * p * r * r)
            .sqrt();
    let u = ((r - WGS84_ESQ * r0).powi(2) + z * z).sqrt();
    let v = ((r - WGS84_ESQ * r0).powi(2) + (1.0 - WGS84_ESQ) * z * z).sqrt();
    let z0 = WGS84_B * WGS84_B * z / (WGS84_A * v);

    Geodetic {
        latitude: ((z + WGS84_E1SQ * z0) / r).atan().to_degrees(),
        longitude: y.atan2(x).to_degrees(),
        altitude: u * (1.0 - WGS84_B * WGS84_B / (WGS84_A * v)),
    }
}

/// Rotation from roll/pitch/yaw (rad), applied as `Rz(yaw) * Ry(pitch) * Rx(roll)`
pub fn euler_to_rotation(rpy: &Vector3) -> Rotation3<f64> {
    Rotation3::from_euler_angles(rpy.x, rpy.y, rpy.z)
}

/// Transform vehicle-relative path points into geodetic coordinates
///
/// `orientation_ecef` is the calibrated ECEF orientation of the vehicle frame,
/// `position_ecef` its origin.
pub fn path_to_coordinates(
    orientation_ecef: &Vector3,
    position_ecef: &Vector3,
    points: &[Vector3],
) -> Vec<Coordinate> {
    let ecef_from_local = euler_to_rotation(orientation_ecef);
    let origin = NVector3::new(position_ecef.x, position_ecef.y, position_ecef.z);

    points
        .iter()
        .map(|p| {
            let point_ecef = ecef_from_local * NVector3::new(p.x, p.y, p.z) + origin;
            ecef_to_geodetic(&point_ecef).coordinate()
        })
        .collect()
}

/// Linear map of `x` from `[x0, x1]` onto `[y0, y1]`, with `x` clamped first
pub fn map_val(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    let x = x.clamp(x0.min(x1), x0.max(x1));
    let ratio = if x1 == x0 { 0.0 } else { (x - x0) / (x1 - x0) };
    y0 + ratio * (y1 - y0)
}

/// World size in pixels at `zoom`
#[inline]
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Web Mercator projection into world pixels at `zoom` (x east, y south)
pub fn project(coordinate: Coordinate, zoom: f64) -> ScreenPoint {
    let size = world_size(zoom);
    let lat = coordinate
        .latitude
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let x = (coordinate.longitude + 180.0) / 360.0 * size;
    let y = (1.0 - (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln() / std::f64::consts::PI)
        / 2.0
        * size;
    ScreenPoint::new(x, y)
}

/// Inverse of [`project`]; longitude is wrapped into `[-180, 180)`
pub fn unproject(point: ScreenPoint, zoom: f64) -> Coordinate {
    let size = world_size(zoom);
    let longitude = point.x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * point.y / size);
    let latitude = n.sinh().atan().to_degrees();
    Coordinate::new(latitude, wrap_longitude(longitude))
}

fn wrap_longitude(longitude: f64) -> f64 {
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

/// Rotate a screen-space offset into world-pixel axes for a map bearing (deg)
pub fn screen_to_world_offset(offset: ScreenPoint, bearing: f64) -> ScreenPoint {
    let (sin, cos) = bearing.to_radians().sin_cos();
    ScreenPoint::new(
        offset.x * cos - offset.y * sin,
        offset.x * sin + offset.y * cos,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_ecef_roundtrip() {
        let geodetic = Geodetic {
            latitude: 37.7749,
            longitude: -122.4194,
            altitude: 52.0,
        };
        let back = ecef_to_geodetic(&geodetic_to_ecef(&geodetic));
        assert!(approx(back.latitude, geodetic.latitude, 1e-7), "{back:?}");
        assert!(approx(back.longitude, geodetic.longitude, 1e-7), "{back:?}");
        assert!(approx(back.altitude, geodetic.altitude, 1e-3), "{back:?}");
    }

    #[test]
    fn test_path_with_identity_orientation_stays_near_origin() {
        let origin = Geodetic {
            latitude: 48.0,
            longitude: 11.0,
            altitude: 500.0,
        };
        let ecef = geodetic_to_ecef(&origin);
        let coords = path_to_coordinates(
            &Vector3::default(),
            &Vector3::new(ecef.x, ecef.y, ecef.z),
            &[Vector3::default(), Vector3::new(0.0, 0.0, 10.0)],
        );
        assert_eq!(coords.len(), 2);
        assert!(approx(coords[0].latitude, 48.0, 1e-7));
        assert!(approx(coords[0].longitude, 11.0, 1e-7));
        // 10 m along ECEF z moves north by well under a thousandth of a degree
        assert!(coords[1].latitude > coords[0].latitude);
        assert!(approx(coords[1].latitude, 48.0, 1e-3));
    }

    #[test]
    fn test_map_val_clamps_and_inverts() {
        assert_eq!(map_val(0.0, 0.0, 30.0, 17.0, 14.0), 17.0);
        assert_eq!(map_val(30.0, 0.0, 30.0, 17.0, 14.0), 14.0);
        assert_eq!(map_val(15.0, 0.0, 30.0, 17.0, 14.0), 15.5);
        assert_eq!(map_val(-5.0, 0.0, 30.0, 17.0, 14.0), 17.0);
        assert_eq!(map_val(99.0, 0.0, 30.0, 17.0, 14.0), 14.0);
    }

    #[test]
    fn test_mercator_roundtrip() {
        let c = Coordinate::new(51.5, -0.12);
        let p = project(c, 15.0);
        let back = unproject(p, 15.0);
        assert!(approx(back.latitude, c.latitude, 1e-9));
        assert!(approx(back.longitude, c.longitude, 1e-9));

        let origin = project(Coordinate::new(0.0, 0.0), 0.0);
        assert!(approx(origin.x, 256.0, 1e-9));
        assert!(approx(origin.y, 256.0, 1e-9));
    }

    #[test]
    fn test_screen_offset_rotation() {
        let up = ScreenPoint::new(0.0, -10.0);
        let north = screen_to_world_offset(up, 0.0);
        assert!(approx(north.y, -10.0, 1e-9));

        // heading east: screen up points east
        let east = screen_to_world_offset(up, 90.0);
        assert!(approx(east.x, 10.0, 1e-9));
        assert!(approx(east.y, 0.0, 1e-9));
    }
}
