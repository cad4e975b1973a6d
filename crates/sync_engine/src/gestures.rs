//! Camera math for user gestures.
//!
//! Positions are in surface pixels. The camera center sits at the middle of
//! the viewport; pitch is ignored for pixel offsets.

use contracts::{CameraState, ScreenPoint, ViewportSize};

use crate::geometry::{project, screen_to_world_offset, unproject};

/// Wheel delta units per full scale step
const WHEEL_DELTA_PER_STEP: f64 = 1200.0;

/// Scale factor for a vertical wheel delta (120 units per notch)
///
/// Scrolling out by more than one full step inverts the factor so the
/// result stays a shrink rather than going negative.
pub fn wheel_scale(delta: f64) -> f64 {
    let mut factor = delta / WHEEL_DELTA_PER_STEP;
    if delta < 0.0 && factor <= -1.0 {
        factor = 1.0 / factor;
    }
    1.0 + factor
}

/// Translate the view so the map content follows `delta`
pub fn pan(camera: &CameraState, delta: ScreenPoint) -> CameraState {
    let center = project(camera.center, camera.zoom);
    let offset = screen_to_world_offset(delta, camera.bearing);
    let moved = ScreenPoint::new(center.x - offset.x, center.y - offset.y);

    CameraState {
        center: unproject(moved, camera.zoom),
        ..*camera
    }
}

/// Scale the view by `factor` about `anchor`, with the zoom clamped to
/// `[min_zoom, max_zoom]`
///
/// The map point under `anchor` stays under it. Returns the new camera and
/// the scale factor actually applied.
pub fn zoom_about(
    camera: &CameraState,
    factor: f64,
    anchor: ScreenPoint,
    viewport: ViewportSize,
    min_zoom: f64,
    max_zoom: f64,
) -> (CameraState, f64) {
    let target = if factor > 0.0 && factor.is_finite() {
        camera.zoom + factor.log2()
    } else {
        min_zoom
    };
    let zoom = target.clamp(min_zoom, max_zoom);
    let applied = 2f64.powf(zoom - camera.zoom);

    let center = project(camera.center, camera.zoom);
    let offset = screen_to_world_offset(anchor - viewport.center(), camera.bearing);
    let new_center = ScreenPoint::new(
        (center.x + offset.x) * applied - offset.x,
        (center.y + offset.y) * applied - offset.y,
    );

    let camera = CameraState {
        center: unproject(new_center, zoom),
        zoom,
        ..*camera
    };
    (camera, applied)
}
