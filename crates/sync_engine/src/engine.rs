//! Map synchronizer implementation.

use contracts::{
    CameraState, CameraUpdate, ContractError, Coordinate, GestureEvent, Geometry, Instruction,
    InstructionUpdate, MapEngineConfig, OverlayContent, OverlayState, ParamsSnapshot, PoseSample,
    PredictedPath, RenderCommand, RouteUpdate, ScreenPoint, SurfaceEvent, TelemetrySnapshot,
    TickOrigin, TickOutput, UiSignal, ViewStatus, ViewportSize, WheelOrientation,
    PARAM_LAST_GPS_POSITION,
};
use tracing::instrument;

use crate::filter::SpeedFilter;
use crate::gate;
use crate::geometry::{map_val, path_to_coordinates};
use crate::gestures::{pan, wheel_scale, zoom_about};
use crate::interaction::InteractionTimer;
use crate::latch::{Edge, EdgeLatch, StickyLatch};
use crate::layers::{
    self, CAR_POS_LAYER, CAR_POS_SOURCE, MODEL_PATH_SOURCE, NAV_LAYER, NAV_SOURCE,
};
use crate::params::{self, lenient};
use crate::route_state::{overlay_state, InstructionOutcome, RouteMachine, RouteState};
use crate::sequence::SequenceGate;
use crate::style::StyleSelector;

/// Scale factors closer to 1 than this are not sent to the surface
const SCALE_EPSILON: f64 = 1e-9;

/// Follow-camera zoom for a filtered speed
///
/// Linear over `zoom_speed_range`, from `max_zoom` at the low end to
/// `min_zoom` at the high end, clamped outside the range.
pub fn zoom_for_speed(config: &MapEngineConfig, speed: f64) -> f64 {
    let [low, high] = config.zoom_speed_range;
    map_val(speed, low, high, config.max_zoom, config.min_zoom)
}

/// Commands and signals collected while handling one input
#[derive(Default)]
struct Batch {
    commands: Vec<RenderCommand>,
    signals: Vec<UiSignal>,
}

impl Batch {
    fn command(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    fn signal(&mut self, signal: UiSignal) {
        self.signals.push(signal);
    }
}

/// Live map synchronizer
///
/// Owns every piece of cross-tick state: interaction timer, latches,
/// sequence gates, speed filter and the camera model. All inputs return a
/// [`TickOutput`] describing what the surface and the host UI should do.
#[derive(Debug)]
pub struct MapSynchronizer {
    config: MapEngineConfig,
    viewport: ViewportSize,
    /// Camera model mirroring the surface
    camera: CameraState,
    filter: SpeedFilter,
    interaction: InteractionTimer,
    /// Surface reported fully loaded at least once
    loaded_once: StickyLatch,
    time_valid: EdgeLatch,
    navigate_on_openpilot: EdgeLatch,
    /// Route messages checked for a destination change
    route_seen: SequenceGate,
    /// Route messages written to the surface
    route_applied: SequenceGate,
    instruction_gate: SequenceGate,
    path_gate: SequenceGate,
    route: RouteMachine,
    style: StyleSelector,
    last_position: Option<Coordinate>,
    last_bearing: Option<f64>,
    location_valid: bool,
    last_valid_nav_dest: Option<Coordinate>,
    /// Overlay last reported to the host
    overlay: Option<OverlayState>,
    layers_installed: bool,
    initialized: bool,
    tick_counter: u64,
}

impl MapSynchronizer {
    /// Create a synchronizer, seeding the last known position from `params`
    pub fn new(config: MapEngineConfig, params: &dyn ParamsSnapshot) -> Self {
        let last_position = lenient(params::coordinate_from_param(
            params,
            PARAM_LAST_GPS_POSITION,
        ));

        Self {
            viewport: config.viewport,
            camera: CameraState::default(),
            filter: SpeedFilter::new(&config.speed_filter),
            interaction: InteractionTimer::new(config.interaction_timeout_ticks),
            loaded_once: StickyLatch::default(),
            time_valid: EdgeLatch::new(true),
            navigate_on_openpilot: EdgeLatch::default(),
            route_seen: SequenceGate::default(),
            route_applied: SequenceGate::default(),
            instruction_gate: SequenceGate::default(),
            path_gate: SequenceGate::default(),
            route: RouteMachine::default(),
            style: StyleSelector::new(config.default_style_index),
            last_position,
            last_bearing: None,
            location_valid: false,
            last_valid_nav_dest: None,
            overlay: None,
            layers_installed: false,
            initialized: false,
            tick_counter: 0,
            config,
        }
    }

    /// (Re)create the map surface
    ///
    /// Centers on the last known position at max zoom, or on the fallback
    /// center at min zoom. Custom layers are installed again after the next
    /// loaded tick.
    #[instrument(name = "map_sync_initialize", skip(self))]
    pub fn initialize(&mut self) -> TickOutput {
        let mut batch = Batch::default();
        self.init_surface(&mut batch);
        self.finish(TickOrigin::Initialize, batch, false)
    }

    fn init_surface(&mut self, batch: &mut Batch) {
        let (center, zoom) = match self.last_position {
            Some(position) => (position, self.config.max_zoom),
            None => (self.config.fallback_center, self.config.min_zoom),
        };

        self.camera = CameraState {
            center,
            bearing: 0.0,
            zoom,
            pitch: self.config.min_pitch,
        };

        batch.command(RenderCommand::Initialize {
            center,
            zoom,
            pitch: self.config.min_pitch,
            margins: self.config.margins,
            style_url: self.config.default_style_url().to_string(),
        });
        batch.command(RenderCommand::Resize {
            width: self.viewport.width,
            height: self.viewport.height,
        });

        // Content written to the old surface must be written again
        self.layers_installed = false;
        self.route_applied = SequenceGate::default();
        self.path_gate = SequenceGate::default();
        self.style.reset();
        self.initialized = true;
    }

    /// Per-tick update
    #[instrument(
        name = "map_sync_tick",
        skip(self, snapshot, params, view),
        fields(tick_id = self.tick_counter + 1, started = snapshot.started)
    )]
    pub fn tick(
        &mut self,
        snapshot: &TelemetrySnapshot,
        params: &dyn ParamsSnapshot,
        view: ViewStatus,
    ) -> TickOutput {
        let mut batch = Batch::default();

        if !snapshot.started {
            metrics::counter!("map_sync_ticks_total", "status" => "skipped").increment(1);
            return self.finish(TickOrigin::Tick, batch, true);
        }

        if self.time_valid.update(snapshot.time_valid) == Edge::Rising {
            tracing::warn!("Time is now valid, reinitializing map");
            self.init_surface(&mut batch);
        }

        self.update_navigate(snapshot.nav.navigate_on_openpilot(), &mut batch);
        self.update_pose(snapshot.pose.as_ref());

        let destination = params::destination(params);
        self.detect_destination(snapshot.route.as_ref(), destination, view, &mut batch);

        if !self.loaded_once.update(view.surface_loaded) {
            self.set_overlay(OverlayState::Loading, &mut batch);
            metrics::counter!("map_sync_ticks_total", "status" => "loading").increment(1);
            return self.finish(TickOrigin::Tick, batch, false);
        }

        self.install_layers(&mut batch);

        // From the routing state as of the previous instruction
        let state = overlay_state(true, self.location_valid, self.route.routing_problem());
        self.set_overlay(state, &mut batch);

        self.update_car_marker(&mut batch);
        self.follow_camera(&mut batch);
        self.apply_instruction(snapshot.instruction.as_ref(), destination, &mut batch);
        self.apply_route(snapshot.route.as_ref(), destination, &mut batch);
        self.apply_path(snapshot.predicted_path.as_ref(), snapshot.pose.as_ref(), &mut batch);
        self.apply_style(params, &mut batch);

        metrics::counter!("map_sync_ticks_total", "status" => "ok").increment(1);
        self.finish(TickOrigin::Tick, batch, false)
    }

    /// Navigate-on-openpilot: tint on every change, show the map on the rising edge
    fn update_navigate(&mut self, enabled: bool, batch: &mut Batch) {
        let edge = self.navigate_on_openpilot.update(enabled);
        if !edge.changed() {
            return;
        }

        if self.layers_installed {
            batch.command(layers::nav_tint(&self.config.nav_colors, enabled));
        }
        if edge == Edge::Rising {
            batch.signal(UiSignal::RequestVisible { visible: true });
        }
    }

    fn update_pose(&mut self, pose: Option<&PoseSample>) {
        self.location_valid = gate::is_valid_opt(pose, self.config.max_position_std);

        if let Some(pose) = pose.filter(|_| self.location_valid) {
            self.last_position = Some(pose.coordinate());
            self.last_bearing = Some(pose.bearing());
            self.filter.update(pose.speed());
        }
    }

    /// Open the map when a new route arrives for a new destination while hidden
    fn detect_destination(
        &mut self,
        route: Option<&RouteUpdate>,
        destination: Option<Coordinate>,
        view: ViewStatus,
        batch: &mut Batch,
    ) {
        let Some(route) = route.filter(|r| !r.coordinates.is_empty()) else {
            return;
        };
        if !self.route_seen.admit(route.sequence) {
            return;
        }

        let changed = std::mem::replace(&mut self.last_valid_nav_dest, destination) != destination;
        let allow_open = changed && destination.is_some() && !view.visible;
        tracing::info!(
            sequence = route.sequence,
            allow_open,
            "Got new route, opening map: {allow_open}"
        );

        if allow_open {
            batch.signal(UiSignal::RequestSettingsPanel { open: false });
            batch.signal(UiSignal::RequestVisible { visible: true });
        }
    }

    fn install_layers(&mut self, batch: &mut Batch) {
        if self.layers_installed {
            return;
        }
        tracing::debug!("Installing map layers");
        batch.commands.extend(layers::install(
            &self.config.nav_colors,
            self.navigate_on_openpilot.get(),
        ));
        self.layers_installed = true;
    }

    fn update_car_marker(&mut self, batch: &mut Batch) {
        if !self.location_valid {
            return;
        }

        if let Some(position) = self.last_position {
            batch.command(RenderCommand::source(CAR_POS_SOURCE, Geometry::point(position)));
        }
        // Map bearing lags while the user interacts; keep the arrow on heading
        if let Some(bearing) = self.last_bearing {
            batch.command(RenderCommand::layout(
                CAR_POS_LAYER,
                "icon-rotate",
                bearing - self.camera.bearing,
            ));
        }
    }

    fn follow_camera(&mut self, batch: &mut Batch) {
        if self.interaction.active() {
            self.interaction.tick();
            tracing::trace!(remaining = self.interaction.remaining(), "User owns the camera");
            return;
        }
        if !self.location_valid {
            return;
        }

        let update = self.follow_update();
        self.apply_camera(&update);
        batch.command(RenderCommand::SetCamera(update));
    }

    /// Camera pose computed from the last known position and filtered speed
    fn follow_update(&self) -> CameraUpdate {
        CameraUpdate {
            center: self.last_position,
            bearing: self.last_bearing,
            zoom: Some(zoom_for_speed(&self.config, self.filter.value())),
            pitch: None,
        }
    }

    fn apply_camera(&mut self, update: &CameraUpdate) {
        if let Some(center) = update.center {
            self.camera.center = center;
        }
        if let Some(bearing) = update.bearing {
            self.camera.bearing = bearing;
        }
        if let Some(zoom) = update.zoom {
            self.camera.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        }
        if let Some(pitch) = update.pitch {
            self.camera.pitch = pitch.clamp(self.config.min_pitch, self.config.max_pitch);
        }
    }

    fn set_pitch(&mut self, pitch: f64, batch: &mut Batch) {
        let update = CameraUpdate::pitch(pitch);
        self.apply_camera(&update);
        batch.command(RenderCommand::SetCamera(update));
    }

    fn apply_instruction(
        &mut self,
        update: Option<&InstructionUpdate>,
        destination: Option<Coordinate>,
        batch: &mut Batch,
    ) {
        let Some(update) = update else {
            return;
        };
        if !self.instruction_gate.admit(update.sequence) {
            dedup_skipped("instruction");
            return;
        }

        let outcome =
            self.route
                .on_instruction(update.valid, &update.instruction, destination.is_some());
        match outcome {
            InstructionOutcome::Updated => {
                batch.signal(UiSignal::EtaUpdated((&update.instruction).into()));
                if self.location_valid {
                    self.set_pitch(self.config.max_pitch, batch);
                    self.show_instruction(&update.instruction, batch);
                }
            }
            InstructionOutcome::Cleared => {
                if self.route.routing_problem() {
                    tracing::warn!(sequence = update.sequence, "Routing problem: invalid instruction with destination set");
                }
                self.clear_route_effects(destination, batch);
            }
        }
    }

    fn show_instruction(&mut self, instruction: &Instruction, batch: &mut Batch) {
        self.route.show_instruction(instruction);
        batch.signal(UiSignal::InstructionsUpdated(instruction.clone()));
    }

    fn apply_route(
        &mut self,
        route: Option<&RouteUpdate>,
        destination: Option<Coordinate>,
        batch: &mut Batch,
    ) {
        let Some(route) = route else {
            return;
        };
        if !self.route_applied.admit(route.sequence) {
            dedup_skipped("route");
            return;
        }
        if route.coordinates.is_empty() {
            tracing::debug!(sequence = route.sequence, "Ignoring empty route");
            return;
        }

        tracing::info!(
            sequence = route.sequence,
            points = route.coordinates.len(),
            "Updating navLayer with new route"
        );
        batch.command(RenderCommand::source(
            NAV_SOURCE,
            Geometry::line_string(&route.coordinates),
        ));
        batch.command(RenderCommand::visibility(NAV_LAYER, true));
        batch.commands.extend(layers::destination_marker(destination));
        self.route.route_applied();
        metrics::counter!("map_sync_route_applied_total").increment(1);
    }

    fn apply_path(
        &mut self,
        path: Option<&PredictedPath>,
        pose: Option<&PoseSample>,
        batch: &mut Batch,
    ) {
        let (Some(path), Some(pose)) = (path, pose) else {
            return;
        };
        if !self.path_gate.admit(path.sequence) {
            dedup_skipped("path");
            return;
        }

        let coordinates = path_to_coordinates(
            &pose.orientation_ecef.value,
            &pose.position_ecef.value,
            &path.points,
        );
        batch.command(RenderCommand::source(
            MODEL_PATH_SOURCE,
            Geometry::line_string(&coordinates),
        ));
    }

    fn apply_style(&mut self, params: &dyn ParamsSnapshot, batch: &mut Batch) {
        let index = lenient(params::style_index(params)).unwrap_or(self.config.default_style_index);
        if let Some(command) = self.style.select(index, &self.config.style_urls) {
            tracing::info!(index, "Applying map style");
            batch.command(command);
        }
    }

    /// Report the overlay when it changes; error banners hide the instruction panel
    fn set_overlay(&mut self, state: OverlayState, batch: &mut Batch) {
        if self.overlay == Some(state) {
            return;
        }
        self.overlay = Some(state);
        batch.signal(UiSignal::OverlayChanged { state });
        if state.is_error() {
            self.route.hide_instruction();
            batch.signal(UiSignal::InstructionsHidden);
        }
        metrics::gauge!("map_sync_overlay_state").set(f64::from(state.code()));
    }

    /// Drop the route: hide it, reset pitch and hide ETA and instructions
    #[instrument(name = "map_sync_clear_route", skip(self, params))]
    pub fn clear_route(&mut self, params: &dyn ParamsSnapshot) -> TickOutput {
        let mut batch = Batch::default();
        self.route.clear();
        self.clear_route_effects(params::destination(params), &mut batch);
        self.finish(TickOrigin::Offroad, batch, false)
    }

    fn clear_route_effects(&mut self, destination: Option<Coordinate>, batch: &mut Batch) {
        if self.initialized {
            batch.command(RenderCommand::visibility(NAV_LAYER, false));
            self.set_pitch(self.config.min_pitch, batch);
            batch.commands.extend(layers::destination_marker(destination));
        }
        batch.signal(UiSignal::InstructionsHidden);
        batch.signal(UiSignal::EtaHidden);
        self.last_valid_nav_dest = None;
    }

    /// Onroad/offroad transition
    ///
    /// Going offroad clears the route and forgets navigate-on-openpilot;
    /// going onroad shows the map iff a destination is set.
    #[instrument(name = "map_sync_offroad", skip(self, params))]
    pub fn offroad_transition(&mut self, offroad: bool, params: &dyn ParamsSnapshot) -> TickOutput {
        let mut batch = Batch::default();
        let destination = params::destination(params);

        if offroad {
            self.route.clear();
            self.clear_route_effects(destination, &mut batch);
            self.navigate_on_openpilot.reset();
        } else {
            batch.signal(UiSignal::RequestVisible {
                visible: destination.is_some(),
            });
        }
        self.last_bearing = None;

        self.finish(TickOrigin::Offroad, batch, false)
    }

    /// Widget resized (widget pixels)
    pub fn resize(&mut self, width: f64, height: f64) -> TickOutput {
        let mut batch = Batch::default();
        self.viewport = ViewportSize::new(width / self.config.map_scale, height / self.config.map_scale);
        batch.command(RenderCommand::Resize {
            width: self.viewport.width,
            height: self.viewport.height,
        });
        self.finish(TickOrigin::Resize, batch, false)
    }

    /// Surface lifecycle callback
    #[instrument(name = "map_sync_surface_event", skip(self))]
    pub fn on_surface_event(&mut self, event: &SurfaceEvent) -> TickOutput {
        let mut batch = Batch::default();

        match event {
            SurfaceEvent::StyleLoaded => {
                // visibility changes must be instant
                batch.command(RenderCommand::SetTransitionOptions {
                    duration_ms: 0,
                    delay_ms: 0,
                });
            }
            SurfaceEvent::MapLoaded => {
                if !self.loaded_once.get() {
                    tracing::info!("Map finished loading");
                }
                self.loaded_once.update(true);
            }
            SurfaceEvent::LoadFailed { code, reason } => {
                let err = ContractError::SurfaceLoad {
                    code: *code,
                    reason: reason.clone(),
                };
                tracing::error!(error = %err, "Map loading failed");
                metrics::counter!("map_sync_load_failures_total").increment(1);
            }
        }

        self.finish(TickOrigin::Surface, batch, false)
    }

    /// User gesture in widget pixels
    #[instrument(name = "map_sync_gesture", skip(self), fields(gesture = gesture.kind()))]
    pub fn on_gesture(&mut self, gesture: &GestureEvent) -> TickOutput {
        let mut batch = Batch::default();
        if !self.initialized {
            tracing::debug!("Gesture before surface initialization ignored");
            return self.finish(TickOrigin::Gesture, batch, false);
        }

        let scale = self.config.map_scale;
        match *gesture {
            GestureEvent::Press { position } => {
                self.interaction.track_pointer(position);
            }
            GestureEvent::Drag { position } => {
                let previous = self.interaction.track_pointer(position);
                let delta = previous.map(|p| position - p).unwrap_or_default();
                if !delta.is_null() {
                    self.reset_interaction(gesture);
                    let delta = delta / scale;
                    self.camera = pan(&self.camera, delta);
                    batch.command(RenderCommand::MoveBy { delta });
                }
            }
            GestureEvent::DoubleTap => {
                self.reset_interaction(gesture);
                let update = self.follow_update();
                self.apply_camera(&update);
                batch.command(RenderCommand::SetCamera(update));
            }
            GestureEvent::Wheel {
                delta,
                orientation,
                anchor,
            } => {
                if orientation == WheelOrientation::Horizontal {
                    return self.finish(TickOrigin::Gesture, batch, false);
                }
                self.reset_interaction(gesture);
                self.scale_about(wheel_scale(delta), anchor / scale, &mut batch);
            }
            GestureEvent::Pinch {
                scale_factor,
                anchor,
            } => {
                if !(scale_factor > 0.0 && scale_factor.is_finite()) {
                    tracing::debug!(scale_factor, "Ignoring degenerate pinch");
                    return self.finish(TickOrigin::Gesture, batch, false);
                }
                self.reset_interaction(gesture);
                self.scale_about(scale_factor, anchor / scale, &mut batch);
            }
        }

        self.finish(TickOrigin::Gesture, batch, false)
    }

    fn reset_interaction(&mut self, gesture: &GestureEvent) {
        self.interaction.reset();
        metrics::counter!("map_sync_interaction_resets_total", "gesture" => gesture.kind())
            .increment(1);
    }

    fn scale_about(&mut self, factor: f64, anchor: ScreenPoint, batch: &mut Batch) {
        let (camera, applied) = zoom_about(
            &self.camera,
            factor,
            anchor,
            self.viewport,
            self.config.min_zoom,
            self.config.max_zoom,
        );
        self.camera = camera;
        if (applied - 1.0).abs() > SCALE_EPSILON {
            batch.command(RenderCommand::ScaleBy {
                factor: applied,
                anchor,
            });
        }
    }

    fn finish(&mut self, origin: TickOrigin, batch: Batch, skipped: bool) -> TickOutput {
        self.tick_counter += 1;
        TickOutput {
            tick_id: self.tick_counter,
            origin,
            skipped,
            commands: batch.commands,
            signals: batch.signals,
            overlay: self.overlay_content(),
            camera: self.camera,
        }
    }

    fn overlay_content(&self) -> OverlayContent {
        let state = self.overlay.unwrap_or_default();
        if state != OverlayState::Normal {
            return OverlayContent {
                state,
                ..Default::default()
            };
        }

        OverlayContent {
            state,
            eta: self.route.eta(),
            maneuver: self.route.instruction().and_then(|i| i.maneuver.clone()),
        }
    }

    // ===== Accessors =====

    pub fn config(&self) -> &MapEngineConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn overlay_state(&self) -> OverlayState {
        self.overlay.unwrap_or_default()
    }

    pub fn route_state(&self) -> RouteState {
        self.route.state()
    }

    pub fn interaction_active(&self) -> bool {
        self.interaction.active()
    }

    pub fn loaded_once(&self) -> bool {
        self.loaded_once.get()
    }

    pub fn navigate_on_openpilot(&self) -> bool {
        self.navigate_on_openpilot.get()
    }

    pub fn location_valid(&self) -> bool {
        self.location_valid
    }

    pub fn last_position(&self) -> Option<Coordinate> {
        self.last_position
    }

    pub fn last_bearing(&self) -> Option<f64> {
        self.last_bearing
    }

    pub fn filtered_speed(&self) -> f64 {
        self.filter.value()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }
}

fn dedup_skipped(stream: &'static str) {
    tracing::trace!(stream, "Sequence unchanged, skipping");
    metrics::counter!("map_sync_dedup_skipped_total", "stream" => stream).increment(1);
}
