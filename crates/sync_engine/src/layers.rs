//! Style layer catalogue installed once per surface.

use contracts::{Coordinate, Geometry, NavColors, RenderCommand};
use serde_json::json;

pub const MODEL_PATH_LAYER: &str = "modelPathLayer";
pub const MODEL_PATH_SOURCE: &str = "modelPathSource";
pub const NAV_LAYER: &str = "navLayer";
pub const NAV_SOURCE: &str = "navSource";
pub const PIN_LAYER: &str = "pinLayer";
pub const PIN_SOURCE: &str = "pinSource";
pub const CAR_POS_LAYER: &str = "carPosLayer";
pub const CAR_POS_SOURCE: &str = "carPosSource";
pub const BUILDINGS_LAYER: &str = "buildingsLayer";

/// Existing style layer the route is drawn below
const NAV_BEFORE_LAYER: &str = "road-intersection";
const NAV_COLOR_TRANSITION_MS: u32 = 400;

const PIN_IMAGE: &str = "default_marker";
const PIN_IMAGE_PATH: &str = "../assets/navigation/default_marker.svg";
const ARROW_IMAGE: &str = "label-arrow";
const ARROW_IMAGE_PATH: &str = "../assets/images/triangle.svg";

/// Commands adding every custom layer
pub fn install(colors: &NavColors, navigate_on_openpilot: bool) -> Vec<RenderCommand> {
    let mut commands = Vec::with_capacity(40);
    model_path_layer(&mut commands);
    nav_layer(&mut commands, colors, navigate_on_openpilot);
    pin_layer(&mut commands);
    car_pos_layer(&mut commands);
    buildings_layer(&mut commands);
    commands
}

fn add_layer(
    commands: &mut Vec<RenderCommand>,
    id: &str,
    definition: serde_json::Value,
    before: Option<&str>,
) {
    commands.push(RenderCommand::AddLayer {
        id: id.to_string(),
        definition,
        before: before.map(str::to_string),
    });
}

fn model_path_layer(commands: &mut Vec<RenderCommand>) {
    add_layer(
        commands,
        MODEL_PATH_LAYER,
        json!({ "type": "line", "source": MODEL_PATH_SOURCE }),
        None,
    );
    commands.push(RenderCommand::paint(MODEL_PATH_LAYER, "line-color", "red"));
    commands.push(RenderCommand::paint(MODEL_PATH_LAYER, "line-width", 5.0));
    commands.push(RenderCommand::layout(MODEL_PATH_LAYER, "line-cap", "round"));
}

fn nav_layer(commands: &mut Vec<RenderCommand>, colors: &NavColors, navigate_on_openpilot: bool) {
    add_layer(
        commands,
        NAV_LAYER,
        json!({ "type": "line", "source": NAV_SOURCE }),
        Some(NAV_BEFORE_LAYER),
    );
    commands.push(nav_tint(colors, navigate_on_openpilot));
    commands.push(RenderCommand::paint(
        NAV_LAYER,
        "line-color-transition",
        json!({ "duration": NAV_COLOR_TRANSITION_MS }),
    ));
    commands.push(RenderCommand::paint(NAV_LAYER, "line-width", 7.5));
    commands.push(RenderCommand::layout(NAV_LAYER, "line-cap", "round"));
}

fn pin_layer(commands: &mut Vec<RenderCommand>) {
    commands.push(RenderCommand::AddImage {
        name: PIN_IMAGE.to_string(),
        path: PIN_IMAGE_PATH.to_string(),
    });
    add_layer(
        commands,
        PIN_LAYER,
        json!({ "type": "symbol", "source": PIN_SOURCE }),
        None,
    );
    commands.push(RenderCommand::layout(PIN_LAYER, "icon-pitch-alignment", "viewport"));
    commands.push(RenderCommand::layout(PIN_LAYER, "icon-image", PIN_IMAGE));
    commands.push(RenderCommand::layout(PIN_LAYER, "icon-ignore-placement", true));
    commands.push(RenderCommand::layout(PIN_LAYER, "icon-allow-overlap", true));
    commands.push(RenderCommand::layout(PIN_LAYER, "symbol-sort-key", 0));
    commands.push(RenderCommand::layout(PIN_LAYER, "icon-anchor", "bottom"));
}

fn car_pos_layer(commands: &mut Vec<RenderCommand>) {
    commands.push(RenderCommand::AddImage {
        name: ARROW_IMAGE.to_string(),
        path: ARROW_IMAGE_PATH.to_string(),
    });
    add_layer(
        commands,
        CAR_POS_LAYER,
        json!({ "type": "symbol", "source": CAR_POS_SOURCE }),
        None,
    );
    commands.push(RenderCommand::layout(CAR_POS_LAYER, "icon-pitch-alignment", "map"));
    commands.push(RenderCommand::layout(CAR_POS_LAYER, "icon-image", ARROW_IMAGE));
    commands.push(RenderCommand::layout(CAR_POS_LAYER, "icon-size", 0.5));
    commands.push(RenderCommand::layout(CAR_POS_LAYER, "icon-ignore-placement", true));
    commands.push(RenderCommand::layout(CAR_POS_LAYER, "icon-allow-overlap", true));
    commands.push(RenderCommand::layout(CAR_POS_LAYER, "symbol-sort-key", 0));
}

fn buildings_layer(commands: &mut Vec<RenderCommand>) {
    add_layer(
        commands,
        BUILDINGS_LAYER,
        json!({
            "id": BUILDINGS_LAYER,
            "source": "composite",
            "source-layer": "building",
            "type": "fill-extrusion",
            "minzoom": 15,
        }),
        None,
    );
    commands.push(RenderCommand::SetFilter {
        layer: BUILDINGS_LAYER.to_string(),
        filter: json!(["==", "extrude", "true"]),
    });

    let zoom_ramp = |stops: serde_json::Value| {
        let mut expr = json!(["interpolate", ["linear"], ["zoom"]]);
        if let (Some(expr), Some(stops)) = (expr.as_array_mut(), stops.as_array()) {
            expr.extend(stops.iter().cloned());
        }
        expr
    };

    commands.push(RenderCommand::paint(BUILDINGS_LAYER, "fill-extrusion-color", "grey"));
    commands.push(RenderCommand::paint(
        BUILDINGS_LAYER,
        "fill-extrusion-opacity",
        zoom_ramp(json!([15, 0, 15.5, 0.6, 17, 0.6, 20, 0])),
    ));
    commands.push(RenderCommand::paint(
        BUILDINGS_LAYER,
        "fill-extrusion-height",
        zoom_ramp(json!([15, 0, 15.05, ["get", "height"]])),
    ));
    commands.push(RenderCommand::paint(
        BUILDINGS_LAYER,
        "fill-extrusion-base",
        zoom_ramp(json!([15, 0, 15.05, ["get", "min_height"]])),
    ));
    commands.push(RenderCommand::layout(BUILDINGS_LAYER, "visibility", "visible"));
}

/// Route line color for the navigate-on-openpilot state
pub fn nav_tint(colors: &NavColors, navigate_on_openpilot: bool) -> RenderCommand {
    RenderCommand::paint(NAV_LAYER, "line-color", colors.for_state(navigate_on_openpilot))
}

/// Destination pin: point and shown, or hidden when there is no destination
pub fn destination_marker(destination: Option<Coordinate>) -> Vec<RenderCommand> {
    match destination {
        Some(dest) => vec![
            RenderCommand::source(PIN_SOURCE, Geometry::point(dest)),
            RenderCommand::visibility(PIN_LAYER, true),
        ],
        None => vec![RenderCommand::visibility(PIN_LAYER, false)],
    }
}
