//! Feed event routing.

use contracts::{FeedEvent, MapEngineConfig, ParamsSnapshot, StaticParams, TickOutput};

use crate::MapSynchronizer;

/// Drives a [`MapSynchronizer`] from a stream of [`FeedEvent`]s
///
/// Parameters arrive with `Tick` events; offroad transitions read the most
/// recent ones.
#[derive(Debug)]
pub struct FeedDriver {
    engine: MapSynchronizer,
    params: StaticParams,
    started: bool,
}

impl FeedDriver {
    pub fn new(config: MapEngineConfig, params: StaticParams) -> Self {
        Self {
            engine: MapSynchronizer::new(config, &params),
            params,
            started: false,
        }
    }

    /// Create the surface; `handle` does this on first use
    pub fn start(&mut self) -> TickOutput {
        self.started = true;
        self.engine.initialize()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Route one event; the first call is preceded by the surface creation
    pub fn handle(&mut self, event: &FeedEvent) -> Vec<TickOutput> {
        let mut outputs = Vec::with_capacity(2);
        if !self.started {
            outputs.push(self.start());
        }

        let output = match event {
            FeedEvent::Tick {
                snapshot,
                params,
                view,
            } => {
                self.params = StaticParams::from(params.clone());
                self.engine.tick(snapshot, &self.params, *view)
            }
            FeedEvent::Gesture { gesture } => self.engine.on_gesture(gesture),
            FeedEvent::Surface { event } => self.engine.on_surface_event(event),
            FeedEvent::Offroad { offroad } => self.engine.offroad_transition(*offroad, &self.params),
            FeedEvent::Resize { width, height } => self.engine.resize(*width, *height),
        };
        outputs.push(output);
        outputs
    }

    pub fn engine(&self) -> &MapSynchronizer {
        &self.engine
    }

    pub fn params(&self) -> &dyn ParamsSnapshot {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        GestureEvent, SurfaceEvent, TelemetrySnapshot, TickOrigin, UiSignal,
        ViewStatus, PARAM_NAV_DESTINATION,
    };
    use std::collections::HashMap;

    #[test]
    fn test_first_event_initializes() {
        let mut driver = FeedDriver::new(MapEngineConfig::default(), StaticParams::new());
        let outputs = driver.handle(&FeedEvent::Surface {
            event: SurfaceEvent::MapLoaded,
        });
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].origin, TickOrigin::Initialize);
        assert_eq!(outputs[1].origin, TickOrigin::Surface);
        assert!(driver.engine().loaded_once());

        let outputs = driver.handle(&FeedEvent::Gesture {
            gesture: GestureEvent::DoubleTap,
        });
        assert_eq!(outputs.len(), 1);
        assert!(driver.engine().interaction_active());
    }

    #[test]
    fn test_offroad_uses_latest_tick_params() {
        let mut driver = FeedDriver::new(MapEngineConfig::default(), StaticParams::new());
        let params = HashMap::from([(
            PARAM_NAV_DESTINATION.to_string(),
            r#"{"latitude": 1.0, "longitude": 2.0}"#.to_string(),
        )]);

        driver.handle(&FeedEvent::Tick {
            snapshot: TelemetrySnapshot {
                started: true,
                ..Default::default()
            },
            params,
            view: ViewStatus::default(),
        });

        let outputs = driver.handle(&FeedEvent::Offroad { offroad: false });
        assert_eq!(
            outputs[0].signals,
            vec![UiSignal::RequestVisible { visible: true }]
        );
    }
}
