//! Route / instruction state machine.

use contracts::{EtaPayload, Instruction, OverlayState};

/// Navigation route lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouteState {
    /// No route shown
    #[default]
    Idle,
    /// Route applied, instructions valid
    Loaded,
    /// Destination set but the latest instruction was invalid
    RoutingProblem,
}

impl RouteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loaded => "loaded",
            Self::RoutingProblem => "routing_problem",
        }
    }
}

/// Result of feeding an instruction message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionOutcome {
    /// Valid instruction, overlays should be refreshed
    Updated,
    /// Invalid instruction, the route must be cleared
    Cleared,
}

/// Route state plus the overlay payloads it owns
#[derive(Debug, Clone, Default)]
pub struct RouteMachine {
    state: RouteState,
    eta: Option<EtaPayload>,
    instruction: Option<Instruction>,
}

impl RouteMachine {
    pub fn state(&self) -> RouteState {
        self.state
    }

    pub fn routing_problem(&self) -> bool {
        self.state == RouteState::RoutingProblem
    }

    /// A non-empty route was applied to the surface
    ///
    /// Moves `Idle` to `Loaded` only. A routing problem is decided by
    /// instruction validity alone and is left for the next instruction to
    /// clear, even when a fresh route arrives in the meantime.
    pub fn route_applied(&mut self) {
        if self.state == RouteState::Idle {
            self.state = RouteState::Loaded;
        }
    }

    /// Feed an instruction message
    ///
    /// A valid instruction always clears a routing problem. An invalid one
    /// clears the route and is a routing problem only while a destination
    /// is set.
    pub fn on_instruction(
        &mut self,
        valid: bool,
        instruction: &Instruction,
        has_destination: bool,
    ) -> InstructionOutcome {
        if valid {
            self.state = RouteState::Loaded;
            self.eta = Some(EtaPayload::from(instruction));
            InstructionOutcome::Updated
        } else {
            self.clear();
            if has_destination {
                self.state = RouteState::RoutingProblem;
            }
            InstructionOutcome::Cleared
        }
    }

    /// Show turn-by-turn content (only done while the pose is valid)
    pub fn show_instruction(&mut self, instruction: &Instruction) {
        self.instruction = Some(instruction.clone());
    }

    /// Hide the instruction panel without touching route state
    pub fn hide_instruction(&mut self) {
        self.instruction = None;
    }

    /// Back to `Idle`, dropping ETA and instruction payloads
    pub fn clear(&mut self) {
        self.state = RouteState::Idle;
        self.eta = None;
        self.instruction = None;
    }

    pub fn eta(&self) -> Option<EtaPayload> {
        self.eta
    }

    pub fn instruction(&self) -> Option<&Instruction> {
        self.instruction.as_ref()
    }
}

/// Overlay as a total function of its three inputs
pub fn overlay_state(loaded_once: bool, location_valid: bool, routing_problem: bool) -> OverlayState {
    if !loaded_once {
        OverlayState::Loading
    } else if !location_valid {
        OverlayState::WaitingForGps
    } else if routing_problem {
        OverlayState::WaitingForRoute
    } else {
        OverlayState::Normal
    }
}
