//! Data-driven state machine
//!
//! Every state maps to the ordered subsystems that run while the game is in
//! it, and setup/control states name the state they hand over to at the end
//! of the tick. Steady states wait for input to move them on.

use super::state::GameState;

/// Everything the machine can ask to react to a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// Race HUD
    Displays,
    InputDispatcher,
    HomeMenu,
    /// Show the active camera
    ActiveCamera,
    /// Every camera reacts to the state
    Cameras,
    Picker,
    Planner,
    Vehicles,
    Players,
    Map,
    Shaders,
    PlayMenu,
    FinalMenu,
    Fireworks,
}

/// What happens in one state
#[derive(Debug, Clone, Copy)]
pub struct StatePlan {
    pub state: GameState,
    pub steps: &'static [Subsystem],
    pub next: Option<GameState>,
}

const fn plan(
    state: GameState,
    steps: &'static [Subsystem],
    next: Option<GameState>,
) -> StatePlan {
    StatePlan { state, steps, next }
}

use GameState as S;
use Subsystem::*;

pub const DISPATCH_TABLE: &[StatePlan] = &[
    plan(
        S::SetupHomeMenu,
        &[Displays, InputDispatcher, HomeMenu, ActiveCamera, Picker, Planner],
        Some(S::HomeMenu),
    ),
    plan(S::HomeMenu, &[], None),
    plan(
        S::SetupPickBalloonUser,
        &[HomeMenu, InputDispatcher, Planner, Picker, Vehicles, ActiveCamera],
        Some(S::PickBalloonUser),
    ),
    plan(S::PickBalloonUser, &[Shaders], None),
    plan(
        S::SetupPickBalloonOpponent,
        &[ActiveCamera, Players, Picker],
        Some(S::PickBalloonOpponent),
    ),
    plan(S::PickBalloonOpponent, &[], None),
    plan(
        S::SetupPlayMenu,
        &[Players, Picker, ActiveCamera, PlayMenu],
        Some(S::PlayMenu),
    ),
    plan(S::PlayMenu, &[Picker], None),
    plan(
        S::SetupPickStartingPoint,
        &[PlayMenu, Players, Vehicles, ActiveCamera, Planner, Map, Picker],
        Some(S::PickStartingPoint),
    ),
    plan(S::PickStartingPoint, &[Shaders], None),
    plan(
        S::SetupRace,
        &[Map, Cameras, Players, Picker, Planner, Displays],
        Some(S::Race),
    ),
    plan(S::Race, &[Displays, Cameras, Players, Shaders, Planner], None),
    plan(S::SetupPause, &[Players, Displays], Some(S::Pause)),
    plan(S::Pause, &[], None),
    plan(S::SetupUnpause, &[Players, Displays], Some(S::Race)),
    plan(
        S::SetupEndOfRace,
        &[Players, Planner, Cameras, FinalMenu, Picker, Fireworks],
        Some(S::EndOfRace),
    ),
    plan(S::EndOfRace, &[Fireworks, Shaders, Picker], None),
    plan(
        S::Reset,
        &[
            HomeMenu,
            ActiveCamera,
            Picker,
            FinalMenu,
            Fireworks,
            Displays,
            Players,
            Map,
            Planner,
        ],
        Some(S::SetupHomeMenu),
    ),
    plan(
        S::Restart,
        &[FinalMenu, Fireworks, Displays, Players, Map, Planner],
        Some(S::SetupPickStartingPoint),
    ),
];

/// The side of the game the machine drives
pub trait SubsystemHost {
    fn state(&self) -> GameState;
    fn set_state(&mut self, state: GameState);
    /// Let one subsystem react to `state`
    fn run(&mut self, subsystem: Subsystem, state: GameState);
}

#[derive(Debug, Clone, Copy)]
pub struct StateMachine {
    table: &'static [StatePlan],
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::with_table(DISPATCH_TABLE)
    }

    pub fn with_table(table: &'static [StatePlan]) -> Self {
        Self { table }
    }

    pub fn plan_for(&self, state: GameState) -> Option<&'static StatePlan> {
        self.table.iter().find(|p| p.state == state)
    }

    /// One tick: run the current state's subsystems, then take its transition
    ///
    /// Subsystems all see the state the tick started in, even if one of them
    /// moved the game on; the transition then overrides any such change.
    pub fn update<H: SubsystemHost + ?Sized>(&self, host: &mut H) {
        let state = host.state();
        let Some(plan) = self.plan_for(state) else {
            log::warn!("No plan for state {}", state);
            return;
        };

        for &subsystem in plan.steps {
            host.run(subsystem, state);
        }

        if let Some(next) = plan.next {
            log::debug!("{} -> {}", state, next);
            host.set_state(next);
        } else if host.state() != state {
            log::debug!("{} -> {}", state, host.state());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        state: GameState,
        calls: Vec<(Subsystem, GameState)>,
        /// Planner moves the game to this state when it runs
        planner_target: Option<GameState>,
    }

    impl SubsystemHost for Recorder {
        fn state(&self) -> GameState {
            self.state
        }

        fn set_state(&mut self, state: GameState) {
            self.state = state;
        }

        fn run(&mut self, subsystem: Subsystem, state: GameState) {
            self.calls.push((subsystem, state));
            if subsystem == Planner {
                if let Some(target) = self.planner_target {
                    self.state = target;
                }
            }
        }
    }

    #[test]
    fn test_every_state_has_a_plan() {
        let machine = StateMachine::new();
        for state in GameState::ALL {
            assert!(machine.plan_for(state).is_some(), "{state} has no plan");
        }
    }

    #[test]
    fn test_only_transient_states_move_on() {
        for plan in DISPATCH_TABLE {
            assert_eq!(plan.next.is_some(), plan.state.is_transient(), "{}", plan.state);
        }
    }

    #[test]
    fn test_home_menu_setup_tick() {
        let mut host = Recorder::default();
        StateMachine::new().update(&mut host);
        assert_eq!(host.state, GameState::HomeMenu);
        let order: Vec<Subsystem> = host.calls.iter().map(|c| c.0).collect();
        assert_eq!(
            order,
            vec![Displays, InputDispatcher, HomeMenu, ActiveCamera, Picker, Planner]
        );
        assert!(host.calls.iter().all(|c| c.1 == GameState::SetupHomeMenu));
    }

    #[test]
    fn test_steady_state_change_sticks() {
        let mut host = Recorder {
            state: GameState::Race,
            planner_target: Some(GameState::SetupEndOfRace),
            ..Default::default()
        };
        StateMachine::new().update(&mut host);
        assert_eq!(host.state, GameState::SetupEndOfRace);
        // Subsystems after the planner still saw Race
        assert!(host.calls.iter().all(|c| c.1 == GameState::Race));
    }

    #[test]
    fn test_missing_state_is_a_no_op() {
        static PARTIAL: &[StatePlan] = &[plan(S::SetupHomeMenu, &[Displays], Some(S::HomeMenu))];
        let machine = StateMachine::with_table(PARTIAL);
        let mut host = Recorder {
            state: GameState::Race,
            ..Default::default()
        };
        machine.update(&mut host);
        assert_eq!(host.state, GameState::Race);
        assert!(host.calls.is_empty());
    }
}
