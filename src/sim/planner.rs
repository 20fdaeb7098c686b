//! Session planner
//!
//! Owns the session-level key bindings and the camera selection protocol,
//! runs the race clock and decides when the race is over.

use crate::input::TriggerKind;
use crate::platform::CameraMode;

use super::actions::{Action, DEBUG_CONTROLS, Subscriber};
use super::entity::Side;
use super::race;
use super::state::GameState;
use super::tick::Game;

const CONFIRM_KEY: &str = "enter";
const RESET_KEY: &str = "escape";
const DEBUG_KEY: &str = "0";
const FIRST_PERSON_KEY: &str = "1";
const THIRD_PERSON_KEY: &str = "3";
const PAUSE_KEY: &str = " ";

const PLANNER: Subscriber = Subscriber::Planner;
const DEBUG_CAMERA: Subscriber = Subscriber::Camera(CameraMode::Debug);

impl Game {
    pub(crate) fn run_planner(&mut self, state: GameState) {
        use GameState as S;
        use TriggerKind::{OnDown, OnUp};

        match state {
            S::SetupHomeMenu => {
                self.input.connect(PLANNER, Action::ToggleDebugCamera, DEBUG_KEY, OnDown);
                self.input.connect(PLANNER, Action::AdvanceState, CONFIRM_KEY, OnUp);
            }
            S::SetupPickBalloonUser => {
                self.input.disconnect(&PLANNER, CONFIRM_KEY);
                self.input.connect(PLANNER, Action::ConfirmPick, CONFIRM_KEY, OnUp);
                self.input.connect(PLANNER, Action::Reset, RESET_KEY, OnUp);
                for side in Side::BOTH {
                    self.world.player_mut(side).clear();
                }
                self.set_active_camera(CameraMode::ThirdPerson);
            }
            S::SetupRace => {
                self.input.disconnect(&PLANNER, CONFIRM_KEY);
                self.input.connect(
                    PLANNER,
                    Action::UseCamera(CameraMode::FirstPerson),
                    FIRST_PERSON_KEY,
                    OnDown,
                );
                self.input.connect(
                    PLANNER,
                    Action::UseCamera(CameraMode::ThirdPerson),
                    THIRD_PERSON_KEY,
                    OnDown,
                );
                self.input.connect(PLANNER, Action::TogglePause, PAUSE_KEY, OnUp);
                self.ctx.race_time = 0.0;
                self.ctx.player_penalty_start = 0.0;
                log::info!("Race started");
            }
            S::Race => {
                self.ctx.race_time += self.ctx.delta_t;
                race::handle_out_of_track(&mut self.ctx, &mut self.world, self.scene.as_mut());
                race::handle_collisions(
                    &mut self.ctx,
                    &mut self.world,
                    self.scene.as_mut(),
                    &self.settings,
                );
                if let Some(winner) = self.world.winner(self.settings.laps_to_win) {
                    log::info!("{:?} wins after {:.2}s", winner, self.ctx.race_time);
                    self.ctx.state = S::SetupEndOfRace;
                }
            }
            S::SetupEndOfRace => {
                for key in [DEBUG_KEY, FIRST_PERSON_KEY, THIRD_PERSON_KEY, PAUSE_KEY] {
                    self.input.disconnect(&PLANNER, key);
                }
                if self.ctx.active_camera != CameraMode::Debug {
                    self.set_active_camera(CameraMode::ThirdPerson);
                }
            }
            S::Reset => {
                self.world.rebuild_vehicles(&mut self.ctx, self.scene.as_mut());
                for key in [
                    CONFIRM_KEY,
                    DEBUG_KEY,
                    FIRST_PERSON_KEY,
                    THIRD_PERSON_KEY,
                    PAUSE_KEY,
                    RESET_KEY,
                ] {
                    self.input.disconnect(&PLANNER, key);
                }
                self.reset_session();
            }
            S::Restart => {
                self.restart_session();
                self.input.connect(PLANNER, Action::ConfirmPick, CONFIRM_KEY, OnUp);
                self.input.connect(PLANNER, Action::ToggleDebugCamera, DEBUG_KEY, OnDown);
            }
            _ => {}
        }
    }

    /// Hide the current camera, remember it and show `mode`
    pub fn set_active_camera(&mut self, mode: CameraMode) {
        let current = self.ctx.active_camera;
        if current == mode {
            self.cameras.get_mut(mode).display(true);
            return;
        }
        self.cameras.get_mut(current).display(false);
        if current == CameraMode::Debug {
            for (key, _) in DEBUG_CONTROLS {
                self.input.disconnect(&DEBUG_CAMERA, key);
            }
        }
        self.ctx.prev_camera = current;
        self.ctx.active_camera = mode;
        self.cameras.get_mut(mode).display(true);
        log::debug!("Camera {:?} -> {:?}", current, mode);
    }

    /// Fly the debug camera from where the current one is, or go back
    pub fn toggle_debug_camera(&mut self) {
        if self.ctx.active_camera == CameraMode::Debug {
            let back = self.ctx.prev_camera;
            self.set_active_camera(back);
            return;
        }

        let from = self.cameras.get(self.ctx.active_camera);
        let (position, target) = (from.position(), from.target());
        self.set_active_camera(CameraMode::Debug);
        let debug = self.cameras.get_mut(CameraMode::Debug);
        debug.move_to(position);
        debug.look_at(target);
        for (key, motion) in DEBUG_CONTROLS {
            self.input
                .connect(DEBUG_CAMERA, Action::DebugMove(motion), key, TriggerKind::WhileHeld);
        }
    }

    /// Back to a clean session: nothing penalized, nothing collidable
    fn reset_session(&mut self) {
        for id in self.ctx.penalties.drain() {
            self.world.readmit(id, &mut self.ctx, self.scene.as_mut());
        }
        self.ctx.collidables.clear();
        for &id in self.world.obstacles.iter().chain(&self.world.powerups) {
            self.world.entities.display(id, self.scene.as_mut(), false);
        }
        self.ctx.race_time = 0.0;
        self.ctx.player_penalty_start = 0.0;
        self.set_active_camera(CameraMode::ThirdPerson);
        self.ctx.prev_camera = CameraMode::ThirdPerson;
        log::info!("Session reset");
    }

    /// Same players, fresh race
    fn restart_session(&mut self) {
        for id in self.ctx.penalties.drain() {
            self.world.readmit(id, &mut self.ctx, self.scene.as_mut());
        }
        self.ctx.race_time = 0.0;
        self.ctx.player_penalty_start = 0.0;
        log::info!("Session restarted");
    }
}
