//! Per-frame coordination
//!
//! [`Game`] owns every subsystem and the platform collaborators. One call to
//! [`Game::frame`] runs the fixed frame order:
//!
//! 1. delayed snapshot of the active camera (throttled)
//! 2. frame delta from the clock
//! 3. scene animation and particles
//! 4. input dispatch, applying every fired binding
//! 5. one state machine tick
//! 6. vehicle detail levels for the active camera, then render

use glam::Vec2;

use crate::consts::{FIRST_FRAME_DT, MAX_FRAME_DT};
use crate::input::{Fired, TriggerKind, MOUSE_CLICK, RESIZE};
use crate::platform::assets::{TextureCache, TextureLoader};
use crate::platform::{CameraMode, CameraRig, Clock, Hud, HudField, Scene};
use crate::results::RaceResults;
use crate::settings::Settings;

use super::actions::{Action, Dispatcher, Subscriber};
use super::entity::{EntityId, Movable, Renderable};
use super::fireworks::Fireworks;
use super::machine::{StateMachine, Subsystem, SubsystemHost};
use super::menus::{FinalMenu, HomeMenu, InfoDisplay, PlayMenu};
use super::picker::Picker;
use super::registry::{CollidableRegistry, PenaltyRegistry};
use super::state::GameState;
use super::world::World;

/// Session-wide values every subsystem may read or update
#[derive(Debug, Clone)]
pub struct GameContext {
    pub state: GameState,
    /// Seconds since the previous frame
    pub delta_t: f32,
    /// Seconds since the race started, frozen while paused
    pub race_time: f32,
    /// Seconds since the session started
    pub elapsed: f32,
    /// Race time the user's current time-out started
    pub player_penalty_start: f32,
    pub active_camera: CameraMode,
    pub prev_camera: CameraMode,
    pub collidables: CollidableRegistry,
    pub penalties: PenaltyRegistry,
}

impl Default for GameContext {
    fn default() -> Self {
        Self {
            state: GameState::default(),
            delta_t: 0.0,
            race_time: 0.0,
            elapsed: 0.0,
            player_penalty_start: 0.0,
            active_camera: CameraMode::ThirdPerson,
            prev_camera: CameraMode::ThirdPerson,
            collidables: CollidableRegistry::new(),
            penalties: PenaltyRegistry::new(),
        }
    }
}

/// Fires once every `interval` frames; an interval of 0 never fires
#[derive(Debug, Clone, Copy)]
pub struct FrameDelay {
    interval: u32,
    countdown: u32,
}

impl FrameDelay {
    pub fn new(interval: u32) -> Self {
        Self {
            interval,
            countdown: interval,
        }
    }

    pub fn tick(&mut self) -> bool {
        if self.interval == 0 {
            return false;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.countdown = self.interval;
            true
        } else {
            false
        }
    }
}

pub struct Game {
    pub ctx: GameContext,
    pub settings: Settings,
    pub input: Dispatcher,
    machine: StateMachine,
    pub world: World,
    pub picker: Picker,
    pub home_menu: HomeMenu,
    play_menu: PlayMenu,
    pub final_menu: FinalMenu,
    info: InfoDisplay,
    pub fireworks: Fireworks,
    pub results: RaceResults,
    frame_delay: FrameDelay,
    pub(crate) scene: Box<dyn Scene>,
    pub cameras: CameraRig,
    pub(crate) hud: Box<dyn Hud>,
    clock: Box<dyn Clock>,
    pub textures: TextureCache,
    last_time: Option<f64>,
}

impl Game {
    pub fn new(
        settings: Settings,
        scene: Box<dyn Scene>,
        cameras: CameraRig,
        hud: Box<dyn Hud>,
        clock: Box<dyn Clock>,
        loader: Box<dyn TextureLoader>,
    ) -> Self {
        let mut textures = TextureCache::new(loader);
        let world = World::standard(&settings, &mut textures);

        let mut input = Dispatcher::new();
        for mode in CameraMode::ALL {
            input.connect(Subscriber::Camera(mode), Action::Resize, RESIZE, TriggerKind::OnUp);
        }
        input.connect(Subscriber::Picker, Action::Pick, MOUSE_CLICK, TriggerKind::OnUp);

        log::info!("Session ready, {} textures requested", textures.len());

        Self {
            ctx: GameContext::default(),
            fireworks: Fireworks::from_settings(&settings),
            frame_delay: FrameDelay::new(settings.display_delay_frames),
            settings,
            input,
            machine: StateMachine::new(),
            world,
            picker: Picker::new(),
            home_menu: HomeMenu::new(),
            play_menu: PlayMenu,
            final_menu: FinalMenu::default(),
            info: InfoDisplay,
            results: RaceResults::new(),
            scene,
            cameras,
            hud,
            clock,
            textures,
            last_time: None,
        }
    }

    pub fn state(&self) -> GameState {
        self.ctx.state
    }

    pub fn active_camera(&self) -> CameraMode {
        self.ctx.active_camera
    }

    /// Run one frame
    pub fn frame(&mut self) {
        if self.frame_delay.tick() {
            self.cameras.get_mut(self.ctx.active_camera).save_frame();
        }

        let now = self.clock.now();
        let dt = match self.last_time {
            Some(last) => ((now - last) as f32).clamp(0.0, MAX_FRAME_DT),
            None => FIRST_FRAME_DT,
        };
        self.last_time = Some(now);
        self.ctx.delta_t = dt;
        self.ctx.elapsed += dt;

        self.scene.advance(dt);

        for fired in self.input.update() {
            self.apply(fired);
        }

        let machine = self.machine;
        machine.update(self);

        self.update_detail();
        self.cameras.get_mut(self.ctx.active_camera).render();
    }

    /// Every shown vehicle gets the detail level for its distance to the active camera
    fn update_detail(&mut self) {
        let eye = self.cameras.get(self.ctx.active_camera).position();
        for &id in &self.world.vehicles {
            let Some(entity) = self.world.entities.get_mut(id) else {
                continue;
            };
            if entity.is_displayed() {
                let distance = entity.position().distance(eye);
                entity.select_lod(distance, self.scene.as_mut());
            }
        }
    }

    fn transition(&mut self, next: GameState) {
        log::debug!("{} -> {} (input)", self.ctx.state, next);
        self.ctx.state = next;
    }

    /// Carry out one fired binding
    fn apply(&mut self, fired: Fired<Subscriber, Action>) {
        let state = self.ctx.state;
        match fired.action {
            Action::AdvanceState => {
                if let Some(next) = state.confirm_target() {
                    self.transition(next);
                }
            }
            Action::ConfirmPick => {
                if self.picker.picked().is_none() {
                    log::debug!("Nothing picked yet");
                } else if let Some(next) = state.confirm_target() {
                    self.transition(next);
                }
            }
            Action::Reset => self.transition(GameState::Reset),
            Action::ToggleDebugCamera => self.toggle_debug_camera(),
            Action::UseCamera(mode) => self.set_active_camera(mode),
            Action::TogglePause => {
                if let Some(next) = state.pause_target() {
                    self.transition(next);
                }
            }
            Action::WriteName => {
                if self.home_menu.write(&fired.key, self.settings.name_max_len) {
                    self.hud.show(HudField::Name, self.home_menu.name());
                }
            }
            Action::Pick => {
                let ray = self
                    .cameras
                    .get(self.ctx.active_camera)
                    .screen_ray(self.input.pointer());
                self.picker.pick(&ray, &self.world.entities);
                if !state.is_transient() {
                    self.picker
                        .update_state(state, &mut self.ctx, &mut self.world, self.scene.as_mut());
                }
            }
            Action::Resize => {
                if let Subscriber::Camera(mode) = fired.subscriber {
                    self.cameras.get_mut(mode).on_resize(self.input.viewport());
                }
            }
            Action::ChangeLayer(delta) => self.world.change_layer(delta),
            Action::DebugMove(motion) => {
                self.cameras
                    .get_mut(CameraMode::Debug)
                    .nudge(motion, self.ctx.delta_t);
            }
        }
    }

    /// Window pixel position of an entity as seen by the active camera
    pub fn screen_position(&self, id: EntityId) -> Option<Vec2> {
        let position = self.world.entities.position(id)?;
        let ndc = self
            .cameras
            .get(self.ctx.active_camera)
            .world_to_screen(position);
        let size = self.input.viewport().max(Vec2::ONE);
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * size.x,
            (1.0 - ndc.y) * 0.5 * size.y,
        ))
    }
}

impl SubsystemHost for Game {
    fn state(&self) -> GameState {
        self.ctx.state
    }

    fn set_state(&mut self, state: GameState) {
        self.ctx.state = state;
    }

    fn run(&mut self, subsystem: Subsystem, state: GameState) {
        match subsystem {
            Subsystem::Displays => {
                self.info
                    .update_state(state, &self.ctx, &self.world, self.hud.as_mut())
            }
            Subsystem::InputDispatcher => self.input.update_state(state),
            Subsystem::HomeMenu => {
                self.home_menu
                    .update_state(state, &mut self.input, self.hud.as_mut())
            }
            Subsystem::ActiveCamera => {
                let camera = self.cameras.get_mut(self.ctx.active_camera);
                camera.display(true);
                camera.update_state(state);
            }
            Subsystem::Cameras => {
                let focus = self.world.camera_focus();
                self.cameras.for_each_mut(|camera| {
                    camera.follow(focus);
                    camera.update_state(state);
                });
                if state == GameState::SetupEndOfRace {
                    let winner = self
                        .world
                        .winner(self.settings.laps_to_win)
                        .and_then(|side| self.world.player(side).vehicle)
                        .and_then(|id| self.world.entities.position(id));
                    if let Some(position) = winner {
                        self.cameras
                            .get_mut(CameraMode::ThirdPerson)
                            .focus(position);
                    }
                }
            }
            Subsystem::Picker => {
                self.picker
                    .update_state(state, &mut self.ctx, &mut self.world, self.scene.as_mut())
            }
            Subsystem::Planner => self.run_planner(state),
            Subsystem::Vehicles => {
                self.world
                    .update_vehicles(state, &mut self.ctx, self.scene.as_mut())
            }
            Subsystem::Players => {
                let picked = self.picker.picked();
                self.world.update_players(
                    state,
                    &mut self.ctx,
                    &mut self.input,
                    picked,
                    self.scene.as_mut(),
                    &self.settings,
                );
            }
            Subsystem::Map => self.world.update_map(state, &mut self.ctx, self.scene.as_mut()),
            Subsystem::Shaders => self.scene.update_shaders(self.ctx.elapsed),
            Subsystem::PlayMenu => {
                self.play_menu
                    .update_state(state, &mut self.world, self.scene.as_mut())
            }
            Subsystem::FinalMenu => self.final_menu.update_state(
                state,
                &self.ctx,
                &mut self.world,
                self.home_menu.name(),
                self.settings.laps_to_win,
                &mut self.results,
                self.hud.as_mut(),
                self.scene.as_mut(),
            ),
            Subsystem::Fireworks => {
                self.fireworks
                    .update_state(state, self.ctx.delta_t, self.scene.as_mut())
            }
        }
    }
}
