//! Platform abstraction layer
//!
//! The session core talks to rendering, cameras, the HUD and time only
//! through the traits in this module:
//! - `Scene`: attaching/detaching entities, tints, detail levels, particles
//!   and shader time
//! - `Camera`: per-state framing, picking rays, rendering
//! - `Hud`: text fields and the result screen
//! - `Clock`: monotonic seconds
//!
//! `headless` implements all of them in memory for the native binary and
//! tests; the browser build swaps in a DOM HUD and `performance.now()`.

pub mod assets;
pub mod headless;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::results::RaceResult;
use crate::sim::actions::DebugMotion;
use crate::sim::collision::Ray;
use crate::sim::entity::{Entity, EntityId};
use crate::sim::GameState;

/// Color as 0xRRGGBB
pub type Rgb = u32;

/// Rendering collaborator
pub trait Scene {
    fn attach(&mut self, entity: &Entity);
    fn detach(&mut self, id: EntityId);
    fn place(&mut self, id: EntityId, position: Vec3);
    /// Tint an entity, `None` restores its own colors
    fn tint(&mut self, id: EntityId, color: Option<Rgb>);
    /// Draw an entity with another level of detail (higher is finer)
    fn set_detail(&mut self, id: EntityId, detail: u8);
    /// Advance animations and particles
    fn advance(&mut self, dt: f32);
    /// Push the elapsed time into time-driven materials
    fn update_shaders(&mut self, elapsed: f32);
    fn burst(&mut self, origin: Vec3, color: Rgb);
    fn clear_bursts(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraMode {
    ThirdPerson,
    FirstPerson,
    /// Free-flying camera toggled with `0`
    Debug,
}

impl CameraMode {
    pub const ALL: [CameraMode; 3] = [
        CameraMode::ThirdPerson,
        CameraMode::FirstPerson,
        CameraMode::Debug,
    ];
}

pub trait Camera {
    fn mode(&self) -> CameraMode;
    fn display(&mut self, visible: bool);
    fn is_displayed(&self) -> bool;
    fn render(&mut self);
    /// Keep a copy of the current frame for delayed display
    fn save_frame(&mut self);
    fn update_state(&mut self, state: GameState);
    /// Point of interest to track, usually the user's vehicle
    fn follow(&mut self, target: Option<Vec3>);
    fn focus(&mut self, target: Vec3);
    fn position(&self) -> Vec3;
    fn target(&self) -> Vec3;
    fn move_to(&mut self, position: Vec3);
    fn look_at(&mut self, target: Vec3);
    fn on_resize(&mut self, viewport: Vec2);
    fn nudge(&mut self, motion: DebugMotion, dt: f32);
    /// Project a world point to normalized device coordinates
    fn world_to_screen(&self, point: Vec3) -> Vec2;
    /// Ray from the camera through a point in normalized device coordinates
    fn screen_ray(&self, ndc: Vec2) -> Ray;
}

/// The three cameras the session switches between
pub struct CameraRig {
    third_person: Box<dyn Camera>,
    first_person: Box<dyn Camera>,
    debug: Box<dyn Camera>,
}

impl CameraRig {
    pub fn new(
        third_person: Box<dyn Camera>,
        first_person: Box<dyn Camera>,
        debug: Box<dyn Camera>,
    ) -> Self {
        Self {
            third_person,
            first_person,
            debug,
        }
    }

    pub fn headless() -> Self {
        use headless::HeadlessCamera;
        Self::new(
            Box::new(HeadlessCamera::new(CameraMode::ThirdPerson)),
            Box::new(HeadlessCamera::new(CameraMode::FirstPerson)),
            Box::new(HeadlessCamera::new(CameraMode::Debug)),
        )
    }

    pub fn get(&self, mode: CameraMode) -> &dyn Camera {
        match mode {
            CameraMode::ThirdPerson => self.third_person.as_ref(),
            CameraMode::FirstPerson => self.first_person.as_ref(),
            CameraMode::Debug => self.debug.as_ref(),
        }
    }

    pub fn get_mut(&mut self, mode: CameraMode) -> &mut dyn Camera {
        match mode {
            CameraMode::ThirdPerson => self.third_person.as_mut(),
            CameraMode::FirstPerson => self.first_person.as_mut(),
            CameraMode::Debug => self.debug.as_mut(),
        }
    }

    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut dyn Camera)) {
        f(self.third_person.as_mut());
        f(self.first_person.as_mut());
        f(self.debug.as_mut());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HudField {
    Name,
    Time,
    Status,
    Laps,
    Vouchers,
}

impl HudField {
    /// DOM element id in the web build
    pub fn element_id(self) -> &'static str {
        match self {
            HudField::Name => "hud-name",
            HudField::Time => "hud-time",
            HudField::Status => "hud-status",
            HudField::Laps => "hud-laps",
            HudField::Vouchers => "hud-vouchers",
        }
    }
}

pub trait Hud {
    fn show(&mut self, field: HudField, text: &str);
    /// Show the final screen, or hide it with `None`
    fn show_result(&mut self, result: Option<&RaceResult>);
}

/// Monotonic time source in seconds
pub trait Clock {
    fn now(&mut self) -> f64;
}
