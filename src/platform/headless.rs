//! In-memory collaborators
//!
//! Used by the native binary and by tests. Scene, HUD and texture loader are
//! cheap to clone and share their state, so a caller can keep a handle while
//! the game owns the boxed copy.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use glam::{Mat4, Quat, Vec2, Vec3};

use super::assets::{TextureHandle, TextureLoader};
use super::{Camera, CameraMode, Clock, Hud, HudField, Rgb, Scene};
use crate::results::RaceResult;
use crate::sim::actions::DebugMotion;
use crate::sim::collision::Ray;
use crate::sim::entity::{Entity, EntityId};
use crate::sim::GameState;

/// A firework burst currently in the air
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    pub origin: Vec3,
    pub color: Rgb,
    pub age: f32,
}

/// How long a burst stays visible
const BURST_LIFETIME: f32 = 1.5;

#[derive(Debug, Default)]
struct SceneLog {
    attached: BTreeSet<EntityId>,
    attach_count: usize,
    positions: BTreeMap<EntityId, Vec3>,
    tints: BTreeMap<EntityId, Rgb>,
    details: BTreeMap<EntityId, u8>,
    detail_changes: usize,
    bursts: Vec<Burst>,
    bursts_launched: usize,
    animation_time: f32,
    shader_time: f32,
}

/// Scene that records what would be drawn
#[derive(Debug, Clone, Default)]
pub struct HeadlessScene {
    log: Rc<RefCell<SceneLog>>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self, id: EntityId) -> bool {
        self.log.borrow().attached.contains(&id)
    }

    /// Total attach calls so far
    pub fn attach_count(&self) -> usize {
        self.log.borrow().attach_count
    }

    pub fn attached(&self) -> Vec<EntityId> {
        self.log.borrow().attached.iter().copied().collect()
    }

    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.log.borrow().positions.get(&id).copied()
    }

    pub fn tint_of(&self, id: EntityId) -> Option<Rgb> {
        self.log.borrow().tints.get(&id).copied()
    }

    pub fn detail(&self, id: EntityId) -> Option<u8> {
        self.log.borrow().details.get(&id).copied()
    }

    /// Total detail switches so far
    pub fn detail_changes(&self) -> usize {
        self.log.borrow().detail_changes
    }

    pub fn bursts(&self) -> Vec<Burst> {
        self.log.borrow().bursts.clone()
    }

    pub fn bursts_launched(&self) -> usize {
        self.log.borrow().bursts_launched
    }

    pub fn shader_time(&self) -> f32 {
        self.log.borrow().shader_time
    }
}

impl Scene for HeadlessScene {
    fn attach(&mut self, entity: &Entity) {
        use crate::sim::entity::Movable;
        let mut log = self.log.borrow_mut();
        log.attached.insert(entity.id);
        log.attach_count += 1;
        log.positions.insert(entity.id, entity.position());
    }

    fn detach(&mut self, id: EntityId) {
        self.log.borrow_mut().attached.remove(&id);
    }

    fn place(&mut self, id: EntityId, position: Vec3) {
        self.log.borrow_mut().positions.insert(id, position);
    }

    fn tint(&mut self, id: EntityId, color: Option<Rgb>) {
        let mut log = self.log.borrow_mut();
        match color {
            Some(color) => {
                log.tints.insert(id, color);
            }
            None => {
                log.tints.remove(&id);
            }
        }
    }

    fn set_detail(&mut self, id: EntityId, detail: u8) {
        let mut log = self.log.borrow_mut();
        log.details.insert(id, detail);
        log.detail_changes += 1;
    }

    fn advance(&mut self, dt: f32) {
        let mut log = self.log.borrow_mut();
        log.animation_time += dt;
        for burst in log.bursts.iter_mut() {
            burst.age += dt;
        }
        log.bursts.retain(|b| b.age < BURST_LIFETIME);
    }

    fn update_shaders(&mut self, elapsed: f32) {
        self.log.borrow_mut().shader_time = elapsed;
    }

    fn burst(&mut self, origin: Vec3, color: Rgb) {
        let mut log = self.log.borrow_mut();
        log.bursts.push(Burst {
            origin,
            color,
            age: 0.0,
        });
        log.bursts_launched += 1;
    }

    fn clear_bursts(&mut self) {
        self.log.borrow_mut().bursts.clear();
    }
}

/// Perspective camera with fixed per-state framing
#[derive(Debug, Clone)]
pub struct HeadlessCamera {
    mode: CameraMode,
    position: Vec3,
    target: Vec3,
    followed: Option<Vec3>,
    visible: bool,
    /// Vertical field of view (radians)
    fov_y: f32,
    aspect: f32,
    pub frames_rendered: u64,
    pub frames_saved: u64,
}

impl HeadlessCamera {
    const MOVE_SPEED: f32 = 8.0;
    const TURN_SPEED: f32 = 1.5;

    pub fn new(mode: CameraMode) -> Self {
        Self {
            mode,
            position: Vec3::new(0.0, 6.0, 24.0),
            target: Vec3::new(0.0, 2.0, 0.0),
            followed: None,
            visible: mode == CameraMode::ThirdPerson,
            fov_y: 50f32.to_radians(),
            aspect: 16.0 / 9.0,
            frames_rendered: 0,
            frames_saved: 0,
        }
    }

    fn frame(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    fn view_projection(&self) -> Mat4 {
        let projection = Mat4::perspective_rh(self.fov_y, self.aspect, 0.1, 200.0);
        let view = Mat4::look_at_rh(self.position, self.target, Vec3::Y);
        projection * view
    }

    fn chase(&mut self) {
        let Some(subject) = self.followed else {
            return;
        };
        match self.mode {
            CameraMode::ThirdPerson => {
                self.frame(subject + Vec3::new(0.0, 3.0, 8.0), subject)
            }
            CameraMode::FirstPerson => self.frame(
                subject + Vec3::new(0.0, 0.5, 0.0),
                subject + Vec3::new(0.0, 0.5, -5.0),
            ),
            CameraMode::Debug => {}
        }
    }
}

impl Camera for HeadlessCamera {
    fn mode(&self) -> CameraMode {
        self.mode
    }

    fn display(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_displayed(&self) -> bool {
        self.visible
    }

    fn render(&mut self) {
        if self.visible {
            self.frames_rendered += 1;
        }
    }

    fn save_frame(&mut self) {
        self.frames_saved += 1;
    }

    fn update_state(&mut self, state: GameState) {
        if self.mode == CameraMode::Debug {
            return;
        }
        match state {
            GameState::SetupHomeMenu | GameState::Reset => {
                self.frame(Vec3::new(0.0, 6.0, 24.0), Vec3::new(0.0, 2.0, 0.0))
            }
            GameState::SetupPickBalloonUser | GameState::SetupPickBalloonOpponent => {
                self.frame(Vec3::new(0.0, 10.0, 14.0), Vec3::new(0.0, 0.0, -14.0))
            }
            GameState::SetupPlayMenu | GameState::SetupEndOfRace => {
                self.frame(Vec3::new(0.0, 16.0, 28.0), Vec3::new(0.0, 14.0, 10.0))
            }
            GameState::SetupPickStartingPoint => {
                self.frame(Vec3::new(0.0, 14.0, 12.0), Vec3::ZERO)
            }
            GameState::SetupRace | GameState::Race => self.chase(),
            _ => {}
        }
    }

    fn follow(&mut self, target: Option<Vec3>) {
        self.followed = target;
    }

    fn focus(&mut self, target: Vec3) {
        self.target = target;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn target(&self) -> Vec3 {
        self.target
    }

    fn move_to(&mut self, position: Vec3) {
        self.position = position;
    }

    fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    fn on_resize(&mut self, viewport: Vec2) {
        if viewport.y > 0.0 {
            self.aspect = viewport.x / viewport.y;
        }
    }

    fn nudge(&mut self, motion: DebugMotion, dt: f32) {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let step = Self::MOVE_SPEED * dt;
        let offset = match motion {
            DebugMotion::Forward => forward * step,
            DebugMotion::Back => -forward * step,
            DebugMotion::Left => -right * step,
            DebugMotion::Right => right * step,
            DebugMotion::Up => Vec3::Y * step,
            DebugMotion::Down => -Vec3::Y * step,
            DebugMotion::YawLeft | DebugMotion::YawRight => {
                let sign = if motion == DebugMotion::YawLeft { 1.0 } else { -1.0 };
                let rotation = Quat::from_rotation_y(sign * Self::TURN_SPEED * dt);
                self.target = self.position + rotation * (self.target - self.position);
                return;
            }
            DebugMotion::PitchUp | DebugMotion::PitchDown => {
                let sign = if motion == DebugMotion::PitchUp { 1.0 } else { -1.0 };
                let rotation = Quat::from_axis_angle(right, sign * Self::TURN_SPEED * dt);
                self.target = self.position + rotation * (self.target - self.position);
                return;
            }
        };
        self.position += offset;
        self.target += offset;
    }

    fn world_to_screen(&self, point: Vec3) -> Vec2 {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w.abs() < f32::EPSILON {
            return Vec2::ZERO;
        }
        Vec2::new(clip.x / clip.w, clip.y / clip.w)
    }

    fn screen_ray(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::through(self.position, far)
    }
}

#[derive(Debug, Default)]
struct HudLog {
    fields: BTreeMap<HudField, String>,
    result: Option<RaceResult>,
}

/// HUD that keeps the last text of every field
#[derive(Debug, Clone, Default)]
pub struct HeadlessHud {
    log: Rc<RefCell<HudLog>>,
}

impl HeadlessHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, field: HudField) -> Option<String> {
        self.log.borrow().fields.get(&field).cloned()
    }

    pub fn result(&self) -> Option<RaceResult> {
        self.log.borrow().result.clone()
    }
}

impl Hud for HeadlessHud {
    fn show(&mut self, field: HudField, text: &str) {
        self.log.borrow_mut().fields.insert(field, text.to_string());
    }

    fn show_result(&mut self, result: Option<&RaceResult>) {
        if let Some(result) = result {
            log::info!("{}", result.headline());
        }
        self.log.borrow_mut().result = result.cloned();
    }
}

/// Clock that advances a fixed step on every read
#[derive(Debug, Clone)]
pub struct StepClock {
    now: f64,
    step: f64,
}

impl StepClock {
    pub fn new(step: f64) -> Self {
        Self { now: 0.0, step }
    }
}

impl Clock for StepClock {
    fn now(&mut self) -> f64 {
        let now = self.now;
        self.now += self.step;
        now
    }
}

/// Wall clock
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Loader that queues requests until [`HeadlessTextureLoader::complete_all`]
#[derive(Debug, Clone, Default)]
pub struct HeadlessTextureLoader {
    queue: Rc<RefCell<Vec<TextureHandle>>>,
}

impl HeadlessTextureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every queued request; returns how many were resolved
    pub fn complete_all(&self) -> usize {
        let handles: Vec<TextureHandle> = self.queue.borrow_mut().drain(..).collect();
        for handle in &handles {
            handle.fulfil(256, 256);
        }
        handles.len()
    }
}

impl TextureLoader for HeadlessTextureLoader {
    fn request(&mut self, handle: TextureHandle) {
        log::debug!("Loading texture {}", handle.name());
        self.queue.borrow_mut().push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_ray_passes_through_projected_point() {
        let mut camera = HeadlessCamera::new(CameraMode::ThirdPerson);
        camera.on_resize(Vec2::new(1280.0, 720.0));
        camera.update_state(GameState::SetupPickBalloonUser);

        let point = Vec3::new(-19.0, 0.0, -12.0);
        let ndc = camera.world_to_screen(point);
        let ray = camera.screen_ray(ndc);
        let along = (point - ray.origin).dot(ray.direction);
        let closest = ray.at(along);
        assert!(closest.distance(point) < 1e-2, "{closest:?} vs {point:?}");
    }

    #[test]
    fn test_third_person_chases_followed_point() {
        let mut camera = HeadlessCamera::new(CameraMode::ThirdPerson);
        camera.follow(Some(Vec3::new(5.0, 2.0, -3.0)));
        camera.update_state(GameState::Race);
        assert_eq!(camera.target(), Vec3::new(5.0, 2.0, -3.0));
        assert_eq!(camera.position(), Vec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn test_debug_camera_ignores_states_and_flies() {
        let mut camera = HeadlessCamera::new(CameraMode::Debug);
        camera.move_to(Vec3::ZERO);
        camera.look_at(Vec3::NEG_Z);
        camera.update_state(GameState::SetupPlayMenu);
        assert_eq!(camera.position(), Vec3::ZERO);

        camera.nudge(DebugMotion::Forward, 0.5);
        assert!((camera.position() - Vec3::new(0.0, 0.0, -4.0)).length() < 1e-5);
        camera.nudge(DebugMotion::Up, 0.25);
        assert!((camera.position().y - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_step_clock() {
        let mut clock = StepClock::new(0.5);
        assert_eq!(clock.now(), 0.0);
        assert_eq!(clock.now(), 0.5);
    }

    #[test]
    fn test_bursts_fade() {
        let mut scene = HeadlessScene::new();
        scene.burst(Vec3::ZERO, 0xFF00FF);
        scene.advance(1.0);
        assert_eq!(scene.bursts().len(), 1);
        scene.advance(1.0);
        assert!(scene.bursts().is_empty());
        assert_eq!(scene.bursts_launched(), 1);
    }
}
