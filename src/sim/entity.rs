//! Scene entities and their capabilities
//!
//! Every object in the world is an [`Entity`]: an id, a kind tag and the
//! state shared by all kinds (position, visibility, hitboxes, level of detail,
//! textures). Behaviour is attached through small capability traits rather
//! than a type hierarchy.

use std::collections::BTreeMap;

use glam::{Affine3A, Vec3};
use serde::{Deserialize, Serialize};

use super::collision::Hitbox;
use super::state::GameState;
use crate::consts::{OPPONENT_COLOR, USER_COLOR};
use crate::platform::assets::TextureHandle;
use crate::platform::{Rgb, Scene};

/// Stable entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Which player something belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    User,
    Opponent,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::User, Side::Opponent];

    pub fn index(self) -> usize {
        match self {
            Side::User => 0,
            Side::Opponent => 1,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Side::User => USER_COLOR,
            Side::Opponent => OPPONENT_COLOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuButton {
    Play,
    PlayAgain,
    Home,
}

/// Racing balloon state
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub side: Side,
    pub name: String,
    /// Distance travelled along the track since the race started
    pub moved_distance: f32,
    /// Current wind layer index
    pub layer: usize,
    /// Lateral offset from the track center line
    pub lane: f32,
    /// Stopped after a collision
    pub timed_out: bool,
}

impl Vehicle {
    pub fn new(side: Side, name: &str) -> Self {
        Self {
            side,
            name: name.to_string(),
            moved_distance: 0.0,
            layer: 0,
            lane: 0.0,
            timed_out: false,
        }
    }

    /// Back to the pre-race state
    pub fn reset(&mut self) {
        self.moved_distance = 0.0;
        self.layer = 0;
        self.timed_out = false;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Cloud; costs a voucher or a time-out
    Obstacle,
    /// Voucher pickup
    Powerup,
    Vehicle(Vehicle),
    /// Start shadow on the ground
    StartPoint,
    /// Floating arrow over a side's picked vehicle
    Marker(Side),
    Button(MenuButton),
}

/// One level of a level-of-detail chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodLevel {
    /// Camera distance from which this level is used
    pub distance: f32,
    /// Mesh detail, higher is finer
    pub detail: u8,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    position: Vec3,
    /// Where the entity was spawned; resets return it here
    pub home: Vec3,
    displayed: bool,
    /// Hitboxes relative to the entity position
    shapes: Vec<Hitbox>,
    /// Hitboxes in world space
    hitboxes: Vec<Hitbox>,
    lod: Option<Vec<LodLevel>>,
    /// Detail the scene currently draws, once a level was picked
    detail: Option<u8>,
    pub textures: Vec<TextureHandle>,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, position: Vec3, shapes: Vec<Hitbox>) -> Self {
        let mut entity = Self {
            id,
            kind,
            position,
            home: position,
            displayed: false,
            hitboxes: Vec::with_capacity(shapes.len()),
            shapes,
            lod: None,
            detail: None,
            textures: Vec::new(),
        };
        entity.update_hitboxes();
        entity
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        match &self.kind {
            EntityKind::Vehicle(v) => Some(v),
            _ => None,
        }
    }

    pub fn vehicle_mut(&mut self) -> Option<&mut Vehicle> {
        match &mut self.kind {
            EntityKind::Vehicle(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_vehicle_of(&self, side: Side) -> bool {
        self.vehicle().is_some_and(|v| v.side == side)
    }

    /// Start a level-of-detail chain for this entity
    pub fn create_lod(&mut self) {
        self.lod.get_or_insert_with(Vec::new);
    }

    /// Add a level to the chain
    ///
    /// # Panics
    ///
    /// If [`Entity::create_lod`] was never called for this entity.
    pub fn add_lod(&mut self, level: LodLevel) {
        let Some(levels) = self.lod.as_mut() else {
            panic!("entity {:?} has no level-of-detail chain", self.id);
        };
        levels.push(level);
        levels.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }

    pub fn has_lod(&self) -> bool {
        self.lod.is_some()
    }

    /// Level used when seen from `distance`
    pub fn lod_at(&self, distance: f32) -> Option<LodLevel> {
        let levels = self.lod.as_ref()?;
        levels
            .iter()
            .rev()
            .find(|l| l.distance <= distance)
            .or_else(|| levels.first())
            .copied()
    }

    /// Use the level for a camera `distance` away; the scene only hears about changes
    pub fn select_lod(&mut self, distance: f32, scene: &mut dyn Scene) {
        let Some(level) = self.lod_at(distance) else {
            return;
        };
        if self.detail != Some(level.detail) {
            self.detail = Some(level.detail);
            scene.set_detail(self.id, level.detail);
        }
    }
}

/// Something that can be shown in the scene
pub trait Renderable {
    /// Show or hide; repeated calls with the same value do nothing
    fn display(&mut self, scene: &mut dyn Scene, visible: bool);
    fn is_displayed(&self) -> bool;
}

/// Something with hitboxes
pub trait Collidable {
    fn hitboxes(&self) -> &[Hitbox];
    /// Recompute world hitboxes after a move
    fn update_hitboxes(&mut self);
}

pub trait Movable {
    fn position(&self) -> Vec3;
    fn move_to(&mut self, position: Vec3);
}

/// Something with its own reaction to session state changes
pub trait StateReactive {
    fn update_state(&mut self, state: GameState, scene: &mut dyn Scene);
}

impl Renderable for Entity {
    fn display(&mut self, scene: &mut dyn Scene, visible: bool) {
        if self.displayed == visible {
            return;
        }
        self.displayed = visible;
        if visible {
            scene.attach(self);
        } else {
            scene.detach(self.id);
            self.detail = None;
        }
    }

    fn is_displayed(&self) -> bool {
        self.displayed
    }
}

impl Collidable for Entity {
    fn hitboxes(&self) -> &[Hitbox] {
        &self.hitboxes
    }

    fn update_hitboxes(&mut self) {
        let transform = Affine3A::from_translation(self.position);
        self.hitboxes.clear();
        self.hitboxes
            .extend(self.shapes.iter().map(|s| s.transformed(&transform)));
    }
}

impl Movable for Entity {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn move_to(&mut self, position: Vec3) {
        self.position = position;
        self.update_hitboxes();
    }
}

impl StateReactive for Entity {
    fn update_state(&mut self, state: GameState, scene: &mut dyn Scene) {
        use GameState as S;

        let start_point = matches!(self.kind, EntityKind::StartPoint);
        if start_point && matches!(state, S::Reset | S::Restart) {
            scene.tint(self.id, None);
        }

        let visible = match (&self.kind, state) {
            (EntityKind::Vehicle(_), S::SetupPickBalloonUser) => Some(true),
            (EntityKind::StartPoint, S::SetupPickStartingPoint) => Some(true),
            (EntityKind::StartPoint, S::Reset) => Some(false),
            (EntityKind::Obstacle | EntityKind::Powerup, S::SetupRace) => Some(true),
            (EntityKind::Obstacle | EntityKind::Powerup, S::Reset) => Some(false),
            (EntityKind::Marker(_), S::SetupPickStartingPoint | S::Reset) => Some(false),
            (EntityKind::Button(_), S::Reset) => Some(false),
            _ => None,
        };
        if let Some(visible) = visible {
            self.display(scene, visible);
        }
    }
}

/// Entity arena, iterated in id order
#[derive(Debug, Clone, Default)]
pub struct Entities {
    items: BTreeMap<EntityId, Entity>,
    next_id: u32,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: EntityKind, position: Vec3, shapes: Vec<Hitbox>) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.items.insert(id, Entity::new(id, kind, position, shapes));
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.items.get_mut(&id)
    }

    pub fn vehicle(&self, id: EntityId) -> Option<&Vehicle> {
        self.get(id).and_then(Entity::vehicle)
    }

    pub fn vehicle_mut(&mut self, id: EntityId) -> Option<&mut Vehicle> {
        self.get_mut(id).and_then(Entity::vehicle_mut)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.items.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.items.values_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Show or hide an entity if it exists
    pub fn display(&mut self, id: EntityId, scene: &mut dyn Scene, visible: bool) {
        if let Some(entity) = self.items.get_mut(&id) {
            entity.display(scene, visible);
        }
    }

    /// Move an entity and tell the scene
    pub fn place(&mut self, id: EntityId, scene: &mut dyn Scene, position: Vec3) {
        if let Some(entity) = self.items.get_mut(&id) {
            entity.move_to(position);
            scene.place(id, position);
        }
    }

    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.get(id).map(Movable::position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessScene;

    fn balloon() -> Entity {
        Entity::new(
            EntityId(1),
            EntityKind::Vehicle(Vehicle::new(Side::User, "comet")),
            Vec3::ZERO,
            vec![Hitbox::sphere(Vec3::ZERO, 0.6)],
        )
    }

    #[test]
    #[should_panic(expected = "no level-of-detail chain")]
    fn test_add_lod_without_chain_panics() {
        let mut entity = balloon();
        entity.add_lod(LodLevel {
            distance: 0.0,
            detail: 2,
        });
    }

    #[test]
    fn test_lod_selection() {
        let mut entity = balloon();
        assert_eq!(entity.lod_at(10.0), None);
        entity.create_lod();
        entity.add_lod(LodLevel {
            distance: 25.0,
            detail: 0,
        });
        entity.add_lod(LodLevel {
            distance: 0.0,
            detail: 2,
        });
        assert_eq!(entity.lod_at(5.0).map(|l| l.detail), Some(2));
        assert_eq!(entity.lod_at(30.0).map(|l| l.detail), Some(0));

        let scene = HeadlessScene::new();
        let mut handle = scene.clone();
        entity.select_lod(5.0, &mut handle);
        entity.select_lod(6.0, &mut handle);
        assert_eq!(scene.detail(EntityId(1)), Some(2));
        assert_eq!(scene.detail_changes(), 1);
        entity.select_lod(30.0, &mut handle);
        assert_eq!(scene.detail(EntityId(1)), Some(0));
        assert_eq!(scene.detail_changes(), 2);

        // Shown again after hiding, the scene is told the level anew
        entity.display(&mut handle, true);
        entity.display(&mut handle, false);
        entity.select_lod(30.0, &mut handle);
        assert_eq!(scene.detail_changes(), 3);
    }

    #[test]
    fn test_move_updates_world_hitboxes() {
        let mut entity = balloon();
        entity.move_to(Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(entity.hitboxes(), &[Hitbox::sphere(Vec3::new(0.0, 2.0, 0.0), 0.6)]);
        assert_eq!(entity.home, Vec3::ZERO);
    }

    #[test]
    fn test_display_is_idempotent() {
        let scene = HeadlessScene::new();
        let mut handle = scene.clone();
        let mut entity = balloon();
        entity.display(&mut handle, true);
        entity.display(&mut handle, true);
        assert_eq!(scene.attach_count(), 1);
        assert!(scene.is_attached(EntityId(1)));
        entity.display(&mut handle, false);
        entity.display(&mut handle, false);
        assert!(!scene.is_attached(EntityId(1)));
    }

    #[test]
    fn test_vehicles_show_when_picking_starts() {
        let mut scene = HeadlessScene::new();
        let mut entity = balloon();
        entity.update_state(GameState::SetupHomeMenu, &mut scene);
        assert!(!entity.is_displayed());
        entity.update_state(GameState::SetupPickBalloonUser, &mut scene);
        assert!(entity.is_displayed());
    }

    #[test]
    fn test_arena_ids_are_sequential() {
        let mut entities = Entities::new();
        let a = entities.spawn(EntityKind::Obstacle, Vec3::ZERO, vec![]);
        let b = entities.spawn(EntityKind::Powerup, Vec3::X, vec![]);
        assert_eq!((a, b), (EntityId(0), EntityId(1)));
        assert_eq!(entities.position(b), Some(Vec3::X));
        assert!(entities.vehicle(a).is_none());
    }
}
