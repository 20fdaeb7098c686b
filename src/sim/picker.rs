//! Pointer picking
//!
//! Each picking state enables a small set of entities; a click casts a ray
//! from the active camera and selects the nearest enabled, visible entity it
//! hits. What a pick means depends on the state it happens in.

use crate::consts::{MARKER_HEIGHT, PICK_FAR, PICK_NEAR, USER_COLOR};
use crate::platform::Scene;

use super::collision::Ray;
use super::entity::{Collidable, Entities, EntityId, EntityKind, Renderable, Side};
use super::state::GameState;
use super::tick::GameContext;
use super::world::World;

#[derive(Debug, Clone, Default)]
pub struct Picker {
    pickable: Vec<EntityId>,
    picked: Option<EntityId>,
    previous: Option<EntityId>,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.pickable.clear();
        self.picked = None;
        self.previous = None;
    }

    pub fn enable(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        for id in ids {
            if !self.pickable.contains(&id) {
                self.pickable.push(id);
            }
        }
    }

    pub fn is_pickable(&self, id: EntityId) -> bool {
        self.pickable.contains(&id)
    }

    pub fn picked(&self) -> Option<EntityId> {
        self.picked
    }

    pub fn previous(&self) -> Option<EntityId> {
        self.previous
    }

    /// Select the nearest pickable entity hit by `ray`
    ///
    /// A miss keeps the current selection.
    pub fn pick(&mut self, ray: &Ray, entities: &Entities) -> Option<EntityId> {
        let hit = self
            .pickable
            .iter()
            .filter_map(|&id| {
                let entity = entities.get(id)?;
                if !entity.is_displayed() {
                    return None;
                }
                entity
                    .hitboxes()
                    .iter()
                    .filter_map(|h| h.ray_distance(ray))
                    .filter(|d| (PICK_NEAR..=PICK_FAR).contains(d))
                    .min_by(f32::total_cmp)
                    .map(|d| (id, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);

        if let Some(id) = hit {
            log::debug!("Picked {:?}", id);
            self.previous = self.picked;
            self.picked = Some(id);
        }
        hit
    }

    pub fn update_state(
        &mut self,
        state: GameState,
        ctx: &mut GameContext,
        world: &mut World,
        scene: &mut dyn Scene,
    ) {
        use GameState as S;

        match state {
            S::SetupHomeMenu | S::SetupRace | S::Reset => self.clear(),
            S::SetupPickBalloonUser => {
                self.clear();
                self.enable_vehicles(Side::User, world);
                for side in Side::BOTH {
                    let marker = world.player(side).marker;
                    world.entities.display(marker, scene, false);
                }
            }
            S::PickBalloonUser => self.mark(Side::User, world, scene),
            S::SetupPickBalloonOpponent => {
                self.clear();
                self.enable_vehicles(Side::Opponent, world);
            }
            S::PickBalloonOpponent => self.mark(Side::Opponent, world, scene),
            S::SetupPlayMenu => {
                self.clear();
                self.enable([world.buttons.play]);
            }
            S::PlayMenu => {
                if self.picked == Some(world.buttons.play) {
                    ctx.state = S::SetupPickStartingPoint;
                }
            }
            S::SetupPickStartingPoint => {
                self.clear();
                self.enable(world.start_points);
            }
            S::PickStartingPoint => self.choose_start(world, scene),
            S::SetupEndOfRace => {
                self.clear();
                self.enable([world.buttons.play_again, world.buttons.home]);
            }
            S::EndOfRace => {
                if self.picked == Some(world.buttons.play_again) {
                    ctx.state = S::Restart;
                } else if self.picked == Some(world.buttons.home) {
                    ctx.state = S::Reset;
                }
            }
            _ => {}
        }
    }

    fn enable_vehicles(&mut self, side: Side, world: &World) {
        let ids: Vec<EntityId> = world
            .vehicles
            .iter()
            .copied()
            .filter(|id| world.entities.get(*id).is_some_and(|e| e.is_vehicle_of(side)))
            .collect();
        self.enable(ids);
    }

    /// Float the side's marker over its picked vehicle
    fn mark(&self, side: Side, world: &mut World, scene: &mut dyn Scene) {
        let Some(picked) = self.picked else {
            return;
        };
        let Some(position) = world.entities.position(picked) else {
            return;
        };
        let marker = world.player(side).marker;
        world
            .entities
            .place(marker, scene, position + glam::Vec3::Y * MARKER_HEIGHT);
        world.entities.display(marker, scene, true);
    }

    fn choose_start(&self, world: &mut World, scene: &mut dyn Scene) {
        let Some(picked) = self.picked else {
            return;
        };
        let is_start = |id: EntityId| {
            world
                .entities
                .get(id)
                .is_some_and(|e| e.kind == EntityKind::StartPoint)
        };
        if !is_start(picked) {
            return;
        }
        if let Some(previous) = self.previous.filter(|p| *p != picked && is_start(*p)) {
            scene.tint(previous, None);
        }
        scene.tint(picked, Some(USER_COLOR));
        world.player_mut(Side::User).start_point = Some(picked);
        world.preview_at_start(picked, scene);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessScene;
    use crate::settings::Settings;
    use crate::sim::collision::Hitbox;
    use glam::Vec3;

    #[test]
    fn test_nearest_visible_pickable_wins() {
        let mut entities = Entities::new();
        let mut scene = HeadlessScene::new();
        let near = entities.spawn(
            EntityKind::Obstacle,
            Vec3::new(0.0, 0.0, -5.0),
            vec![Hitbox::sphere(Vec3::ZERO, 1.0)],
        );
        let far = entities.spawn(
            EntityKind::Obstacle,
            Vec3::new(0.0, 0.0, -10.0),
            vec![Hitbox::sphere(Vec3::ZERO, 1.0)],
        );
        for id in [near, far] {
            entities.display(id, &mut scene, true);
        }

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let mut picker = Picker::new();
        assert_eq!(picker.pick(&ray, &entities), None);

        picker.enable([far]);
        assert_eq!(picker.pick(&ray, &entities), Some(far));
        picker.enable([near]);
        assert_eq!(picker.pick(&ray, &entities), Some(near));
        assert_eq!(picker.previous(), Some(far));

        // Hidden entities can't be picked and a miss keeps the selection
        entities.display(near, &mut scene, false);
        entities.display(far, &mut scene, false);
        assert_eq!(picker.pick(&ray, &entities), None);
        assert_eq!(picker.picked(), Some(near));
    }

    #[test]
    fn test_pick_range() {
        let mut entities = Entities::new();
        let mut scene = HeadlessScene::new();
        let too_far = entities.spawn(
            EntityKind::Obstacle,
            Vec3::new(0.0, 0.0, -60.0),
            vec![Hitbox::sphere(Vec3::ZERO, 1.0)],
        );
        entities.display(too_far, &mut scene, true);
        let mut picker = Picker::new();
        picker.enable([too_far]);
        assert_eq!(picker.pick(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), &entities), None);
    }

    #[test]
    fn test_play_button_moves_to_start_point_picking() {
        let settings = Settings::default();
        let mut world = World::new(&settings);
        let mut ctx = GameContext::default();
        let mut scene = HeadlessScene::new();
        let mut picker = Picker::new();

        ctx.state = GameState::PlayMenu;
        picker.update_state(GameState::SetupPlayMenu, &mut ctx, &mut world, &mut scene);
        assert!(picker.is_pickable(world.buttons.play));

        world.entities.display(world.buttons.play, &mut scene, true);
        let ray = Ray::through(Vec3::new(0.0, 14.0, 30.0), crate::consts::PLAY_BUTTON);
        assert_eq!(picker.pick(&ray, &world.entities), Some(world.buttons.play));
        picker.update_state(GameState::PlayMenu, &mut ctx, &mut world, &mut scene);
        assert_eq!(ctx.state, GameState::SetupPickStartingPoint);
    }

    #[test]
    fn test_start_point_tint_moves_with_pick() {
        let settings = Settings::default();
        let mut world = World::new(&settings);
        let mut ctx = GameContext::default();
        let scene = HeadlessScene::new();
        let mut handle = scene.clone();
        let mut picker = Picker::new();

        picker.update_state(GameState::SetupPickStartingPoint, &mut ctx, &mut world, &mut handle);
        let [a, b] = world.start_points;
        world.entities.display(a, &mut handle, true);
        world.entities.display(b, &mut handle, true);

        let camera = Vec3::new(0.0, 14.0, 12.0);
        picker.pick(&Ray::through(camera, world.entities.position(a).unwrap()), &world.entities);
        picker.update_state(GameState::PickStartingPoint, &mut ctx, &mut world, &mut handle);
        assert_eq!(scene.tint_of(a), Some(USER_COLOR));
        assert_eq!(world.player(Side::User).start_point, Some(a));

        picker.pick(&Ray::through(camera, world.entities.position(b).unwrap()), &world.entities);
        picker.update_state(GameState::PickStartingPoint, &mut ctx, &mut world, &mut handle);
        assert_eq!(scene.tint_of(a), None);
        assert_eq!(scene.tint_of(b), Some(USER_COLOR));
        assert_eq!(world.player(Side::User).start_point, Some(b));
    }
}
