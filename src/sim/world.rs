//! The race world
//!
//! Owns every entity plus the track and wind layers, and implements the
//! state reactions of the world-side subsystems: vehicles, players and the
//! map (start points, obstacles, powerups).

use glam::Vec3;

use crate::consts::*;
use crate::platform::assets::TextureCache;
use crate::platform::Scene;
use crate::settings::Settings;

use super::actions::Dispatcher;
use super::collision::Hitbox;
use super::entity::{
    Entities, EntityId, EntityKind, LodLevel, MenuButton, Movable, Renderable, Side,
    StateReactive, Vehicle,
};
use super::player::Player;
use super::state::GameState;
use super::tick::GameContext;
use super::track::{Atmosphere, Track};

/// Vehicle names per roster, nearest to the camera first
const USER_ROSTER: [&str; 4] = ["comet", "zephyr", "ember", "nimbus"];
const OPPONENT_ROSTER: [&str; 4] = ["cirrus", "gale", "blaze", "drift"];

/// Wind layer of each cloud, spread evenly along the track
const OBSTACLE_LAYERS: [usize; 6] = [1, 2, 3, 4, 3, 2];
/// Wind layer of each voucher
const POWERUP_LAYERS: [usize; 4] = [4, 3, 2, 1];

#[derive(Debug, Clone, Copy)]
pub struct Buttons {
    pub play: EntityId,
    pub play_again: EntityId,
    pub home: EntityId,
}

pub struct World {
    pub entities: Entities,
    pub track: Track,
    pub atmosphere: Atmosphere,
    pub players: [Player; 2],
    pub vehicles: Vec<EntityId>,
    pub obstacles: Vec<EntityId>,
    pub powerups: Vec<EntityId>,
    /// Start shadows, left lane first
    pub start_points: [EntityId; 2],
    pub buttons: Buttons,
}

impl World {
    /// Track, start points, markers and buttons, but no vehicles or hazards
    pub fn new(settings: &Settings) -> Self {
        let track = Track::standard();
        let atmosphere = Atmosphere::new(&settings.wind_speeds, &settings.wind_drifts);
        let mut entities = Entities::new();

        let start_shape = vec![Hitbox::cuboid(Vec3::ZERO, Vec3::new(0.8, 0.05, 0.8))];
        let start_points = [-START_LANE_OFFSET, START_LANE_OFFSET].map(|lane| {
            entities.spawn(
                EntityKind::StartPoint,
                track.position_at(0.0, lane, 0.0),
                start_shape.clone(),
            )
        });

        let markers = Side::BOTH.map(|side| {
            entities.spawn(EntityKind::Marker(side), Vec3::ZERO, Vec::new())
        });

        let button_shape = vec![Hitbox::cuboid(Vec3::ZERO, Vec3::new(1.2, 0.5, 0.2))];
        let mut button = |kind: MenuButton, at: Vec3| {
            entities.spawn(EntityKind::Button(kind), at, button_shape.clone())
        };
        let buttons = Buttons {
            play: button(MenuButton::Play, PLAY_BUTTON),
            play_again: button(MenuButton::PlayAgain, PLAY_AGAIN_BUTTON),
            home: button(MenuButton::Home, HOME_BUTTON),
        };

        Self {
            entities,
            track,
            atmosphere,
            players: [
                Player::new(Side::User, markers[0]),
                Player::new(Side::Opponent, markers[1]),
            ],
            vehicles: Vec::new(),
            obstacles: Vec::new(),
            powerups: Vec::new(),
            start_points,
            buttons,
        }
    }

    /// The full race world with both rosters, clouds and vouchers
    pub fn standard(settings: &Settings, textures: &mut TextureCache) -> Self {
        let mut world = Self::new(settings);

        for (side, roster, x) in [
            (Side::User, USER_ROSTER, -ROSTER_X),
            (Side::Opponent, OPPONENT_ROSTER, ROSTER_X),
        ] {
            for (name, z) in roster.iter().zip(ROSTER_Z) {
                let id = world.spawn_vehicle(side, name, Vec3::new(x, 0.0, z), settings);
                if let Some(entity) = world.entities.get_mut(id) {
                    entity.textures.push(textures.load_texture(&format!("balloon_{name}.png")));
                    entity.textures.push(textures.load_texture("basket.png"));
                }
            }
        }

        let length = world.track.length();
        for (i, layer) in OBSTACLE_LAYERS.into_iter().enumerate() {
            let distance = length * (i as f32 + 0.5) / OBSTACLE_LAYERS.len() as f32;
            let position = world
                .track
                .position_at(distance, 0.0, world.atmosphere.altitude(layer));
            let id = world.entities.spawn(
                EntityKind::Obstacle,
                position,
                vec![Hitbox::cuboid(Vec3::ZERO, OBSTACLE_HALF_EXTENTS)],
            );
            world.obstacles.push(id);
        }
        for (i, layer) in POWERUP_LAYERS.into_iter().enumerate() {
            let distance = length * (i as f32 + 0.8) / POWERUP_LAYERS.len() as f32;
            let position = world
                .track
                .position_at(distance, 0.0, world.atmosphere.altitude(layer));
            let id = world.entities.spawn(
                EntityKind::Powerup,
                position,
                vec![Hitbox::sphere(Vec3::ZERO, POWERUP_RADIUS)],
            );
            world.powerups.push(id);
        }

        let cloud = textures.load_texture("cloud.png");
        let voucher = textures.load_texture("voucher.png");
        let shadow = textures.load_texture("shadow.png");
        for entity in world.entities.iter_mut() {
            match entity.kind {
                EntityKind::Obstacle => entity.textures.push(cloud.clone()),
                EntityKind::Powerup => entity.textures.push(voucher.clone()),
                EntityKind::StartPoint => entity.textures.push(shadow.clone()),
                _ => {}
            }
        }

        log::info!(
            "World built: {} vehicles, {} clouds, {} vouchers, track {:.1} long",
            world.vehicles.len(),
            world.obstacles.len(),
            world.powerups.len(),
            length
        );
        world
    }

    pub fn spawn_vehicle(
        &mut self,
        side: Side,
        name: &str,
        position: Vec3,
        settings: &Settings,
    ) -> EntityId {
        let id = self.entities.spawn(
            EntityKind::Vehicle(Vehicle::new(side, name)),
            position,
            vec![Hitbox::sphere(Vec3::ZERO, VEHICLE_RADIUS)],
        );
        if let Some(entity) = self.entities.get_mut(id) {
            entity.create_lod();
            entity.add_lod(LodLevel {
                distance: 0.0,
                detail: 2,
            });
            entity.add_lod(LodLevel {
                distance: settings.lod_distance,
                detail: 0,
            });
        }
        self.vehicles.push(id);
        id
    }

    pub fn player(&self, side: Side) -> &Player {
        &self.players[side.index()]
    }

    pub fn player_mut(&mut self, side: Side) -> &mut Player {
        &mut self.players[side.index()]
    }

    /// Lane of a start point, 0 for anything else
    pub fn start_lane(&self, start_point: EntityId) -> f32 {
        if start_point == self.start_points[0] {
            -START_LANE_OFFSET
        } else if start_point == self.start_points[1] {
            START_LANE_OFFSET
        } else {
            0.0
        }
    }

    pub fn other_start_point(&self, start_point: EntityId) -> EntityId {
        if start_point == self.start_points[0] {
            self.start_points[1]
        } else {
            self.start_points[0]
        }
    }

    /// Where cameras should look during the race
    pub fn camera_focus(&self) -> Option<Vec3> {
        self.player(Side::User)
            .vehicle
            .and_then(|id| self.entities.position(id))
    }

    pub fn winner(&self, laps_to_win: u32) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|side| self.player(*side).has_won(laps_to_win))
    }

    /// Move the user's vehicle one wind layer up or down
    pub fn change_layer(&mut self, delta: i8) {
        let Some(id) = self.player(Side::User).vehicle else {
            return;
        };
        let Some(vehicle) = self.entities.vehicle_mut(id) else {
            return;
        };
        let layer = self.atmosphere.shift(vehicle.layer, delta);
        if layer != vehicle.layer {
            log::debug!("{} moves to wind layer {}", vehicle.name, layer);
            vehicle.layer = layer;
        }
    }

    /// Show the user's vehicle standing on a start point
    pub fn preview_at_start(&mut self, start_point: EntityId, scene: &mut dyn Scene) {
        let Some(vehicle) = self.player(Side::User).vehicle else {
            return;
        };
        let lane = self.start_lane(start_point);
        let position = self
            .track
            .position_at(0.0, lane, self.atmosphere.altitude(0));
        self.entities.place(vehicle, scene, position);
        self.entities.display(vehicle, scene, true);
    }

    fn showcase(&mut self, scene: &mut dyn Scene) {
        for (side, at) in [(Side::User, USER_SHOWCASE), (Side::Opponent, OPPONENT_SHOWCASE)] {
            if let Some(id) = self.player(side).vehicle {
                self.entities.place(id, scene, at);
                self.entities.display(id, scene, true);
            }
        }
    }

    /// Vehicles subsystem
    pub fn update_vehicles(&mut self, state: GameState, ctx: &mut GameContext, scene: &mut dyn Scene) {
        for &id in &self.vehicles {
            if let Some(entity) = self.entities.get_mut(id) {
                entity.update_state(state, scene);
            }
        }

        if state == GameState::SetupPickStartingPoint {
            let owned: Vec<EntityId> = self.players.iter().filter_map(|p| p.vehicle).collect();
            for &id in &self.vehicles {
                ctx.collidables.remove(id);
                if !owned.contains(&id) {
                    self.entities.display(id, scene, false);
                }
            }
        }
    }

    /// Players subsystem
    pub fn update_players(
        &mut self,
        state: GameState,
        ctx: &mut GameContext,
        input: &mut Dispatcher,
        picked: Option<EntityId>,
        scene: &mut dyn Scene,
        settings: &Settings,
    ) {
        use GameState as S;

        match state {
            S::SetupPickBalloonOpponent => self.claim_pick(Side::User, picked),
            S::SetupPlayMenu => {
                if self.player(Side::Opponent).vehicle.is_none() {
                    self.claim_pick(Side::Opponent, picked);
                }
                self.showcase(scene);
            }
            S::SetupPickStartingPoint => {
                for player in &self.players {
                    if let Some(marker) = self.entities.get_mut(player.marker) {
                        marker.update_state(state, scene);
                    }
                }
            }
            S::SetupRace => self.start_race(ctx, input, scene, settings),
            S::Race => self.advance_players(ctx, scene, settings),
            S::SetupPause => self.player_mut(Side::User).disconnect_controls(input),
            S::SetupUnpause => self.player_mut(Side::User).connect_controls(input),
            S::SetupEndOfRace => {
                self.player_mut(Side::User).disconnect_controls(input);
                self.showcase(scene);
            }
            S::Reset => {
                for i in 0..self.players.len() {
                    self.players[i].disconnect_controls(input);
                    self.players[i].clear();
                    let marker = self.players[i].marker;
                    if let Some(entity) = self.entities.get_mut(marker) {
                        entity.update_state(state, scene);
                    }
                }
            }
            S::Restart => {
                for i in 0..self.players.len() {
                    self.players[i].disconnect_controls(input);
                    self.players[i].restart();
                    self.players[i].start_point = None;
                    if let Some(vehicle) = self.players[i].vehicle {
                        if let Some(v) = self.entities.vehicle_mut(vehicle) {
                            v.reset();
                        }
                    }
                }
                self.showcase(scene);
            }
            _ => {}
        }
    }

    fn claim_pick(&mut self, side: Side, picked: Option<EntityId>) {
        let Some(id) = picked else {
            return;
        };
        let Some(vehicle) = self.entities.vehicle(id) else {
            return;
        };
        if vehicle.side != side {
            return;
        }
        log::info!("{:?} flies {}", side, vehicle.name);
        self.player_mut(side).vehicle = Some(id);
    }

    fn start_race(
        &mut self,
        ctx: &mut GameContext,
        input: &mut Dispatcher,
        scene: &mut dyn Scene,
        settings: &Settings,
    ) {
        let user_start = self
            .player(Side::User)
            .start_point
            .unwrap_or(self.start_points[0]);
        self.player_mut(Side::User).start_point = Some(user_start);
        self.player_mut(Side::Opponent).start_point = Some(self.other_start_point(user_start));

        for side in Side::BOTH {
            let player = self.player_mut(side);
            player.restart();
            let (Some(id), Some(start)) = (player.vehicle, player.start_point) else {
                continue;
            };
            let lane = self.start_lane(start);
            let layer = match side {
                Side::User => 0,
                Side::Opponent => settings.opponent_layer.min(self.atmosphere.len().saturating_sub(1)),
            };
            if let Some(vehicle) = self.entities.vehicle_mut(id) {
                vehicle.reset();
                vehicle.lane = lane;
                vehicle.layer = layer;
            }
            let position = self
                .track
                .position_at(0.0, lane, self.atmosphere.altitude(layer));
            self.entities.place(id, scene, position);
            self.entities.display(id, scene, true);
        }

        self.player_mut(Side::User).connect_controls(input);
        if let Some(opponent) = self.player(Side::Opponent).vehicle {
            ctx.collidables.add(opponent);
        }
    }

    fn advance_players(&mut self, ctx: &GameContext, scene: &mut dyn Scene, settings: &Settings) {
        let opponent_speed = self.track.length() / settings.opponent_lap_time.max(f32::EPSILON);

        for side in Side::BOTH {
            let Some(id) = self.player(side).vehicle else {
                continue;
            };
            let Some(vehicle) = self.entities.vehicle_mut(id) else {
                continue;
            };
            if !vehicle.timed_out {
                let speed = match side {
                    Side::User => {
                        vehicle.lane += self.atmosphere.drift(vehicle.layer) * ctx.delta_t;
                        self.atmosphere.speed(vehicle.layer)
                    }
                    Side::Opponent => opponent_speed,
                };
                vehicle.moved_distance += speed * ctx.delta_t;
            }
            let (moved, lane, layer) = (vehicle.moved_distance, vehicle.lane, vehicle.layer);

            let position = self
                .track
                .position_at(moved, lane, self.atmosphere.altitude(layer));
            self.entities.place(id, scene, position);
            let laps = self.track.laps(moved);
            self.player_mut(side).record_laps(laps);
        }
    }

    /// Map subsystem: start points, clouds and vouchers
    pub fn update_map(&mut self, state: GameState, ctx: &mut GameContext, scene: &mut dyn Scene) {
        let ids: Vec<EntityId> = self
            .start_points
            .iter()
            .chain(&self.obstacles)
            .chain(&self.powerups)
            .copied()
            .collect();
        for &id in &ids {
            if let Some(entity) = self.entities.get_mut(id) {
                entity.update_state(state, scene);
            }
        }

        let hazards = self.obstacles.iter().chain(&self.powerups).copied();
        match state {
            GameState::SetupRace => {
                for id in hazards {
                    ctx.collidables.add(id);
                }
            }
            GameState::Reset => {
                for id in hazards {
                    ctx.collidables.remove(id);
                }
            }
            _ => {}
        }
    }

    /// Put a penalized entity back into play
    pub fn readmit(&mut self, id: EntityId, ctx: &mut GameContext, scene: &mut dyn Scene) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };
        match entity.vehicle_mut() {
            Some(vehicle) => vehicle.timed_out = false,
            None => {
                entity.display(scene, true);
                ctx.collidables.add(id);
            }
        }
    }

    /// Fresh vehicles for a new session: back home, hidden, no progress
    pub fn rebuild_vehicles(&mut self, ctx: &mut GameContext, scene: &mut dyn Scene) {
        for &id in &self.vehicles {
            ctx.collidables.remove(id);
            if let Some(entity) = self.entities.get_mut(id) {
                if let Some(vehicle) = entity.vehicle_mut() {
                    vehicle.reset();
                    vehicle.lane = 0.0;
                }
                let home = entity.home;
                entity.move_to(home);
                entity.display(scene, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{HeadlessScene, HeadlessTextureLoader};

    fn world() -> (World, Settings) {
        let settings = Settings::default();
        let mut textures = TextureCache::new(Box::new(HeadlessTextureLoader::new()));
        (World::standard(&settings, &mut textures), settings)
    }

    #[test]
    fn test_standard_world_layout() {
        let (world, _) = world();
        assert_eq!(world.vehicles.len(), 8);
        assert_eq!(world.obstacles.len(), OBSTACLE_LAYERS.len());
        assert_eq!(world.powerups.len(), POWERUP_LAYERS.len());
        let users = world
            .vehicles
            .iter()
            .filter(|id| world.entities.get(**id).is_some_and(|e| e.is_vehicle_of(Side::User)))
            .count();
        assert_eq!(users, 4);
        assert!(world.vehicles.iter().all(|id| world.entities.get(*id).is_some_and(|e| e.has_lod())));
    }

    #[test]
    fn test_picks_must_match_side() {
        let (mut world, _) = world();
        let opponent_vehicle = world.vehicles[4];
        world.claim_pick(Side::User, Some(opponent_vehicle));
        assert_eq!(world.player(Side::User).vehicle, None);
        world.claim_pick(Side::Opponent, Some(opponent_vehicle));
        assert_eq!(world.player(Side::Opponent).vehicle, Some(opponent_vehicle));
    }

    #[test]
    fn test_race_start_and_laps() {
        let (mut world, settings) = world();
        let mut ctx = GameContext::default();
        let mut input = Dispatcher::new();
        let mut scene = HeadlessScene::new();

        world.players[0].vehicle = Some(world.vehicles[0]);
        world.players[1].vehicle = Some(world.vehicles[4]);
        world.players[0].start_point = Some(world.start_points[1]);

        world.update_players(GameState::SetupRace, &mut ctx, &mut input, None, &mut scene, &settings);
        assert_eq!(world.player(Side::Opponent).start_point, Some(world.start_points[0]));
        assert!(ctx.collidables.contains(world.vehicles[4]));
        assert_eq!(input.bindings_for("w").len(), 1);
        let user = world.entities.vehicle(world.vehicles[0]).unwrap();
        assert_eq!(user.lane, START_LANE_OFFSET);

        // Ground layer is calm; climb to the fastest layer
        for _ in 0..10 {
            world.change_layer(1);
        }
        assert_eq!(world.entities.vehicle(world.vehicles[0]).unwrap().layer, 4);

        ctx.delta_t = world.track.length() / settings.wind_speed(4) + 0.01;
        world.update_players(GameState::Race, &mut ctx, &mut input, None, &mut scene, &settings);
        assert_eq!(world.player(Side::User).laps_completed, 1);
        assert_eq!(world.winner(1), Some(Side::User));
        assert_eq!(world.winner(3), None);
    }

    #[test]
    fn test_wind_pushes_only_the_user_sideways() {
        let (mut world, settings) = world();
        let mut ctx = GameContext::default();
        let mut input = Dispatcher::new();
        let mut scene = HeadlessScene::new();

        world.players[0].vehicle = Some(world.vehicles[0]);
        world.players[1].vehicle = Some(world.vehicles[4]);
        world.players[0].start_point = Some(world.start_points[1]);
        world.update_players(GameState::SetupRace, &mut ctx, &mut input, None, &mut scene, &settings);

        world.change_layer(1);
        ctx.delta_t = 2.0;
        world.update_players(GameState::Race, &mut ctx, &mut input, None, &mut scene, &settings);
        let drifted = START_LANE_OFFSET + settings.wind_drifts[1] * 2.0;
        assert!((world.entities.vehicle(world.vehicles[0]).unwrap().lane - drifted).abs() < 1e-5);
        assert_eq!(world.entities.vehicle(world.vehicles[4]).unwrap().lane, -START_LANE_OFFSET);

        // A timed-out user hangs still
        world.entities.vehicle_mut(world.vehicles[0]).unwrap().timed_out = true;
        world.update_players(GameState::Race, &mut ctx, &mut input, None, &mut scene, &settings);
        assert!((world.entities.vehicle(world.vehicles[0]).unwrap().lane - drifted).abs() < 1e-5);
    }

    #[test]
    fn test_map_hazards_join_and_leave_collision() {
        let (mut world, _) = world();
        let mut ctx = GameContext::default();
        let mut scene = HeadlessScene::new();

        world.update_map(GameState::SetupRace, &mut ctx, &mut scene);
        assert_eq!(ctx.collidables.len(), world.obstacles.len() + world.powerups.len());
        assert!(scene.is_attached(world.obstacles[0]));

        world.update_map(GameState::Reset, &mut ctx, &mut scene);
        assert!(ctx.collidables.is_empty());
        assert!(!scene.is_attached(world.obstacles[0]));
    }
}
