//! Collision pass for the user's vehicle
//!
//! Runs once per race tick. Hit clouds and vouchers leave play for the
//! object respawn time; a hit without a voucher stops the user for the
//! longer player penalty time. Both windows are measured in race time.
//! Drifting off the track costs the same as hitting a cloud.

use crate::platform::Scene;
use crate::settings::Settings;

use super::collision::collides;
use super::entity::{Collidable, EntityId, EntityKind, Side};
use super::player::HitOutcome;
use super::tick::GameContext;
use super::world::World;

/// Readmit everything whose penalty ran out; returns the readmitted ids
pub fn expire_penalties(
    ctx: &mut GameContext,
    world: &mut World,
    scene: &mut dyn Scene,
    settings: &Settings,
) -> Vec<EntityId> {
    let expired = ctx
        .penalties
        .expire(ctx.race_time, settings.object_respawn_time);
    for &id in &expired {
        log::debug!("{:?} back in play", id);
        world.readmit(id, ctx, scene);
    }
    expired
}

/// Whether the user's vehicle is still serving a time-out
///
/// Clears the time-out once the penalty window has passed.
pub fn player_penalized(
    ctx: &GameContext,
    world: &mut World,
    vehicle: EntityId,
    settings: &Settings,
) -> bool {
    let Some(vehicle) = world.entities.vehicle_mut(vehicle) else {
        return false;
    };
    if !vehicle.timed_out {
        return false;
    }
    if ctx.race_time - ctx.player_penalty_start < settings.penalty_time {
        return true;
    }
    log::debug!("{} time-out over", vehicle.name);
    vehicle.timed_out = false;
    false
}

/// Collide the user's vehicle with everything collidable
///
/// Returns the entities that were hit this tick, in registry order.
pub fn handle_collisions(
    ctx: &mut GameContext,
    world: &mut World,
    scene: &mut dyn Scene,
    settings: &Settings,
) -> Vec<EntityId> {
    expire_penalties(ctx, world, scene, settings);

    let Some(user_vehicle) = world.player(Side::User).vehicle else {
        return Vec::new();
    };
    if player_penalized(ctx, world, user_vehicle, settings) {
        return Vec::new();
    }
    let Some(user_hitboxes) = world
        .entities
        .get(user_vehicle)
        .map(|e| e.hitboxes().to_vec())
    else {
        return Vec::new();
    };

    let candidates: Vec<EntityId> = ctx
        .collidables
        .iter()
        .filter(|&id| id != user_vehicle && !ctx.penalties.is_penalized(id))
        .collect();

    let mut hits = Vec::new();
    for id in candidates {
        let Some(entity) = world.entities.get(id) else {
            continue;
        };
        if !collides(&user_hitboxes, entity.hitboxes()) {
            continue;
        }
        let kind = entity.kind.clone();
        hit_player(ctx, world, user_vehicle, &kind);
        hit_entity(ctx, world, scene, id, &kind);
        hits.push(id);
    }
    hits
}

/// Put the user back on the center line if the wind pushed it off the track
///
/// Returns whether the user had left the track. The user then pays a
/// voucher, or is timed out from the current race time.
pub fn handle_out_of_track(
    ctx: &mut GameContext,
    world: &mut World,
    scene: &mut dyn Scene,
) -> bool {
    let Some(id) = world.player(Side::User).vehicle else {
        return false;
    };
    let Some(vehicle) = world.entities.vehicle_mut(id) else {
        return false;
    };
    if !world.track.is_off_track(vehicle.lane) {
        return false;
    }
    vehicle.lane = 0.0;
    let (moved, layer) = (vehicle.moved_distance, vehicle.layer);

    let position = world
        .track
        .position_at(moved, 0.0, world.atmosphere.altitude(layer));
    world.entities.place(id, scene, position);

    let outcome = world.player_mut(Side::User).take_penalty();
    log::debug!("User left the track: {:?}", outcome);
    if outcome == HitOutcome::TimedOut {
        time_out(ctx, world, id);
    }
    true
}

fn hit_player(ctx: &mut GameContext, world: &mut World, vehicle: EntityId, kind: &EntityKind) {
    let outcome = world.player_mut(Side::User).react_to_hit(kind);
    log::debug!("User hit {:?}: {:?}", kind, outcome);
    if outcome == HitOutcome::TimedOut {
        time_out(ctx, world, vehicle);
    }
}

fn time_out(ctx: &mut GameContext, world: &mut World, vehicle: EntityId) {
    if let Some(vehicle) = world.entities.vehicle_mut(vehicle) {
        vehicle.timed_out = true;
    }
    ctx.player_penalty_start = ctx.race_time;
}

fn hit_entity(
    ctx: &mut GameContext,
    world: &mut World,
    scene: &mut dyn Scene,
    id: EntityId,
    kind: &EntityKind,
) {
    match kind {
        EntityKind::Obstacle | EntityKind::Powerup => {
            world.entities.display(id, scene, false);
            ctx.collidables.remove(id);
            ctx.penalties.penalize(id, ctx.race_time);
        }
        EntityKind::Vehicle(_) => {
            if let Some(vehicle) = world.entities.vehicle_mut(id) {
                vehicle.timed_out = true;
            }
            ctx.penalties.penalize(id, ctx.race_time);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TRACK_HALF_WIDTH;
    use crate::platform::headless::HeadlessScene;
    use crate::sim::collision::Hitbox;
    use crate::sim::entity::{Movable, Renderable};
    use glam::Vec3;

    /// User sphere of radius 1 at the origin
    fn setup() -> (GameContext, World, HeadlessScene, Settings) {
        let settings = Settings::default();
        let mut world = World::new(&settings);
        let user = world.entities.spawn(
            EntityKind::Vehicle(crate::sim::entity::Vehicle::new(Side::User, "comet")),
            Vec3::ZERO,
            vec![Hitbox::sphere(Vec3::ZERO, 1.0)],
        );
        world.player_mut(Side::User).vehicle = Some(user);
        let mut ctx = GameContext::default();
        ctx.race_time = 7.5;
        (ctx, world, HeadlessScene::new(), settings)
    }

    fn spawn(world: &mut World, ctx: &mut GameContext, scene: &mut HeadlessScene, kind: EntityKind) -> EntityId {
        let id = world.entities.spawn(
            kind,
            Vec3::ZERO,
            vec![Hitbox::cuboid(Vec3::ZERO, Vec3::splat(0.5))],
        );
        world.entities.display(id, scene, true);
        ctx.collidables.add(id);
        id
    }

    #[test]
    fn test_obstacle_hit_penalizes_both_sides() {
        let (mut ctx, mut world, mut scene, settings) = setup();
        let cloud = spawn(&mut world, &mut ctx, &mut scene, EntityKind::Obstacle);

        let hits = handle_collisions(&mut ctx, &mut world, &mut scene, &settings);
        assert_eq!(hits, vec![cloud]);

        let user = world.player(Side::User).vehicle.unwrap();
        assert!(world.entities.vehicle(user).unwrap().timed_out);
        assert_eq!(ctx.player_penalty_start, 7.5);
        assert_eq!(ctx.penalties.since(cloud), Some(7.5));
        assert!(!ctx.collidables.contains(cloud));
        assert!(!scene.is_attached(cloud));

        // Nothing left to hit on the next tick
        assert!(handle_collisions(&mut ctx, &mut world, &mut scene, &settings).is_empty());
    }

    #[test]
    fn test_voucher_absorbs_next_hit() {
        let (mut ctx, mut world, mut scene, settings) = setup();
        spawn(&mut world, &mut ctx, &mut scene, EntityKind::Powerup);
        handle_collisions(&mut ctx, &mut world, &mut scene, &settings);
        assert_eq!(world.player(Side::User).vouchers, 1);

        spawn(&mut world, &mut ctx, &mut scene, EntityKind::Obstacle);
        handle_collisions(&mut ctx, &mut world, &mut scene, &settings);
        let user = world.player(Side::User).vehicle.unwrap();
        assert_eq!(world.player(Side::User).vouchers, 0);
        assert!(!world.entities.vehicle(user).unwrap().timed_out);
    }

    #[test]
    fn test_penalties_expire_in_race_time() {
        let (mut ctx, mut world, mut scene, settings) = setup();
        let cloud = spawn(&mut world, &mut ctx, &mut scene, EntityKind::Obstacle);
        handle_collisions(&mut ctx, &mut world, &mut scene, &settings);

        // Move the user away so the cloud can come back without a rehit
        let user = world.player(Side::User).vehicle.unwrap();
        world.entities.get_mut(user).unwrap().move_to(Vec3::new(0.0, 50.0, 0.0));

        ctx.race_time += settings.object_respawn_time - 0.5;
        assert!(expire_penalties(&mut ctx, &mut world, &mut scene, &settings).is_empty());

        ctx.race_time += 0.5;
        assert_eq!(expire_penalties(&mut ctx, &mut world, &mut scene, &settings), vec![cloud]);
        assert!(ctx.collidables.contains(cloud));
        assert!(world.entities.get(cloud).unwrap().is_displayed());

        // Player penalty is the longer window
        assert!(player_penalized(&ctx, &mut world, user, &settings));
        ctx.race_time = 7.5 + settings.penalty_time;
        assert!(!player_penalized(&ctx, &mut world, user, &settings));
        assert!(!world.entities.vehicle(user).unwrap().timed_out);
    }

    #[test]
    fn test_leaving_the_track_costs_a_voucher_then_a_time_out() {
        let (mut ctx, mut world, mut scene, _) = setup();
        let user = world.player(Side::User).vehicle.unwrap();
        world.player_mut(Side::User).vouchers = 1;

        world.entities.vehicle_mut(user).unwrap().lane = TRACK_HALF_WIDTH - 0.1;
        assert!(!handle_out_of_track(&mut ctx, &mut world, &mut scene));

        world.entities.vehicle_mut(user).unwrap().lane = TRACK_HALF_WIDTH + 0.5;
        assert!(handle_out_of_track(&mut ctx, &mut world, &mut scene));
        assert_eq!(world.player(Side::User).vouchers, 0);
        let vehicle = world.entities.vehicle(user).unwrap();
        assert_eq!(vehicle.lane, 0.0);
        assert!(!vehicle.timed_out);
        let center = world.track.position_at(0.0, 0.0, world.atmosphere.altitude(0));
        assert!(world.entities.position(user).unwrap().distance(center) < 1e-4);
        assert_eq!(scene.position(user), Some(center));

        // No voucher left: the same slip times the user out
        world.entities.vehicle_mut(user).unwrap().lane = -(TRACK_HALF_WIDTH + 0.5);
        assert!(handle_out_of_track(&mut ctx, &mut world, &mut scene));
        assert!(world.entities.vehicle(user).unwrap().timed_out);
        assert_eq!(ctx.player_penalty_start, 7.5);
    }

    #[test]
    fn test_hit_opponent_is_timed_out() {
        let (mut ctx, mut world, mut scene, settings) = setup();
        let opponent = world.entities.spawn(
            EntityKind::Vehicle(crate::sim::entity::Vehicle::new(Side::Opponent, "gale")),
            Vec3::new(1.5, 0.0, 0.0),
            vec![Hitbox::sphere(Vec3::ZERO, 0.6)],
        );
        ctx.collidables.add(opponent);

        assert_eq!(handle_collisions(&mut ctx, &mut world, &mut scene, &settings), vec![opponent]);
        assert!(world.entities.vehicle(opponent).unwrap().timed_out);
        assert!(ctx.penalties.is_penalized(opponent));
        assert!(ctx.collidables.contains(opponent));

        ctx.race_time += settings.object_respawn_time;
        expire_penalties(&mut ctx, &mut world, &mut scene, &settings);
        assert!(!world.entities.vehicle(opponent).unwrap().timed_out);
    }
}
