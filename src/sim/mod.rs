//! Race session core
//!
//! Everything that decides what happens in a session lives here. Rendering,
//! cameras, the HUD and time are reached only through the `platform` traits:
//! - One game state at a time, advanced by a data-driven state machine
//! - Explicit shared context, no globals
//! - Stable iteration order (by entity id)
//! - Seeded RNG only

pub mod actions;
pub mod collision;
pub mod entity;
pub mod fireworks;
pub mod machine;
pub mod menus;
pub mod picker;
mod planner;
pub mod player;
pub mod race;
pub mod registry;
pub mod state;
pub mod tick;
pub mod track;
pub mod world;

pub use actions::{Action, DebugMotion, Dispatcher, Subscriber};
pub use collision::{Hitbox, Ray, collides};
pub use entity::{Entities, Entity, EntityId, EntityKind, Side, Vehicle};
pub use machine::{DISPATCH_TABLE, StateMachine, Subsystem};
pub use state::GameState;
pub use tick::{Game, GameContext};
pub use world::World;
