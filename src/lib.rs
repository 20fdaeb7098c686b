//! Balloon Race - a three-lap hot air balloon race
//!
//! Core modules:
//! - `sim`: Session orchestration (state machine, planner, collisions, race)
//! - `input`: Edge/hold-aware keyboard and pointer dispatch
//! - `platform`: Scene, camera, HUD, clock and asset collaborators
//! - `results`: Finished race results board
//! - `settings`: Data-driven game tuning

pub mod input;
pub mod platform;
pub mod results;
pub mod settings;
pub mod sim;

pub use input::{InputDispatcher, TriggerKind};
pub use results::{RaceResult, RaceResults};
pub use settings::Settings;
pub use sim::{Game, GameContext, GameState};

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Delta time used for the first frame, before a previous timestamp exists
    pub const FIRST_FRAME_DT: f32 = 1.0 / 60.0;
    /// Frame deltas above this are clamped (tab switches, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Picking ray range
    pub const PICK_NEAR: f32 = 1.0;
    pub const PICK_FAR: f32 = 50.0;

    /// Wind layer altitudes, ground first
    pub const WIND_LAYER_ALTITUDES: [f32; 5] = [0.3, 0.75, 2.25, 3.75, 5.25];

    /// Racing track: ellipse through the origin, centered on (0, 0, TRACK_CENTER_Z)
    pub const TRACK_RADIUS_X: f32 = 30.0;
    pub const TRACK_RADIUS_Z: f32 = 20.0;
    pub const TRACK_CENTER_Z: f32 = -20.0;
    pub const TRACK_SEGMENTS: usize = 128;
    /// Lateral offset of each start point from the track center line
    pub const START_LANE_OFFSET: f32 = 1.0;
    /// Vehicles drifting further than this from the center line are off the track
    pub const TRACK_HALF_WIDTH: f32 = 3.0;

    /// Where each side's vehicle is shown off between picking and racing
    pub const USER_SHOWCASE: Vec3 = Vec3::new(-10.5, 14.0, 10.0);
    pub const OPPONENT_SHOWCASE: Vec3 = Vec3::new(10.5, 14.0, 10.0);

    /// Menu buttons float in front of the showcase
    pub const PLAY_BUTTON: Vec3 = Vec3::new(0.0, 14.0, 10.0);
    pub const PLAY_AGAIN_BUTTON: Vec3 = Vec3::new(-3.0, 12.0, 10.0);
    pub const HOME_BUTTON: Vec3 = Vec3::new(3.0, 12.0, 10.0);

    /// Vehicle rosters stand in two rows inside the track
    pub const ROSTER_X: f32 = 19.0;
    pub const ROSTER_Z: [f32; 4] = [-8.0, -12.0, -16.0, -20.0];

    /// Hitbox sizes
    pub const VEHICLE_RADIUS: f32 = 0.6;
    pub const POWERUP_RADIUS: f32 = 0.5;
    pub const OBSTACLE_HALF_EXTENTS: Vec3 = Vec3::new(1.3, 0.35, 1.3);
    pub const MARKER_HEIGHT: f32 = 1.6;

    /// Player colors (0xRRGGBB)
    pub const USER_COLOR: u32 = 0xFFFF00;
    pub const OPPONENT_COLOR: u32 = 0xFF0000;
}
