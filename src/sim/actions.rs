//! Input binding vocabulary
//!
//! Who binds keys (`Subscriber`) and what a fired binding asks the game to do
//! (`Action`). The pair is stored in the input dispatcher instead of a
//! callback, so disconnecting is an equality check.

use crate::input::InputDispatcher;
use crate::platform::CameraMode;

use super::entity::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscriber {
    Planner,
    HomeMenu,
    Picker,
    Camera(CameraMode),
    Player(Side),
}

/// Debug camera movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugMotion {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    YawLeft,
    YawRight,
    PitchUp,
    PitchDown,
}

/// Debug camera key map (held keys)
pub const DEBUG_CONTROLS: [(&str, DebugMotion); 10] = [
    ("t", DebugMotion::Forward),
    ("g", DebugMotion::Back),
    ("f", DebugMotion::Left),
    ("h", DebugMotion::Right),
    ("capslock", DebugMotion::Up),
    ("shift", DebugMotion::Down),
    ("arrowleft", DebugMotion::YawLeft),
    ("arrowright", DebugMotion::YawRight),
    ("arrowup", DebugMotion::PitchUp),
    ("arrowdown", DebugMotion::PitchDown),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Follow the confirm transition of the current state
    AdvanceState,
    /// Like `AdvanceState`, but only once something is picked
    ConfirmPick,
    Reset,
    ToggleDebugCamera,
    UseCamera(CameraMode),
    TogglePause,
    /// Type the fired key into the player name
    WriteName,
    /// Pick whatever is under the pointer
    Pick,
    Resize,
    /// Climb (+1) or descend (-1) one wind layer
    ChangeLayer(i8),
    DebugMove(DebugMotion),
}

pub type Dispatcher = InputDispatcher<Subscriber, Action>;
