//! Discrete session states
//!
//! `Setup*` states and the two control states (`Reset`, `Restart`) run their
//! subsystems once and hand over to a steady state in the same tick. Steady
//! states repeat every tick until something moves the session on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the session currently is
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum GameState {
    #[default]
    SetupHomeMenu,
    /// Typing the player name
    HomeMenu,
    SetupPickBalloonUser,
    PickBalloonUser,
    SetupPickBalloonOpponent,
    PickBalloonOpponent,
    SetupPlayMenu,
    PlayMenu,
    SetupPickStartingPoint,
    PickStartingPoint,
    SetupRace,
    Race,
    SetupEndOfRace,
    EndOfRace,
    SetupPause,
    Pause,
    SetupUnpause,
    /// Tear everything down and go back to the home menu
    Reset,
    /// Race again with the same players
    Restart,
}

impl GameState {
    pub const ALL: [GameState; 19] = [
        GameState::SetupHomeMenu,
        GameState::HomeMenu,
        GameState::SetupPickBalloonUser,
        GameState::PickBalloonUser,
        GameState::SetupPickBalloonOpponent,
        GameState::PickBalloonOpponent,
        GameState::SetupPlayMenu,
        GameState::PlayMenu,
        GameState::SetupPickStartingPoint,
        GameState::PickStartingPoint,
        GameState::SetupRace,
        GameState::Race,
        GameState::SetupEndOfRace,
        GameState::EndOfRace,
        GameState::SetupPause,
        GameState::Pause,
        GameState::SetupUnpause,
        GameState::Reset,
        GameState::Restart,
    ];

    /// States that only last a single tick
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            GameState::SetupHomeMenu
                | GameState::SetupPickBalloonUser
                | GameState::SetupPickBalloonOpponent
                | GameState::SetupPlayMenu
                | GameState::SetupPickStartingPoint
                | GameState::SetupRace
                | GameState::SetupEndOfRace
                | GameState::SetupPause
                | GameState::SetupUnpause
                | GameState::Reset
                | GameState::Restart
        )
    }

    /// Where a confirm (enter) leads from this state, if anywhere
    pub fn confirm_target(self) -> Option<GameState> {
        match self {
            GameState::HomeMenu => Some(GameState::SetupPickBalloonUser),
            GameState::PickBalloonUser => Some(GameState::SetupPickBalloonOpponent),
            GameState::PickBalloonOpponent => Some(GameState::SetupPlayMenu),
            GameState::PickStartingPoint => Some(GameState::SetupRace),
            _ => None,
        }
    }

    /// Where the pause toggle leads from this state, if anywhere
    pub fn pause_target(self) -> Option<GameState> {
        match self {
            GameState::Race => Some(GameState::SetupPause),
            GameState::Pause => Some(GameState::SetupUnpause),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GameState::SetupHomeMenu => "SETUP_HOME_MENU",
            GameState::HomeMenu => "HOME_MENU",
            GameState::SetupPickBalloonUser => "SETUP_PICK_BALLOON_USER",
            GameState::PickBalloonUser => "PICK_BALLOON_USER",
            GameState::SetupPickBalloonOpponent => "SETUP_PICK_BALLOON_OPPONENT",
            GameState::PickBalloonOpponent => "PICK_BALLOON_OPPONENT",
            GameState::SetupPlayMenu => "SETUP_PLAY_MENU",
            GameState::PlayMenu => "PLAY_MENU",
            GameState::SetupPickStartingPoint => "SETUP_PICK_STARTING_POINT",
            GameState::PickStartingPoint => "PICK_STARTING_POINT",
            GameState::SetupRace => "SETUP_RACE",
            GameState::Race => "RACE",
            GameState::SetupEndOfRace => "SETUP_END_OF_RACE",
            GameState::EndOfRace => "END_OF_RACE",
            GameState::SetupPause => "SETUP_PAUSE",
            GameState::Pause => "PAUSE",
            GameState::SetupUnpause => "SETUP_UNPAUSE",
            GameState::Reset => "RESET",
            GameState::Restart => "RESTART",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_states_are_distinct() {
        let unique: HashSet<GameState> = GameState::ALL.into_iter().collect();
        assert_eq!(unique.len(), GameState::ALL.len());
        let names: HashSet<&str> = GameState::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), GameState::ALL.len());
    }

    #[test]
    fn test_confirm_targets() {
        assert_eq!(
            GameState::HomeMenu.confirm_target(),
            Some(GameState::SetupPickBalloonUser)
        );
        assert_eq!(
            GameState::PickStartingPoint.confirm_target(),
            Some(GameState::SetupRace)
        );
        assert_eq!(GameState::Race.confirm_target(), None);
        assert_eq!(GameState::PlayMenu.confirm_target(), None);
        for state in GameState::ALL {
            if let Some(target) = state.confirm_target() {
                assert!(target.is_transient());
                assert!(!state.is_transient());
            }
        }
    }

    #[test]
    fn test_pause_targets() {
        assert_eq!(GameState::Race.pause_target(), Some(GameState::SetupPause));
        assert_eq!(GameState::Pause.pause_target(), Some(GameState::SetupUnpause));
        assert_eq!(GameState::EndOfRace.pause_target(), None);
    }

    #[test]
    fn test_default_and_serde_names() {
        assert_eq!(GameState::default(), GameState::SetupHomeMenu);
        let json = serde_json::to_string(&GameState::PickBalloonUser).unwrap();
        assert_eq!(json, "\"PickBalloonUser\"");
        assert_eq!(GameState::SetupEndOfRace.to_string(), "SETUP_END_OF_RACE");
    }
}
