//! Game settings and tuning
//!
//! Read from LocalStorage on the web and from a JSON file natively.
//! Every field has a default so partial documents are accepted.

use serde::{Deserialize, Serialize};

/// Race tuning and session preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Race ===
    /// Laps a player must complete to win
    pub laps_to_win: u32,
    /// How long the user's vehicle stays timed out after a hit (race seconds)
    pub penalty_time: f32,
    /// How long a hit obstacle/powerup stays out of play (race seconds)
    pub object_respawn_time: f32,
    /// Seconds the scripted opponent needs for one lap
    pub opponent_lap_time: f32,
    /// Wind layer the opponent flies in
    pub opponent_layer: usize,
    /// Wind speed per layer (units/s), ground layer first
    pub wind_speeds: Vec<f32>,
    /// Sideways drift per layer (units/s), positive towards positive lanes
    pub wind_drifts: Vec<f32>,

    // === Presentation ===
    /// Frames between delayed snapshots of the previous camera (0 disables)
    pub display_delay_frames: u32,
    /// Camera distance at which vehicles switch to their low detail model
    pub lod_distance: f32,
    /// Longest player name the home menu accepts
    pub name_max_len: usize,

    // === Fireworks ===
    pub firework_seed: u64,
    pub firework_min_interval: f32,
    pub firework_max_interval: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            laps_to_win: 3,
            penalty_time: 4.0,
            object_respawn_time: 2.0,
            opponent_lap_time: 20.0,
            opponent_layer: 2,
            wind_speeds: vec![0.0, 4.0, 7.0, 10.0, 13.0],
            wind_drifts: vec![0.0, 0.3, -0.3, 0.2, 0.0],

            display_delay_frames: 6,
            lod_distance: 25.0,
            name_max_len: 11,

            firework_seed: 0x5eed,
            firework_min_interval: 0.2,
            firework_max_interval: 0.8,
        }
    }
}

impl Settings {
    /// Wind speed of a layer (0 for layers that don't exist)
    pub fn wind_speed(&self, layer: usize) -> f32 {
        self.wind_speeds.get(layer).copied().unwrap_or(0.0)
    }

    /// Parse settings from JSON, missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "balloon_race_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Settings file used natively, overridable with `BALLOON_RACE_SETTINGS`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn path() -> std::path::PathBuf {
        std::env::var_os("BALLOON_RACE_SETTINGS")
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| std::path::PathBuf::from("balloon_race.json"))
    }

    /// Load settings from the settings file (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let path = Self::path();
        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "laps_to_win": 1, "penalty_time": 6.5 }"#).unwrap();
        assert_eq!(settings.laps_to_win, 1);
        assert_eq!(settings.penalty_time, 6.5);
        assert_eq!(settings.name_max_len, 11);
        assert_eq!(settings.object_respawn_time, 2.0);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Settings::from_json("{ laps_to_win: ").is_err());
    }

    #[test]
    fn test_wind_speed_out_of_range() {
        let settings = Settings::default();
        assert_eq!(settings.wind_speed(0), 0.0);
        assert_eq!(settings.wind_speed(4), 13.0);
        assert_eq!(settings.wind_speed(99), 0.0);
    }

    #[test]
    fn test_player_penalty_outlasts_object_respawn() {
        let settings = Settings::default();
        assert!(settings.penalty_time > settings.object_respawn_time);
    }
}
