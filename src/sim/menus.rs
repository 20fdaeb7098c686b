//! Menus and the in-race HUD
//!
//! - `HomeMenu`: player name entry
//! - `PlayMenu`: the play button between vehicle and start point picking
//! - `FinalMenu`: race result plus play again / home buttons
//! - `InfoDisplay`: time, laps, vouchers and run status during the race

use crate::input::TriggerKind;
use crate::platform::{Hud, HudField, Scene};
use crate::results::{RaceResult, RaceResults};

use super::actions::{Action, Dispatcher, Subscriber};
use super::entity::Side;
use super::state::GameState;
use super::tick::GameContext;
use super::world::World;

#[derive(Debug, Clone, Default)]
pub struct HomeMenu {
    name: String,
}

impl HomeMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply one key to the name; returns true if it changed
    pub fn write(&mut self, key: &str, max_len: usize) -> bool {
        match key {
            "backspace" => self.name.pop().is_some(),
            "enter" => false,
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if self.name.chars().count() < max_len => {
                        self.name.push(c);
                        true
                    }
                    _ => false,
                }
            }
        }
    }

    pub fn update_state(&mut self, state: GameState, input: &mut Dispatcher, hud: &mut dyn Hud) {
        match state {
            GameState::SetupHomeMenu => {
                input.connect_all_keys(Subscriber::HomeMenu, Action::WriteName, TriggerKind::OnDown);
                hud.show(HudField::Name, &self.name);
            }
            GameState::SetupPickBalloonUser => {
                input.disconnect_all_keys(&Subscriber::HomeMenu);
                log::info!("Player name: {:?}", self.name);
            }
            GameState::Reset => {
                self.name.clear();
                hud.show(HudField::Name, "");
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlayMenu;

impl PlayMenu {
    pub fn update_state(&self, state: GameState, world: &mut World, scene: &mut dyn Scene) {
        let play = world.buttons.play;
        match state {
            GameState::SetupPlayMenu => world.entities.display(play, scene, true),
            GameState::SetupPickStartingPoint => world.entities.display(play, scene, false),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FinalMenu {
    result: Option<RaceResult>,
}

impl FinalMenu {
    pub fn result(&self) -> Option<&RaceResult> {
        self.result.as_ref()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_state(
        &mut self,
        state: GameState,
        ctx: &GameContext,
        world: &mut World,
        player_name: &str,
        laps_to_win: u32,
        results: &mut RaceResults,
        hud: &mut dyn Hud,
        scene: &mut dyn Scene,
    ) {
        let buttons = [world.buttons.play_again, world.buttons.home];
        match state {
            GameState::SetupEndOfRace => {
                let winner = world.winner(laps_to_win).unwrap_or(Side::User);
                let winner_vehicle = world
                    .player(winner)
                    .vehicle
                    .and_then(|id| world.entities.vehicle(id))
                    .map(|v| v.name.clone())
                    .unwrap_or_default();
                let result = RaceResult {
                    player_name: player_name.to_string(),
                    winner,
                    winner_vehicle,
                    race_time: ctx.race_time,
                };
                results.record(result.clone());
                hud.show_result(Some(&result));
                self.result = Some(result);
                for id in buttons {
                    world.entities.display(id, scene, true);
                }
            }
            GameState::Reset | GameState::Restart => {
                for id in buttons {
                    world.entities.display(id, scene, false);
                }
                self.result = None;
                hud.show_result(None);
                if state == GameState::Reset {
                    results.clear();
                }
            }
            _ => {}
        }
    }
}

/// Race HUD
#[derive(Debug, Clone, Default)]
pub struct InfoDisplay;

impl InfoDisplay {
    pub fn update_state(&self, state: GameState, ctx: &GameContext, world: &World, hud: &mut dyn Hud) {
        use GameState as S;

        match state {
            S::SetupHomeMenu | S::Reset | S::Restart => self.reset(hud, ""),
            S::SetupRace => self.reset(hud, "Running"),
            S::Race => {
                let user = world.player(Side::User);
                hud.show(HudField::Time, &format!("{:.2}", ctx.race_time));
                hud.show(HudField::Laps, &user.laps_completed.to_string());
                hud.show(HudField::Vouchers, &user.vouchers.to_string());
            }
            S::SetupPause => hud.show(HudField::Status, "Paused"),
            S::SetupUnpause => hud.show(HudField::Status, "Running"),
            _ => {}
        }
    }

    fn reset(&self, hud: &mut dyn Hud, status: &str) {
        hud.show(HudField::Time, "0.00");
        hud.show(HudField::Laps, "0");
        hud.show(HudField::Vouchers, "0");
        hud.show(HudField::Status, status);
    }
}
