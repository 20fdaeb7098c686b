//! End-of-race fireworks
//!
//! Bursts go up at seeded random positions and intervals above the podium
//! while the result screen is shown.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::platform::{Rgb, Scene};
use crate::settings::Settings;

use super::state::GameState;

const PALETTE: [Rgb; 5] = [0xFF4040, 0xFFD040, 0x40FF80, 0x40A0FF, 0xE040FF];

/// Region above the podium bursts appear in
const SKY_MIN: Vec3 = Vec3::new(-8.0, 16.0, 4.0);
const SKY_MAX: Vec3 = Vec3::new(8.0, 22.0, 8.0);

pub struct Fireworks {
    rng: Pcg32,
    active: bool,
    /// Seconds until the next burst
    countdown: f32,
    min_interval: f32,
    max_interval: f32,
}

impl Fireworks {
    pub fn new(seed: u64, min_interval: f32, max_interval: f32) -> Self {
        let min_interval = min_interval.max(0.01);
        Self {
            rng: Pcg32::seed_from_u64(seed),
            active: false,
            countdown: 0.0,
            min_interval,
            max_interval: max_interval.max(min_interval),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.firework_seed,
            settings.firework_min_interval,
            settings.firework_max_interval,
        )
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn update_state(&mut self, state: GameState, dt: f32, scene: &mut dyn Scene) {
        match state {
            GameState::SetupEndOfRace => {
                self.active = true;
                self.countdown = 0.0;
            }
            GameState::EndOfRace if self.active => {
                self.countdown -= dt;
                while self.countdown <= 0.0 {
                    self.launch(scene);
                    self.countdown += self.rng.random_range(self.min_interval..=self.max_interval);
                }
            }
            GameState::Reset | GameState::Restart => {
                self.active = false;
                scene.clear_bursts();
            }
            _ => {}
        }
    }

    fn launch(&mut self, scene: &mut dyn Scene) {
        let origin = Vec3::new(
            self.rng.random_range(SKY_MIN.x..=SKY_MAX.x),
            self.rng.random_range(SKY_MIN.y..=SKY_MAX.y),
            self.rng.random_range(SKY_MIN.z..=SKY_MAX.z),
        );
        let color = PALETTE[self.rng.random_range(0..PALETTE.len())];
        scene.burst(origin, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::HeadlessScene;

    fn run(seed: u64) -> Vec<(Vec3, Rgb)> {
        let scene = HeadlessScene::new();
        let mut handle = scene.clone();
        let mut fireworks = Fireworks::new(seed, 0.2, 0.8);
        fireworks.update_state(GameState::SetupEndOfRace, 0.0, &mut handle);
        for _ in 0..30 {
            fireworks.update_state(GameState::EndOfRace, 0.05, &mut handle);
        }
        scene.bursts().iter().map(|b| (b.origin, b.color)).collect()
    }

    #[test]
    fn test_same_seed_same_show() {
        let a = run(7);
        assert!(!a.is_empty());
        assert_eq!(a, run(7));
        for (origin, _) in &a {
            assert!(origin.cmpge(SKY_MIN).all() && origin.cmple(SKY_MAX).all());
        }
    }

    #[test]
    fn test_idle_until_end_of_race() {
        let mut scene = HeadlessScene::new();
        let mut fireworks = Fireworks::new(1, 0.2, 0.8);
        fireworks.update_state(GameState::EndOfRace, 1.0, &mut scene);
        assert_eq!(scene.bursts_launched(), 0);

        fireworks.update_state(GameState::SetupEndOfRace, 0.0, &mut scene);
        fireworks.update_state(GameState::EndOfRace, 0.0, &mut scene);
        assert_eq!(scene.bursts_launched(), 1);

        fireworks.update_state(GameState::Reset, 0.0, &mut scene);
        assert!(!fireworks.is_active());
        assert!(scene.bursts().is_empty());
    }
}
