//! Players
//!
//! A player is a side of the race: the vehicle it flies, the start point it
//! launched from, its picking marker and its race progress. The user flies
//! by changing wind layers; the opponent is scripted.

use crate::input::TriggerKind;

use super::actions::{Action, Dispatcher, Subscriber};
use super::entity::{EntityId, EntityKind, Side};

/// Layer change keys for the user
const CLIMB_KEY: &str = "w";
const DESCEND_KEY: &str = "s";

#[derive(Debug, Clone)]
pub struct Player {
    pub side: Side,
    pub vehicle: Option<EntityId>,
    pub start_point: Option<EntityId>,
    pub marker: EntityId,
    pub laps_completed: u32,
    /// Each voucher absorbs one collision
    pub vouchers: u32,
    controls_connected: bool,
}

impl Player {
    pub fn new(side: Side, marker: EntityId) -> Self {
        Self {
            side,
            vehicle: None,
            start_point: None,
            marker,
            laps_completed: 0,
            vouchers: 0,
            controls_connected: false,
        }
    }

    pub fn subscriber(&self) -> Subscriber {
        Subscriber::Player(self.side)
    }

    /// Bind the layer change keys; only the user has controls
    pub fn connect_controls(&mut self, input: &mut Dispatcher) {
        if self.side != Side::User || self.controls_connected {
            return;
        }
        input.connect(self.subscriber(), Action::ChangeLayer(1), CLIMB_KEY, TriggerKind::OnDown);
        input.connect(self.subscriber(), Action::ChangeLayer(-1), DESCEND_KEY, TriggerKind::OnDown);
        self.controls_connected = true;
    }

    pub fn disconnect_controls(&mut self, input: &mut Dispatcher) {
        if !self.controls_connected {
            return;
        }
        input.disconnect(&self.subscriber(), CLIMB_KEY);
        input.disconnect(&self.subscriber(), DESCEND_KEY);
        self.controls_connected = false;
    }

    pub fn controls_connected(&self) -> bool {
        self.controls_connected
    }

    /// Record laps from the distance travelled; returns true on a new lap
    pub fn record_laps(&mut self, laps: u32) -> bool {
        if laps > self.laps_completed {
            self.laps_completed = laps;
            log::info!("{:?} completed lap {}", self.side, laps);
            true
        } else {
            false
        }
    }

    pub fn has_won(&self, laps_to_win: u32) -> bool {
        self.laps_completed >= laps_to_win
    }

    /// Outcome of running into something
    pub fn react_to_hit(&mut self, kind: &EntityKind) -> HitOutcome {
        if *kind == EntityKind::Powerup {
            self.vouchers += 1;
            HitOutcome::VoucherGained
        } else {
            self.take_penalty()
        }
    }

    /// Penalty with nothing to hit (leaving the track): a voucher if any, else a time-out
    pub fn take_penalty(&mut self) -> HitOutcome {
        if self.vouchers > 0 {
            self.vouchers -= 1;
            HitOutcome::VoucherSpent
        } else {
            HitOutcome::TimedOut
        }
    }

    /// Race progress back to zero, keeping vehicle and start point
    pub fn restart(&mut self) {
        self.laps_completed = 0;
        self.vouchers = 0;
    }

    /// Forget everything picked this session
    pub fn clear(&mut self) {
        self.restart();
        self.vehicle = None;
        self.start_point = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    VoucherGained,
    VoucherSpent,
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vouchers_absorb_hits() {
        let mut player = Player::new(Side::User, EntityId(0));
        assert_eq!(player.react_to_hit(&EntityKind::Powerup), HitOutcome::VoucherGained);
        assert_eq!(player.react_to_hit(&EntityKind::Obstacle), HitOutcome::VoucherSpent);
        assert_eq!(player.react_to_hit(&EntityKind::Obstacle), HitOutcome::TimedOut);
        assert_eq!(player.vouchers, 0);
    }

    #[test]
    fn test_penalty_without_a_hit() {
        let mut player = Player::new(Side::User, EntityId(0));
        player.vouchers = 1;
        assert_eq!(player.take_penalty(), HitOutcome::VoucherSpent);
        assert_eq!(player.take_penalty(), HitOutcome::TimedOut);
        assert_eq!(player.vouchers, 0);
    }

    #[test]
    fn test_controls_pair_up() {
        let mut input = Dispatcher::new();
        let mut player = Player::new(Side::User, EntityId(0));
        player.connect_controls(&mut input);
        player.connect_controls(&mut input);
        assert_eq!(input.bindings_for("w").len(), 1);
        assert_eq!(input.bindings_for("s")[0].action, Action::ChangeLayer(-1));

        player.disconnect_controls(&mut input);
        assert!(input.bindings_for("w").is_empty());
        assert!(!player.controls_connected());
    }

    #[test]
    fn test_opponent_has_no_controls() {
        let mut input = Dispatcher::new();
        let mut player = Player::new(Side::Opponent, EntityId(1));
        player.connect_controls(&mut input);
        assert!(input.bindings_for("w").is_empty());
    }

    #[test]
    fn test_laps_only_go_up() {
        let mut player = Player::new(Side::User, EntityId(0));
        assert!(player.record_laps(1));
        assert!(!player.record_laps(1));
        assert!(!player.record_laps(0));
        assert!(!player.has_won(3));
        assert!(player.record_laps(3));
        assert!(player.has_won(3));
    }
}
