//! Collidable and penalized entity registries
//!
//! Both are owned by the game context and mutated during the race. The
//! penalty registry keeps entries in insertion order, which normally matches
//! penalty start time, so expiry can stop at the first entry still inside
//! its window.

use std::collections::VecDeque;

use super::entity::EntityId;

/// Entities currently eligible for collision checks, in insertion order
#[derive(Debug, Clone, Default)]
pub struct CollidableRegistry {
    ids: Vec<EntityId>,
}

impl CollidableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the entity was already registered
    pub fn add(&mut self, id: EntityId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        match self.ids.iter().position(|i| *i == id) {
            Some(index) => {
                self.ids.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// A penalized entity and the race time its penalty started
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penalty {
    pub id: EntityId,
    pub since: f32,
}

/// Entities temporarily out of play
#[derive(Debug, Clone)]
pub struct PenaltyRegistry {
    entries: VecDeque<Penalty>,
    /// Start times never decreased across insertions
    monotonic: bool,
}

impl Default for PenaltyRegistry {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            monotonic: true,
        }
    }
}

impl PenaltyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Penalize `id` from `now`; an entity already penalized moves to the back
    pub fn penalize(&mut self, id: EntityId, now: f32) {
        self.entries.retain(|p| p.id != id);
        if self.entries.back().is_some_and(|last| now < last.since) {
            log::debug!("Penalty for {:?} at {:.2} arrived out of order", id, now);
            self.monotonic = false;
        }
        self.entries.push_back(Penalty { id, since: now });
    }

    pub fn is_penalized(&self, id: EntityId) -> bool {
        self.entries.iter().any(|p| p.id == id)
    }

    pub fn since(&self, id: EntityId) -> Option<f32> {
        self.entries.iter().find(|p| p.id == id).map(|p| p.since)
    }

    /// Remove and return every entity whose penalty lasted at least `threshold`
    ///
    /// While insertions stayed in time order the scan stops at the first
    /// entry still inside its window. Otherwise every entry is checked.
    pub fn expire(&mut self, now: f32, threshold: f32) -> Vec<EntityId> {
        let mut expired = Vec::new();
        if self.monotonic {
            while let Some(front) = self.entries.front() {
                if now - front.since < threshold {
                    break;
                }
                expired.push(front.id);
                self.entries.pop_front();
            }
        } else {
            self.entries.retain(|p| {
                if now - p.since < threshold {
                    true
                } else {
                    expired.push(p.id);
                    false
                }
            });
            self.monotonic = self
                .entries
                .iter()
                .zip(self.entries.iter().skip(1))
                .all(|(a, b)| a.since <= b.since);
        }
        expired
    }

    /// Remove every entry, returning the ids in insertion order
    pub fn drain(&mut self) -> Vec<EntityId> {
        self.monotonic = true;
        self.entries.drain(..).map(|p| p.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Penalty> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.monotonic = true;
    }
}
