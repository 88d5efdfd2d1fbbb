//! Player state that upgrade behaviors read and modify.

use serde::{Deserialize, Serialize};

/// Health and defensive stats of the player for the current run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub current_hp: i32,
    pub max_hp: i32,
    /// Absorbs damage before health does.
    pub shield: i32,
    /// Flat bonus added to every hit dealt by the player.
    pub bonus_damage: i32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_hp: 10,
            max_hp: 10,
            shield: 0,
            bonus_damage: 0,
        }
    }
}

impl PlayerState {
    pub fn new(max_hp: i32) -> Self {
        Self {
            current_hp: max_hp,
            max_hp,
            ..Default::default()
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0
    }

    /// Restore health, capped at `max_hp`. Returns the amount actually healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let before = self.current_hp;
        self.current_hp = (self.current_hp + amount).min(self.max_hp);
        self.current_hp - before
    }

    /// Apply damage, draining shield first. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let remaining = amount - absorbed;
        let before = self.current_hp;
        self.current_hp = (self.current_hp - remaining).max(0);
        before - self.current_hp
    }
}
