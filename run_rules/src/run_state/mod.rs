//! Run state - the explicit context handed to upgrade behaviors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::PlayerState;
use crate::events::GameState;

/// Flag value types for run-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Everything a behavior may read or change while reacting to an event.
///
/// Passed into every dispatch call in place of global singletons.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GameContext {
    pub player: PlayerState,

    /// Current state of the game loop. The engine sets this on every state
    /// change it dispatches; the host owns every other field.
    pub state: GameState,

    /// Index of the current wave, 0 before the first one starts.
    pub wave: u32,

    /// Seconds of battle time elapsed this run.
    pub elapsed_seconds: f32,

    /// Run-wide flags and counters behaviors can share.
    pub flags: HashMap<String, FlagValue>,
}

impl GameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player(player: PlayerState) -> Self {
        Self {
            player,
            ..Default::default()
        }
    }

    pub fn in_battle(&self) -> bool {
        self.state == GameState::Battle
    }

    pub fn advance(&mut self, delta_seconds: f32) {
        self.elapsed_seconds += delta_seconds.max(0.0);
    }

    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: FlagValue) {
        self.flags.insert(name.into(), value);
    }

    /// Add `delta` to an integer counter, creating it at 0 if missing.
    /// A non-integer flag with the same name is replaced.
    pub fn bump_counter(&mut self, name: &str, delta: i64) -> i64 {
        let entry = self
            .flags
            .entry(name.to_string())
            .or_insert(FlagValue::Int(0));
        let next = match entry {
            FlagValue::Int(current) => *current + delta,
            _ => delta,
        };
        *entry = FlagValue::Int(next);
        next
    }
}
