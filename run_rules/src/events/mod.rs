//! Gameplay events and their context payloads.
//!
//! The upgrade engine forwards these verbatim to equipped upgrades; it never
//! interprets a payload itself. Every payload carries an `extra` JSON value for
//! host-specific data the rules do not model.

use serde::{Deserialize, Serialize};

use crate::entities::{EffectSource, EntityId};

/// High-level state of the game loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameState {
    #[default]
    MainMenu,
    Battle,
    UpgradeSelection,
    Shop,
    Paused,
    GameOver,
}

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Position) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Drag gesture geometry and the entities it currently encloses.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DragEvent {
    pub start: Position,
    pub current: Position,
    pub enclosed: Vec<EntityId>,
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl DragEvent {
    pub fn length(&self) -> f32 {
        self.start.distance(self.current)
    }
}

/// An entity entering or leaving an interaction zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneEvent {
    pub entity: EntityId,
    pub zone: String,
    #[serde(default)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDamageEvent {
    pub amount: i32,
    pub source: EffectSource,
    #[serde(default)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerHealEvent {
    pub amount: i32,
    pub source: EffectSource,
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Damage that would have hit the player but was negated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamagePreventedEvent {
    pub amount: i32,
    pub source: EffectSource,
    #[serde(default)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDamageEvent {
    pub enemy: EntityId,
    pub amount: i32,
    pub source: EffectSource,
    #[serde(default)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyKilledEvent {
    pub enemy: EntityId,
    pub killer: Option<EffectSource>,
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// Start or end of a wave within a battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveEvent {
    pub wave: u32,
    #[serde(default)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateChange {
    pub from: GameState,
    pub to: GameState,
}

impl GameStateChange {
    pub fn new(from: GameState, to: GameState) -> Self {
        Self { from, to }
    }

    /// True when this transition leaves a battle, ending the encounter.
    pub fn ends_battle(&self) -> bool {
        self.from == GameState::Battle && self.to != GameState::Battle
    }
}

/// Per-frame update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickEvent {
    pub delta_seconds: f32,
}

/// Every gameplay event the upgrade engine can broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameplayEvent {
    WaveStarted(WaveEvent),
    WaveFinished(WaveEvent),
    GameStateChanged(GameStateChange),
    Update(TickEvent),
    DragBegan(DragEvent),
    DragContinued(DragEvent),
    DragCompleted(DragEvent),
    ZoneEntered(ZoneEvent),
    ZoneExited(ZoneEvent),
    PlayerDamaged(PlayerDamageEvent),
    PlayerHealed(PlayerHealEvent),
    DamagePrevented(DamagePreventedEvent),
    EnemyDamaged(EnemyDamageEvent),
    EnemyKilled(EnemyKilledEvent),
    Shutdown,
}

impl GameplayEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            GameplayEvent::WaveStarted(_) => "wave_started",
            GameplayEvent::WaveFinished(_) => "wave_finished",
            GameplayEvent::GameStateChanged(_) => "game_state_changed",
            GameplayEvent::Update(_) => "update",
            GameplayEvent::DragBegan(_) => "drag_began",
            GameplayEvent::DragContinued(_) => "drag_continued",
            GameplayEvent::DragCompleted(_) => "drag_completed",
            GameplayEvent::ZoneEntered(_) => "zone_entered",
            GameplayEvent::ZoneExited(_) => "zone_exited",
            GameplayEvent::PlayerDamaged(_) => "player_damaged",
            GameplayEvent::PlayerHealed(_) => "player_healed",
            GameplayEvent::DamagePrevented(_) => "damage_prevented",
            GameplayEvent::EnemyDamaged(_) => "enemy_damaged",
            GameplayEvent::EnemyKilled(_) => "enemy_killed",
            GameplayEvent::Shutdown => "shutdown",
        }
    }
}
