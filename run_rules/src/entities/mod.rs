//! Entities that gameplay events refer to.

mod player;

pub use player::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for anything on the battlefield: enemies, projectiles, pickups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create a new random entity ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The nil ID, used for environmental sources with no owning entity.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of entity caused or received an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Projectile,
    Hazard,
    Upgrade,
}

/// The entity behind a damage or heal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSource {
    pub entity: EntityId,
    pub kind: EntityKind,
}

impl EffectSource {
    pub fn new(entity: EntityId, kind: EntityKind) -> Self {
        Self { entity, kind }
    }

    /// A source with no backing entity, e.g. an upgrade healing the player.
    pub fn anonymous(kind: EntityKind) -> Self {
        Self {
            entity: EntityId::nil(),
            kind,
        }
    }
}
