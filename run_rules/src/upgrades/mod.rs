//! Upgrade definitions - the immutable description of every upgrade type.

mod catalog;

pub use catalog::*;

use serde::{Deserialize, Serialize};

use crate::unlocks::ChallengeId;

/// Stable identity of an upgrade definition, e.g. `"fire_aura"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeId(pub String);

impl UpgradeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UpgradeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UpgradeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for UpgradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How long an equipped upgrade stays in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// Kept until explicitly removed or the run resets. Occupies a slot.
    #[default]
    Permanent,
    /// Removed when the battle it was gained in ends.
    Wave,
    /// Removed right after its gained reaction fires.
    Instant,
}

impl Lifetime {
    /// Only permanent upgrades are bounded by the loadout's slot capacity.
    pub fn uses_slot(&self) -> bool {
        matches!(self, Lifetime::Permanent)
    }
}

/// What must be achieved before an upgrade may be offered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnlockRequirement {
    #[default]
    None,
    Challenge(ChallengeId),
}

fn default_max_level() -> u32 {
    1
}

/// Immutable description of an upgrade type, shared by every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    pub id: UpgradeId,
    pub display_name: String,
    #[serde(default)]
    pub lifetime: Lifetime,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    #[serde(default)]
    pub unlock: UnlockRequirement,
    #[serde(default)]
    pub description: Option<String>,
}

impl UpgradeDefinition {
    /// Create a single-level permanent upgrade with no unlock requirement.
    pub fn new(id: impl Into<UpgradeId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            lifetime: Lifetime::Permanent,
            max_level: 1,
            unlock: UnlockRequirement::None,
            description: None,
        }
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_max_level(mut self, max_level: u32) -> Self {
        self.max_level = max_level;
        self
    }

    /// Gate the upgrade behind a challenge.
    pub fn with_challenge(mut self, challenge: impl Into<ChallengeId>) -> Self {
        self.unlock = UnlockRequirement::Challenge(challenge.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_permanent(&self) -> bool {
        self.lifetime == Lifetime::Permanent
    }
}
