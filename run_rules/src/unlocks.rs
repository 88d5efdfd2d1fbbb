//! Unlock oracles - decide whether an upgrade's prerequisite has been met.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::upgrades::{UnlockRequirement, UpgradeDefinition};

/// Identifier of a challenge that gates one or more upgrades.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeId(pub String);

impl From<&str> for ChallengeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ChallengeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Answers whether an upgrade is currently permitted to be offered.
///
/// The definition is passed whole so an oracle can consult its id as well as
/// its [`UnlockRequirement`].
pub trait UnlockOracle {
    fn is_unlocked(&self, definition: &UpgradeDefinition) -> bool;
}

impl<F> UnlockOracle for F
where
    F: Fn(&UpgradeDefinition) -> bool,
{
    fn is_unlocked(&self, definition: &UpgradeDefinition) -> bool {
        self(definition)
    }
}

/// Oracle that treats everything as unlocked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllUnlocked;

impl UnlockOracle for AllUnlocked {
    fn is_unlocked(&self, _definition: &UpgradeDefinition) -> bool {
        true
    }
}

/// Oracle backed by the set of challenges the player has completed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChallengeUnlocks {
    completed: HashSet<ChallengeId>,
}

impl ChallengeUnlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed challenge. Returns false if it was already recorded.
    pub fn complete(&mut self, challenge: impl Into<ChallengeId>) -> bool {
        self.completed.insert(challenge.into())
    }

    pub fn is_completed(&self, challenge: &ChallengeId) -> bool {
        self.completed.contains(challenge)
    }
}

impl FromIterator<ChallengeId> for ChallengeUnlocks {
    fn from_iter<T: IntoIterator<Item = ChallengeId>>(iter: T) -> Self {
        Self {
            completed: iter.into_iter().collect(),
        }
    }
}

impl UnlockOracle for ChallengeUnlocks {
    fn is_unlocked(&self, definition: &UpgradeDefinition) -> bool {
        match &definition.unlock {
            UnlockRequirement::None => true,
            UnlockRequirement::Challenge(challenge) => self.is_completed(challenge),
        }
    }
}
