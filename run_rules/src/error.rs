//! Errors raised while building the static rule set.

use thiserror::Error;

use crate::upgrades::UpgradeId;

/// Errors produced while loading or validating upgrade definitions.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("upgrade `{0}` is defined more than once")]
    DuplicateUpgrade(UpgradeId),

    #[error("upgrade `{0}` must have a max level of at least 1")]
    InvalidMaxLevel(UpgradeId),

    #[error("upgrade definitions must have a non-empty id")]
    EmptyId,

    #[error("invalid rules file: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type RulesResult<T> = Result<T, RulesError>;
