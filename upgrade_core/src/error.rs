//! Engine errors.

use run_rules::{RulesError, UpgradeId};
use thiserror::Error;

/// Failure reported by an upgrade behavior callback.
#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("{0}")]
    Failed(String),

    #[error("invalid game state: {0}")]
    InvalidState(String),
}

impl BehaviorError {
    pub fn failed(message: impl Into<String>) -> Self {
        BehaviorError::Failed(message.into())
    }
}

pub type BehaviorResult = Result<(), BehaviorError>;

/// Errors returned by the upgrade engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The id is not in the catalog. Ids handed to `add_upgrade` must come
    /// from the catalog, so this is a configuration error.
    #[error("unknown upgrade `{0}`")]
    UnknownUpgrade(UpgradeId),

    /// A behavior callback failed; the dispatch step was abandoned.
    #[error("behavior for upgrade `{upgrade}` failed")]
    Behavior {
        upgrade: UpgradeId,
        #[source]
        source: BehaviorError,
    },

    #[error(transparent)]
    Rules(#[from] RulesError),
}

pub type EngineResult<T> = Result<T, EngineError>;
