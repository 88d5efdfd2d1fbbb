//! # Run Rules
//!
//! The static side of a run: every upgrade that can exist, the gameplay events
//! upgrades react to, and the configuration a run starts from.
//! This crate never mutates run progress; the `upgrade_core` crate owns that.

pub mod config;
pub mod entities;
pub mod error;
pub mod events;
pub mod run_state;
pub mod unlocks;
pub mod upgrades;

pub use config::*;
pub use entities::*;
pub use error::*;
pub use events::*;
pub use run_state::*;
pub use unlocks::*;
pub use upgrades::*;
