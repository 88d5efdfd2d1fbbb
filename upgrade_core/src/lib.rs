//! # Upgrade Core
//!
//! The run-scoped upgrade engine. It tracks which upgrades the player holds,
//! decides which upgrades may still be offered, and broadcasts gameplay events
//! to every equipped upgrade's behavior.
//!
//! ## Core Components
//!
//! - **ledger**: Ordered record of equipped upgrades and their levels
//! - **eligibility**: Pure offer rules over catalog, ledger, slots and unlocks
//! - **behavior**: The capability trait upgrades implement, and its registry
//! - **engine**: Lifecycle (add/remove/reset/encounter end) and event dispatch
//!
//! ## Re-entrancy
//!
//! Behaviors never hold the engine. They queue ledger commands through their
//! [`UpgradeContext`]; the engine applies them once the callback returns and
//! keeps iterating the snapshot it took before the broadcast began.

pub mod behavior;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod ledger;

pub use behavior::*;
pub use eligibility::*;
pub use engine::*;
pub use error::*;
pub use ledger::*;
