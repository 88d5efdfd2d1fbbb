//! Run configuration - loadout capacity and the upgrade list, loaded from TOML.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

use crate::error::RulesResult;
use crate::upgrades::{UpgradeCatalog, UpgradeDefinition};

/// Supplies how many distinct permanent upgrades may be equipped at once.
///
/// Queried every time eligibility is evaluated; implementations may change
/// their answer between calls.
pub trait SlotCapacity {
    fn permanent_slot_capacity(&self) -> usize;
}

impl<F> SlotCapacity for F
where
    F: Fn() -> usize,
{
    fn permanent_slot_capacity(&self) -> usize {
        self()
    }
}

impl SlotCapacity for usize {
    fn permanent_slot_capacity(&self) -> usize {
        *self
    }
}

impl SlotCapacity for Rc<Cell<usize>> {
    fn permanent_slot_capacity(&self) -> usize {
        self.get()
    }
}

fn default_permanent_slots() -> usize {
    3
}

/// The player's loadout as configured at the start of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutConfig {
    #[serde(default = "default_permanent_slots")]
    pub permanent_slots: usize,
}

impl Default for LoadoutConfig {
    fn default() -> Self {
        Self {
            permanent_slots: default_permanent_slots(),
        }
    }
}

impl LoadoutConfig {
    pub fn new(permanent_slots: usize) -> Self {
        Self { permanent_slots }
    }
}

impl SlotCapacity for LoadoutConfig {
    fn permanent_slot_capacity(&self) -> usize {
        self.permanent_slots
    }
}

/// Slot capacity that can be changed mid-run, e.g. by a loadout screen.
///
/// Clones share the same underlying value. A bare `Rc<Cell<usize>>` works
/// too; this wrapper only adds the `set`/`get` vocabulary.
#[derive(Debug, Clone, Default)]
pub struct SharedSlots(Rc<Cell<usize>>);

impl SharedSlots {
    pub fn new(slots: usize) -> Self {
        Self(Rc::new(Cell::new(slots)))
    }

    pub fn set(&self, slots: usize) {
        self.0.set(slots);
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl SlotCapacity for SharedSlots {
    fn permanent_slot_capacity(&self) -> usize {
        self.get()
    }
}

/// A complete run configuration file.
///
/// ```toml
/// [loadout]
/// permanent_slots = 3
///
/// [[upgrades]]
/// id = "fire"
/// display_name = "Fire Aura"
/// lifetime = "permanent"
/// max_level = 3
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub loadout: LoadoutConfig,
    #[serde(default)]
    pub upgrades: Vec<UpgradeDefinition>,
}

impl RunConfig {
    pub fn from_toml_str(source: &str) -> RulesResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Build the validated upgrade catalog described by this config.
    pub fn catalog(&self) -> RulesResult<UpgradeCatalog> {
        UpgradeCatalog::from_definitions(self.upgrades.iter().cloned())
    }
}
