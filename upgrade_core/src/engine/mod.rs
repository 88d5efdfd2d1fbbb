//! The upgrade engine - sole owner of the ledger.
//!
//! Lifecycle operations live in `lifecycle.rs`, event broadcast in `dispatch.rs`.

mod dispatch;
mod lifecycle;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use run_rules::{
    Lifetime, RunConfig, SlotCapacity, UnlockOracle, UpgradeCatalog, UpgradeDefinition, UpgradeId,
};

use crate::behavior::{BehaviorRegistry, UpgradeBehavior};
use crate::eligibility::{self, OfferDecision};
use crate::error::EngineResult;
use crate::ledger::{EntryKey, EquippedEntry, Ledger};

/// Signal raised for external listeners (UI, stats) after a ledger change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeNotification {
    /// One level of `id` was added; `level` is the level after the add.
    Added { id: UpgradeId, level: u32 },
    /// Levels of `id` were removed. Raised on every removal, including ones
    /// that only decrement; `remaining_level == 0` means fully unequipped.
    Removed {
        id: UpgradeId,
        levels_lost: u32,
        remaining_level: u32,
    },
}

impl UpgradeNotification {
    pub fn id(&self) -> &UpgradeId {
        match self {
            UpgradeNotification::Added { id, .. } => id,
            UpgradeNotification::Removed { id, .. } => id,
        }
    }

    /// True for a removal that took the upgrade out of the ledger.
    pub fn is_unequip(&self) -> bool {
        matches!(
            self,
            UpgradeNotification::Removed {
                remaining_level: 0,
                ..
            }
        )
    }
}

/// Run-scoped upgrade engine.
///
/// Owns the ledger and is the only thing that mutates it. Offer queries read
/// the slot capacity and unlock oracle fresh on every call.
pub struct UpgradeEngine {
    catalog: UpgradeCatalog,
    behaviors: BehaviorRegistry,
    ledger: Ledger,
    slots: Box<dyn SlotCapacity>,
    unlocks: Box<dyn UnlockOracle>,
    notifications: Vec<UpgradeNotification>,

    /// Behaviors of entries deleted while a broadcast is in flight. They still
    /// receive that broadcast and are dropped when it ends.
    retired: HashMap<EntryKey, Box<dyn UpgradeBehavior>>,
    dispatch_depth: u32,
}

impl UpgradeEngine {
    pub fn new(
        catalog: UpgradeCatalog,
        behaviors: BehaviorRegistry,
        slots: impl SlotCapacity + 'static,
        unlocks: impl UnlockOracle + 'static,
    ) -> Self {
        Self {
            catalog,
            behaviors,
            ledger: Ledger::new(),
            slots: Box::new(slots),
            unlocks: Box::new(unlocks),
            notifications: Vec::new(),
            retired: HashMap::new(),
            dispatch_depth: 0,
        }
    }

    /// Build an engine from a run config, using its loadout for slot capacity.
    pub fn from_config(
        config: &RunConfig,
        behaviors: BehaviorRegistry,
        unlocks: impl UnlockOracle + 'static,
    ) -> EngineResult<Self> {
        let catalog = config.catalog()?;
        Ok(Self::new(catalog, behaviors, config.loadout, unlocks))
    }

    pub fn catalog(&self) -> &UpgradeCatalog {
        &self.catalog
    }

    /// Read-only view of the ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Equipped upgrades in broadcast order.
    pub fn equipped(&self) -> Vec<EquippedEntry> {
        self.ledger.entries()
    }

    pub fn is_equipped(&self, id: &UpgradeId) -> bool {
        self.ledger.contains(id)
    }

    pub fn level_of(&self, id: &UpgradeId) -> u32 {
        self.ledger.level_of(id)
    }

    pub fn slot_capacity(&self) -> usize {
        self.slots.permanent_slot_capacity()
    }

    /// Slots still free for new permanent upgrades. 0 when over capacity.
    pub fn open_slots(&self) -> usize {
        self.slot_capacity()
            .saturating_sub(self.ledger.permanent_count())
    }

    /// Why `id` is or is not offerable right now. `None` for unknown ids.
    pub fn offer_decision(&self, id: &UpgradeId) -> Option<OfferDecision> {
        let definition = self.catalog.get(id)?;
        Some(eligibility::evaluate(
            definition,
            &self.ledger,
            self.slot_capacity(),
            self.unlocks.as_ref(),
        ))
    }

    /// Unknown ids are never offerable.
    pub fn is_offerable(&self, id: &UpgradeId) -> bool {
        self.offer_decision(id)
            .map(|decision| decision.is_eligible())
            .unwrap_or(false)
    }

    /// Every upgrade that may be offered right now, in catalog order.
    pub fn eligible_offers(&self, filter: Option<Lifetime>) -> Vec<UpgradeId> {
        eligibility::offerable(
            &self.catalog,
            &self.ledger,
            self.slot_capacity(),
            self.unlocks.as_ref(),
            filter,
        )
    }

    /// Same as [`eligible_offers`](Self::eligible_offers) but yields definitions.
    pub fn eligible_definitions(&self, filter: Option<Lifetime>) -> Vec<&UpgradeDefinition> {
        self.eligible_offers(filter)
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .collect()
    }

    /// Pick up to `count` distinct offers at random from the eligible set.
    pub fn draw_offers<R>(&self, count: usize, filter: Option<Lifetime>, rng: &mut R) -> Vec<UpgradeId>
    where
        R: Rng + ?Sized,
    {
        let pool = self.eligible_offers(filter);
        pool.choose_multiple(rng, count).cloned().collect()
    }

    /// Take every notification raised since the last call, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<UpgradeNotification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, notification: UpgradeNotification) {
        self.notifications.push(notification);
    }
}

impl std::fmt::Debug for UpgradeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpgradeEngine")
            .field("catalog", &self.catalog.len())
            .field("ledger", &self.ledger)
            .field("slot_capacity", &self.slot_capacity())
            .field("pending_notifications", &self.notifications.len())
            .finish()
    }
}
