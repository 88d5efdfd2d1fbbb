//! Offer eligibility - which upgrades may currently be offered to the player.
//!
//! The rules are evaluated in order:
//! 1. **Locked**: the unlock oracle refuses the upgrade
//! 2. **Temporary**: wave and instant upgrades never need a slot
//! 3. **Maxed**: a permanent upgrade already held at its max level
//! 4. **Open slot**: fewer permanent upgrades held than the slot capacity
//! 5. **Owned**: no slot left, but the upgrade is already held and can level
//!
//! Everything here is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use run_rules::{Lifetime, UnlockOracle, UpgradeCatalog, UpgradeDefinition, UpgradeId};

use crate::ledger::Ledger;

/// Why an upgrade is or is not offerable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferDecision {
    Locked,
    Temporary,
    Maxed,
    OpenSlot,
    Owned,
    NoSlot,
}

impl OfferDecision {
    pub fn is_eligible(&self) -> bool {
        matches!(
            self,
            OfferDecision::Temporary | OfferDecision::OpenSlot | OfferDecision::Owned
        )
    }
}

/// Run the eligibility rules for a single definition.
pub fn evaluate<O>(
    definition: &UpgradeDefinition,
    ledger: &Ledger,
    capacity: usize,
    unlocks: &O,
) -> OfferDecision
where
    O: UnlockOracle + ?Sized,
{
    if !unlocks.is_unlocked(definition) {
        return OfferDecision::Locked;
    }

    if definition.lifetime != Lifetime::Permanent {
        return OfferDecision::Temporary;
    }

    // Add never clamps, so anything at or above max counts as maxed
    let level = ledger.level_of(&definition.id);
    if level >= definition.max_level {
        return OfferDecision::Maxed;
    }

    if ledger.permanent_count() < capacity {
        return OfferDecision::OpenSlot;
    }

    if level > 0 {
        OfferDecision::Owned
    } else {
        OfferDecision::NoSlot
    }
}

pub fn is_offerable<O>(
    definition: &UpgradeDefinition,
    ledger: &Ledger,
    capacity: usize,
    unlocks: &O,
) -> bool
where
    O: UnlockOracle + ?Sized,
{
    evaluate(definition, ledger, capacity, unlocks).is_eligible()
}

/// Every offerable upgrade in catalog order, optionally limited to one lifetime.
pub fn offerable<O>(
    catalog: &UpgradeCatalog,
    ledger: &Ledger,
    capacity: usize,
    unlocks: &O,
    filter: Option<Lifetime>,
) -> Vec<UpgradeId>
where
    O: UnlockOracle + ?Sized,
{
    catalog
        .iter()
        .filter(|def| filter.map_or(true, |lifetime| def.lifetime == lifetime))
        .filter(|def| is_offerable(def, ledger, capacity, unlocks))
        .map(|def| def.id.clone())
        .collect()
}
