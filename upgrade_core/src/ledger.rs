//! Equipment ledger - what the player currently holds and at what level.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use run_rules::{Lifetime, UpgradeId};

use crate::behavior::UpgradeBehavior;

/// Identity of one equip of an upgrade.
///
/// Removing an upgrade and equipping it again yields a new key, so a snapshot
/// can tell the old instance from the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey(u64);

/// A ledger entry as seen from outside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedEntry {
    pub id: UpgradeId,
    pub level: u32,
}

/// One entry of a dispatch snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SnapshotEntry {
    pub key: EntryKey,
    pub id: UpgradeId,
    pub level: u32,
}

/// An entry taken out of the ledger, with the behavior it owned.
pub(crate) struct RemovedEntry {
    pub key: EntryKey,
    pub behavior: Option<Box<dyn UpgradeBehavior>>,
}

struct LedgerSlot {
    key: EntryKey,
    lifetime: Lifetime,
    level: u32,
    /// `None` only while the engine is running one of its callbacks.
    behavior: Option<Box<dyn UpgradeBehavior>>,
}

/// Ordered record of equipped upgrades, at most one entry per id.
///
/// Insertion order is the order events are broadcast in. Only the engine
/// mutates the ledger; everyone else gets read access or snapshots.
#[derive(Default)]
pub struct Ledger {
    slots: IndexMap<UpgradeId, LedgerSlot>,
    next_key: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry, in insertion order.
    pub fn entries(&self) -> Vec<EquippedEntry> {
        self.slots
            .iter()
            .map(|(id, slot)| EquippedEntry {
                id: id.clone(),
                level: slot.level,
            })
            .collect()
    }

    pub fn find(&self, id: &UpgradeId) -> Option<EquippedEntry> {
        self.slots.get(id).map(|slot| EquippedEntry {
            id: id.clone(),
            level: slot.level,
        })
    }

    /// Current level of `id`, 0 if not equipped.
    pub fn level_of(&self, id: &UpgradeId) -> u32 {
        self.slots.get(id).map(|slot| slot.level).unwrap_or(0)
    }

    pub fn contains(&self, id: &UpgradeId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of distinct permanent upgrades held. This is what slot capacity bounds.
    pub fn permanent_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.lifetime.uses_slot())
            .count()
    }

    /// Ids with the given lifetime, in insertion order.
    pub fn ids_with_lifetime(&self, lifetime: Lifetime) -> Vec<UpgradeId> {
        self.slots
            .iter()
            .filter(|(_, slot)| slot.lifetime == lifetime)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub(crate) fn snapshot(&self) -> Vec<SnapshotEntry> {
        self.slots
            .iter()
            .map(|(id, slot)| SnapshotEntry {
                key: slot.key,
                id: id.clone(),
                level: slot.level,
            })
            .collect()
    }

    /// Append a new entry. Returns `None` without inserting if `level` is 0 or
    /// `id` is already present.
    pub(crate) fn insert(
        &mut self,
        id: UpgradeId,
        lifetime: Lifetime,
        level: u32,
        behavior: Box<dyn UpgradeBehavior>,
    ) -> Option<EntryKey> {
        if level == 0 || self.slots.contains_key(&id) {
            return None;
        }
        let key = EntryKey(self.next_key);
        self.next_key += 1;
        self.slots.insert(
            id,
            LedgerSlot {
                key,
                lifetime,
                level,
                behavior: Some(behavior),
            },
        );
        Some(key)
    }

    /// Change the level of an existing entry. Level 0 is refused; use
    /// [`remove`](Self::remove) to delete an entry.
    pub(crate) fn set_level(&mut self, id: &UpgradeId, level: u32) -> bool {
        if level == 0 {
            return false;
        }
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.level = level;
                true
            }
            None => false,
        }
    }

    /// Delete an entry, keeping the order of the remaining ones.
    pub(crate) fn remove(&mut self, id: &UpgradeId) -> Option<RemovedEntry> {
        self.slots.shift_remove(id).map(|slot| RemovedEntry {
            key: slot.key,
            behavior: slot.behavior,
        })
    }

    pub(crate) fn key_of(&self, id: &UpgradeId) -> Option<EntryKey> {
        self.slots.get(id).map(|slot| slot.key)
    }

    /// Take the behavior of the entry `id` if it is still the instance `key`.
    pub(crate) fn take_behavior(
        &mut self,
        id: &UpgradeId,
        key: EntryKey,
    ) -> Option<Box<dyn UpgradeBehavior>> {
        self.slots
            .get_mut(id)
            .filter(|slot| slot.key == key)
            .and_then(|slot| slot.behavior.take())
    }

    /// Put a behavior back. Hands it back if the instance is gone.
    pub(crate) fn restore_behavior(
        &mut self,
        id: &UpgradeId,
        key: EntryKey,
        behavior: Box<dyn UpgradeBehavior>,
    ) -> Option<Box<dyn UpgradeBehavior>> {
        match self.slots.get_mut(id) {
            Some(slot) if slot.key == key => {
                slot.behavior = Some(behavior);
                None
            }
            _ => Some(behavior),
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries()).finish()
    }
}
