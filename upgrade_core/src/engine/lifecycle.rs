//! Lifecycle - adding, levelling, removing and resetting upgrades.

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use run_rules::{GameContext, Lifetime, UpgradeId};

use super::{UpgradeEngine, UpgradeNotification};
use crate::behavior::{LedgerCommand, UpgradeBehavior, UpgradeContext};
use crate::error::{BehaviorResult, EngineError, EngineResult};
use crate::ledger::EntryKey;

impl UpgradeEngine {
    /// Equip one level of `id`.
    ///
    /// Inserts at level 1 or increments an existing entry, fires the gained
    /// reaction, then raises [`UpgradeNotification::Added`]. Instant upgrades
    /// are removed again within the same call. Eligibility is not checked
    /// here, and the level is not clamped to `max_level`.
    pub fn add_upgrade(&mut self, id: &UpgradeId, game: &mut GameContext) -> EngineResult<()> {
        let commands = self.apply_add(id, game, false)?;
        self.run_commands(commands, game)
    }

    /// Privileged add used for rewards. Identical to
    /// [`add_upgrade`](Self::add_upgrade) but may knowingly exceed slot capacity.
    pub fn add_upgrade_forced(&mut self, id: &UpgradeId, game: &mut GameContext) -> EngineResult<()> {
        let commands = self.apply_add(id, game, true)?;
        self.run_commands(commands, game)
    }

    /// Remove one level of `id`, or all of them. Unknown or absent ids are a no-op.
    ///
    /// [`UpgradeNotification::Removed`] is raised whenever levels were removed,
    /// even if the entry is still equipped afterwards.
    pub fn remove_upgrade(
        &mut self,
        id: &UpgradeId,
        remove_all: bool,
        game: &mut GameContext,
    ) -> EngineResult<()> {
        let commands = self.apply_remove(id, remove_all, game)?;
        self.run_commands(commands, game)
    }

    /// Remove every equipped upgrade, newest first.
    pub fn reset(&mut self, game: &mut GameContext) -> EngineResult<()> {
        let ids: Vec<UpgradeId> = self.ledger.entries().into_iter().map(|e| e.id).collect();
        info!(count = ids.len(), "resetting upgrade ledger");
        self.remove_all_of(ids, game)
    }

    /// Strip every wave upgrade when a battle ends, newest first.
    pub(crate) fn end_encounter(&mut self, game: &mut GameContext) -> EngineResult<()> {
        let ids = self.ledger.ids_with_lifetime(Lifetime::Wave);
        if ids.is_empty() {
            return Ok(());
        }
        info!(count = ids.len(), "encounter ended, removing wave upgrades");
        self.remove_all_of(ids, game)
    }

    /// Remove every id in `ids`, newest first. A failing behavior does not
    /// stop the sweep; the first error is returned once it is done.
    fn remove_all_of(&mut self, ids: Vec<UpgradeId>, game: &mut GameContext) -> EngineResult<()> {
        let mut first_error = None;
        for id in ids.iter().rev() {
            if let Err(err) = self.remove_upgrade(id, true, game) {
                warn!(upgrade = %id, error = %err, "removal reaction failed");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Apply commands queued by behaviors until none are left.
    pub(super) fn run_commands(
        &mut self,
        commands: Vec<LedgerCommand>,
        game: &mut GameContext,
    ) -> EngineResult<()> {
        let mut pending: VecDeque<LedgerCommand> = commands.into();
        while let Some(command) = pending.pop_front() {
            let produced = match command {
                LedgerCommand::Add(id) => self.apply_add(&id, game, false)?,
                LedgerCommand::Remove { id, remove_all } => {
                    self.apply_remove(&id, remove_all, game)?
                }
            };
            pending.extend(produced);
        }
        Ok(())
    }

    fn apply_add(
        &mut self,
        id: &UpgradeId,
        game: &mut GameContext,
        forced: bool,
    ) -> EngineResult<Vec<LedgerCommand>> {
        let lifetime = self
            .catalog
            .get(id)
            .map(|def| def.lifetime)
            .ok_or_else(|| EngineError::UnknownUpgrade(id.clone()))?;

        let (key, new_level) = match self.ledger.key_of(id) {
            Some(key) => {
                let level = self.ledger.level_of(id) + 1;
                self.ledger.set_level(id, level);
                (key, level)
            }
            None => {
                if lifetime.uses_slot() && self.open_slots() == 0 {
                    warn!(
                        upgrade = %id,
                        forced,
                        capacity = self.slot_capacity(),
                        "equipping permanent upgrade beyond slot capacity"
                    );
                }
                let behavior = self.behaviors.create(id);
                match self.ledger.insert(id.clone(), lifetime, 1, behavior) {
                    Some(key) => (key, 1),
                    None => return Ok(Vec::new()),
                }
            }
        };
        debug!(upgrade = %id, level = new_level, forced, "upgrade added");

        // A failed reaction is reported only after the add is complete.
        let reaction = self.invoke(key, id, new_level, game, |behavior, ctx| {
            behavior.on_levels_gained(ctx, 1, new_level)
        });
        self.notify(UpgradeNotification::Added {
            id: id.clone(),
            level: new_level,
        });

        if lifetime == Lifetime::Instant {
            let removal = self.apply_remove(id, true, game);
            return match (reaction, removal) {
                (Ok(mut commands), Ok(more)) => {
                    commands.extend(more);
                    Ok(commands)
                }
                (Err(err), _) | (_, Err(err)) => Err(err),
            };
        }
        reaction
    }

    fn apply_remove(
        &mut self,
        id: &UpgradeId,
        remove_all: bool,
        game: &mut GameContext,
    ) -> EngineResult<Vec<LedgerCommand>> {
        let Some(key) = self.ledger.key_of(id) else {
            return Ok(Vec::new());
        };
        let level = self.ledger.level_of(id);
        let lost = if remove_all { level } else { 1 };
        let new_level = level.saturating_sub(lost);

        if new_level > 0 {
            self.ledger.set_level(id, new_level);
        }
        let reaction = self.invoke(key, id, new_level, game, |behavior, ctx| {
            behavior.on_levels_lost(ctx, lost, new_level)
        });

        if new_level == 0 {
            if let Some(removed) = self.ledger.remove(id) {
                if let Some(behavior) = removed.behavior {
                    self.retire(removed.key, behavior);
                }
            }
        }
        debug!(upgrade = %id, lost, level = new_level, "upgrade removed");

        self.notify(UpgradeNotification::Removed {
            id: id.clone(),
            levels_lost: lost,
            remaining_level: new_level,
        });
        reaction
    }

    /// Run one behavior callback for the instance `key` of `id`, returning the
    /// ledger commands it queued.
    ///
    /// The behavior is taken out of its slot for the duration of the call and
    /// put back afterwards, even if the callback failed.
    pub(super) fn invoke<F>(
        &mut self,
        key: EntryKey,
        id: &UpgradeId,
        level: u32,
        game: &mut GameContext,
        callback: F,
    ) -> EngineResult<Vec<LedgerCommand>>
    where
        F: FnOnce(&mut dyn UpgradeBehavior, &mut UpgradeContext<'_>) -> BehaviorResult,
    {
        let behavior = match self.ledger.take_behavior(id, key) {
            Some(behavior) => Some(behavior),
            None => self.retired.remove(&key),
        };
        let Some(mut behavior) = behavior else {
            return Ok(Vec::new());
        };

        let mut commands = Vec::new();
        let result = {
            let mut ctx = UpgradeContext::new(game, id, level, &mut commands);
            callback(&mut *behavior, &mut ctx)
        };

        if let Some(behavior) = self.ledger.restore_behavior(id, key, behavior) {
            self.retire(key, behavior);
        }

        result.map_err(|source| EngineError::Behavior {
            upgrade: id.clone(),
            source,
        })?;
        Ok(commands)
    }

    /// Keep a deleted entry's behavior alive until the current broadcast ends.
    fn retire(&mut self, key: EntryKey, behavior: Box<dyn UpgradeBehavior>) {
        if self.dispatch_depth > 0 {
            self.retired.insert(key, behavior);
        }
    }
}
