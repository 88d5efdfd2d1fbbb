//! Upgrade behaviors - the per-upgrade reaction logic injected into the engine.

use std::collections::HashMap;

use run_rules::{
    DamagePreventedEvent, DragEvent, EnemyDamageEvent, EnemyKilledEvent, GameContext,
    GameStateChange, PlayerDamageEvent, PlayerHealEvent, TickEvent, UpgradeId, WaveEvent,
    ZoneEvent,
};

use crate::error::BehaviorResult;

/// A ledger mutation requested by a behavior while it reacts to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    Add(UpgradeId),
    Remove { id: UpgradeId, remove_all: bool },
}

/// What a behavior sees while reacting: the game, its own id and level, and a
/// queue for ledger changes.
///
/// Queued changes are applied by the engine as soon as the callback returns.
/// They mutate the live ledger only; the broadcast in flight keeps its snapshot.
pub struct UpgradeContext<'a> {
    pub game: &'a mut GameContext,
    id: &'a UpgradeId,
    level: u32,
    commands: &'a mut Vec<LedgerCommand>,
}

impl<'a> UpgradeContext<'a> {
    pub(crate) fn new(
        game: &'a mut GameContext,
        id: &'a UpgradeId,
        level: u32,
        commands: &'a mut Vec<LedgerCommand>,
    ) -> Self {
        Self {
            game,
            id,
            level,
            commands,
        }
    }

    /// Id of the upgrade being notified.
    pub fn id(&self) -> &UpgradeId {
        self.id
    }

    /// Level of the upgrade for this callback.
    ///
    /// For broadcast events this is the level at snapshot time; for gained and
    /// lost reactions it is the level after the change.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Equip one level of `id`, e.g. a bonus upgrade.
    pub fn add_upgrade(&mut self, id: impl Into<UpgradeId>) {
        self.commands.push(LedgerCommand::Add(id.into()));
    }

    pub fn remove_upgrade(&mut self, id: impl Into<UpgradeId>, remove_all: bool) {
        self.commands.push(LedgerCommand::Remove {
            id: id.into(),
            remove_all,
        });
    }

    /// Remove this upgrade, one level or entirely.
    pub fn remove_self(&mut self, remove_all: bool) {
        let id = self.id.clone();
        self.remove_upgrade(id, remove_all);
    }
}

/// Reactions an equipped upgrade can have. Every method defaults to a no-op.
///
/// One instance exists per ledger entry, so fields on the implementing type
/// are per-equip state and are never shared between runs or entries.
#[allow(unused_variables)]
pub trait UpgradeBehavior {
    /// Called after the upgrade gained `gained` levels, now at `new_level`.
    fn on_levels_gained(
        &mut self,
        ctx: &mut UpgradeContext<'_>,
        gained: u32,
        new_level: u32,
    ) -> BehaviorResult {
        Ok(())
    }

    /// Called after the upgrade lost `lost` levels. `new_level == 0` means the
    /// entry is about to leave the ledger.
    fn on_levels_lost(
        &mut self,
        ctx: &mut UpgradeContext<'_>,
        lost: u32,
        new_level: u32,
    ) -> BehaviorResult {
        Ok(())
    }

    fn on_wave_started(&mut self, ctx: &mut UpgradeContext<'_>, event: &WaveEvent) -> BehaviorResult {
        Ok(())
    }

    fn on_wave_finished(&mut self, ctx: &mut UpgradeContext<'_>, event: &WaveEvent) -> BehaviorResult {
        Ok(())
    }

    fn on_game_state_changed(
        &mut self,
        ctx: &mut UpgradeContext<'_>,
        change: &GameStateChange,
    ) -> BehaviorResult {
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut UpgradeContext<'_>, tick: &TickEvent) -> BehaviorResult {
        Ok(())
    }

    fn on_drag_began(&mut self, ctx: &mut UpgradeContext<'_>, drag: &DragEvent) -> BehaviorResult {
        Ok(())
    }

    fn on_drag_continued(&mut self, ctx: &mut UpgradeContext<'_>, drag: &DragEvent) -> BehaviorResult {
        Ok(())
    }

    fn on_drag_completed(&mut self, ctx: &mut UpgradeContext<'_>, drag: &DragEvent) -> BehaviorResult {
        Ok(())
    }

    fn on_zone_entered(&mut self, ctx: &mut UpgradeContext<'_>, zone: &ZoneEvent) -> BehaviorResult {
        Ok(())
    }

    fn on_zone_exited(&mut self, ctx: &mut UpgradeContext<'_>, zone: &ZoneEvent) -> BehaviorResult {
        Ok(())
    }

    fn on_player_damaged(
        &mut self,
        ctx: &mut UpgradeContext<'_>,
        event: &PlayerDamageEvent,
    ) -> BehaviorResult {
        Ok(())
    }

    fn on_player_healed(
        &mut self,
        ctx: &mut UpgradeContext<'_>,
        event: &PlayerHealEvent,
    ) -> BehaviorResult {
        Ok(())
    }

    fn on_damage_prevented(
        &mut self,
        ctx: &mut UpgradeContext<'_>,
        event: &DamagePreventedEvent,
    ) -> BehaviorResult {
        Ok(())
    }

    fn on_enemy_damaged(
        &mut self,
        ctx: &mut UpgradeContext<'_>,
        event: &EnemyDamageEvent,
    ) -> BehaviorResult {
        Ok(())
    }

    fn on_enemy_killed(
        &mut self,
        ctx: &mut UpgradeContext<'_>,
        event: &EnemyKilledEvent,
    ) -> BehaviorResult {
        Ok(())
    }

    fn on_shutdown(&mut self, ctx: &mut UpgradeContext<'_>) -> BehaviorResult {
        Ok(())
    }
}

/// Behavior for upgrades that have no registered logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBehavior;

impl UpgradeBehavior for NoopBehavior {}

type BehaviorFactory = Box<dyn Fn() -> Box<dyn UpgradeBehavior>>;

/// Maps upgrade ids to factories producing a fresh behavior per equip.
#[derive(Default)]
pub struct BehaviorRegistry {
    factories: HashMap<UpgradeId, BehaviorFactory>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `id`, replacing any previous one.
    pub fn register<F, B>(&mut self, id: impl Into<UpgradeId>, factory: F)
    where
        F: Fn() -> B + 'static,
        B: UpgradeBehavior + 'static,
    {
        let factory: BehaviorFactory =
            Box::new(move || -> Box<dyn UpgradeBehavior> { Box::new(factory()) });
        self.factories.insert(id.into(), factory);
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with<F, B>(mut self, id: impl Into<UpgradeId>, factory: F) -> Self
    where
        F: Fn() -> B + 'static,
        B: UpgradeBehavior + 'static,
    {
        self.register(id, factory);
        self
    }

    /// Register a behavior built from its `Default` impl.
    pub fn register_default<B>(&mut self, id: impl Into<UpgradeId>)
    where
        B: UpgradeBehavior + Default + 'static,
    {
        self.register(id, B::default);
    }

    pub fn contains(&self, id: &UpgradeId) -> bool {
        self.factories.contains_key(id)
    }

    /// Create a fresh behavior for `id`, falling back to [`NoopBehavior`].
    pub fn create(&self, id: &UpgradeId) -> Box<dyn UpgradeBehavior> {
        match self.factories.get(id) {
            Some(factory) => factory(),
            None => Box::new(NoopBehavior),
        }
    }
}

impl std::fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorRegistry")
            .field("registered", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
