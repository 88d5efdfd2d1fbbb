//! Event dispatch - broadcast gameplay events to every equipped upgrade.

use tracing::debug;

use run_rules::{
    DamagePreventedEvent, DragEvent, EnemyDamageEvent, EnemyKilledEvent, GameContext,
    GameStateChange, GameplayEvent, PlayerDamageEvent, PlayerHealEvent, TickEvent, WaveEvent,
    ZoneEvent,
};

use super::UpgradeEngine;
use crate::behavior::{UpgradeBehavior, UpgradeContext};
use crate::error::{BehaviorResult, EngineResult};
use crate::ledger::SnapshotEntry;

impl UpgradeEngine {
    /// Route an event to its category's broadcast.
    pub fn dispatch(&mut self, event: &GameplayEvent, game: &mut GameContext) -> EngineResult<()> {
        debug!(event = event.name(), equipped = self.ledger.len(), "dispatching event");
        match event {
            GameplayEvent::WaveStarted(e) => self.wave_started(e, game),
            GameplayEvent::WaveFinished(e) => self.wave_finished(e, game),
            GameplayEvent::GameStateChanged(change) => self.game_state_changed(change, game),
            GameplayEvent::Update(tick) => self.update(tick, game),
            GameplayEvent::DragBegan(drag) => self.drag_began(drag, game),
            GameplayEvent::DragContinued(drag) => self.drag_continued(drag, game),
            GameplayEvent::DragCompleted(drag) => self.drag_completed(drag, game),
            GameplayEvent::ZoneEntered(zone) => self.zone_entered(zone, game),
            GameplayEvent::ZoneExited(zone) => self.zone_exited(zone, game),
            GameplayEvent::PlayerDamaged(e) => self.player_damaged(e, game),
            GameplayEvent::PlayerHealed(e) => self.player_healed(e, game),
            GameplayEvent::DamagePrevented(e) => self.damage_prevented(e, game),
            GameplayEvent::EnemyDamaged(e) => self.enemy_damaged(e, game),
            GameplayEvent::EnemyKilled(e) => self.enemy_killed(e, game),
            GameplayEvent::Shutdown => self.shutdown(game),
        }
    }

    pub fn wave_started(&mut self, event: &WaveEvent, game: &mut GameContext) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_wave_started(ctx, event))
    }

    pub fn wave_finished(&mut self, event: &WaveEvent, game: &mut GameContext) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_wave_finished(ctx, event))
    }

    /// Broadcast a state change. `game.state` is set to the new state first.
    ///
    /// Leaving a battle then strips wave upgrades, after every behavior has
    /// seen the change at its current level. The sweep also runs when a
    /// behavior failed during the broadcast.
    pub fn game_state_changed(
        &mut self,
        change: &GameStateChange,
        game: &mut GameContext,
    ) -> EngineResult<()> {
        game.state = change.to;
        let broadcast = self.broadcast(game, |b, ctx| b.on_game_state_changed(ctx, change));
        if change.ends_battle() {
            let sweep = self.end_encounter(game);
            return broadcast.and(sweep);
        }
        broadcast
    }

    pub fn update(&mut self, tick: &TickEvent, game: &mut GameContext) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_update(ctx, tick))
    }

    pub fn drag_began(&mut self, drag: &DragEvent, game: &mut GameContext) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_drag_began(ctx, drag))
    }

    pub fn drag_continued(&mut self, drag: &DragEvent, game: &mut GameContext) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_drag_continued(ctx, drag))
    }

    pub fn drag_completed(&mut self, drag: &DragEvent, game: &mut GameContext) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_drag_completed(ctx, drag))
    }

    pub fn zone_entered(&mut self, zone: &ZoneEvent, game: &mut GameContext) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_zone_entered(ctx, zone))
    }

    pub fn zone_exited(&mut self, zone: &ZoneEvent, game: &mut GameContext) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_zone_exited(ctx, zone))
    }

    pub fn player_damaged(
        &mut self,
        event: &PlayerDamageEvent,
        game: &mut GameContext,
    ) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_player_damaged(ctx, event))
    }

    pub fn player_healed(
        &mut self,
        event: &PlayerHealEvent,
        game: &mut GameContext,
    ) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_player_healed(ctx, event))
    }

    pub fn damage_prevented(
        &mut self,
        event: &DamagePreventedEvent,
        game: &mut GameContext,
    ) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_damage_prevented(ctx, event))
    }

    pub fn enemy_damaged(
        &mut self,
        event: &EnemyDamageEvent,
        game: &mut GameContext,
    ) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_enemy_damaged(ctx, event))
    }

    pub fn enemy_killed(
        &mut self,
        event: &EnemyKilledEvent,
        game: &mut GameContext,
    ) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_enemy_killed(ctx, event))
    }

    pub fn shutdown(&mut self, game: &mut GameContext) -> EngineResult<()> {
        self.broadcast(game, |b, ctx| b.on_shutdown(ctx))
    }

    /// Call `callback` on every entry of a snapshot taken before the first call.
    ///
    /// Commands queued by a behavior are applied right after it returns, so
    /// later entries of this broadcast see an updated game but are still
    /// visited with their snapshot level. Entries added meanwhile are not
    /// visited; entries deleted meanwhile still are.
    fn broadcast<F>(&mut self, game: &mut GameContext, mut callback: F) -> EngineResult<()>
    where
        F: FnMut(&mut dyn UpgradeBehavior, &mut UpgradeContext<'_>) -> BehaviorResult,
    {
        let snapshot = self.ledger.snapshot();
        if snapshot.is_empty() {
            return Ok(());
        }
        debug!(entries = snapshot.len(), "broadcasting event");

        self.dispatch_depth += 1;
        let result = self.visit(&snapshot, game, &mut callback);
        self.dispatch_depth -= 1;
        if self.dispatch_depth == 0 {
            self.retired.clear();
        }
        result
    }

    fn visit<F>(
        &mut self,
        snapshot: &[SnapshotEntry],
        game: &mut GameContext,
        callback: &mut F,
    ) -> EngineResult<()>
    where
        F: FnMut(&mut dyn UpgradeBehavior, &mut UpgradeContext<'_>) -> BehaviorResult,
    {
        for entry in snapshot {
            let commands = self.invoke(entry.key, &entry.id, entry.level, game, &mut *callback)?;
            self.run_commands(commands, game)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::behavior::BehaviorRegistry;
    use crate::error::{BehaviorError, EngineError};
    use run_rules::{
        AllUnlocked, EffectSource, EntityId, EntityKind, FlagValue, GameState, Lifetime, LoadoutConfig,
        PlayerState, UpgradeCatalog, UpgradeDefinition, UpgradeId,
    };

    fn catalog() -> UpgradeCatalog {
        UpgradeCatalog::from_definitions(vec![
            UpgradeDefinition::new("fire", "Fire Aura").with_max_level(3),
            UpgradeDefinition::new("thorn", "Thorn"),
            UpgradeDefinition::new("charge", "Charge").with_max_level(2),
            UpgradeDefinition::new("shield_boost", "Shield Boost").with_lifetime(Lifetime::Wave),
            UpgradeDefinition::new("rage", "Rage").with_lifetime(Lifetime::Wave),
            UpgradeDefinition::new("heal_burst", "Heal Burst").with_lifetime(Lifetime::Instant),
            UpgradeDefinition::new("meddler", "Meddler"),
            UpgradeDefinition::new("regen", "Regen").with_max_level(3),
        ])
        .unwrap()
    }

    fn recording_registry(log: &Log) -> BehaviorRegistry {
        let mut behaviors = BehaviorRegistry::new();
        for id in ["fire", "thorn", "charge", "shield_boost", "rage"] {
            let log = log.clone();
            behaviors.register(id, move || Recorder { log: log.clone() });
        }
        behaviors
    }

    fn id(value: &str) -> UpgradeId {
        UpgradeId::from(value)
    }

    fn tick() -> TickEvent {
        TickEvent { delta_seconds: 0.016 }
    }

    fn heal_event(amount: i32) -> PlayerHealEvent {
        PlayerHealEvent {
            amount,
            source: EffectSource::anonymous(EntityKind::Upgrade),
            extra: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_broadcast_in_insertion_order_with_levels() {
        let log = new_log();
        let mut engine = UpgradeEngine::new(catalog(), recording_registry(&log), LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();

        engine.add_upgrade(&id("thorn"), &mut game).unwrap();
        engine.add_upgrade(&id("fire"), &mut game).unwrap();
        engine.add_upgrade(&id("fire"), &mut game).unwrap();
        log.borrow_mut().clear();

        engine.update(&tick(), &mut game).unwrap();
        assert_eq!(*log.borrow(), vec!["thorn:update:1", "fire:update:2"]);
    }

    #[test]
    fn test_dispatch_routes_by_category() {
        let log = new_log();
        let mut engine = UpgradeEngine::new(catalog(), recording_registry(&log), LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();
        engine.add_upgrade(&id("fire"), &mut game).unwrap();
        log.borrow_mut().clear();

        engine
            .dispatch(&GameplayEvent::WaveStarted(WaveEvent { wave: 1, extra: serde_json::Value::Null }), &mut game)
            .unwrap();
        engine.dispatch(&GameplayEvent::PlayerHealed(heal_event(2)), &mut game).unwrap();
        engine.dispatch(&GameplayEvent::Shutdown, &mut game).unwrap();
        // Recorder ignores enemy kills
        engine
            .dispatch(
                &GameplayEvent::EnemyKilled(EnemyKilledEvent {
                    enemy: EntityId::new(),
                    killer: None,
                    extra: serde_json::Value::Null,
                }),
                &mut game,
            )
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["fire:wave_started:1", "fire:healed:1", "fire:shutdown:1"]
        );
    }

    #[test]
    fn test_battle_end_strips_wave_upgrades() {
        let log = new_log();
        let mut engine = UpgradeEngine::new(catalog(), recording_registry(&log), LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();

        engine.add_upgrade(&id("fire"), &mut game).unwrap();
        engine.add_upgrade(&id("shield_boost"), &mut game).unwrap();
        engine.add_upgrade(&id("rage"), &mut game).unwrap();
        log.borrow_mut().clear();

        let change = GameStateChange::new(GameState::Battle, GameState::UpgradeSelection);
        engine.game_state_changed(&change, &mut game).unwrap();

        assert!(!engine.is_equipped(&id("shield_boost")));
        assert!(!engine.is_equipped(&id("rage")));
        assert_eq!(engine.level_of(&id("fire")), 1);
        // Everyone sees the change before wave upgrades are removed, newest first
        assert_eq!(
            *log.borrow(),
            vec![
                "fire:state_changed:1",
                "shield_boost:state_changed:1",
                "rage:state_changed:1",
                "rage:lost:0",
                "shield_boost:lost:0",
            ]
        );
    }

    #[test]
    fn test_other_transitions_keep_wave_upgrades() {
        let log = new_log();
        let mut engine = UpgradeEngine::new(catalog(), recording_registry(&log), LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();
        engine.add_upgrade(&id("shield_boost"), &mut game).unwrap();

        for (from, to) in [
            (GameState::MainMenu, GameState::Battle),
            (GameState::Battle, GameState::Battle),
            (GameState::Shop, GameState::Paused),
        ] {
            engine
                .dispatch(&GameplayEvent::GameStateChanged(GameStateChange::new(from, to)), &mut game)
                .unwrap();
        }
        assert!(engine.is_equipped(&id("shield_boost")));
    }

    #[test]
    fn test_mutation_during_broadcast_uses_snapshot() {
        let log = new_log();
        let mut behaviors = recording_registry(&log);
        let meddler_log = log.clone();
        behaviors.register("meddler", move || Meddler {
            target: "thorn",
            bonus: "charge",
            log: meddler_log.clone(),
        });
        let mut engine = UpgradeEngine::new(catalog(), behaviors, LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();

        engine.add_upgrade(&id("fire"), &mut game).unwrap();
        engine.add_upgrade(&id("meddler"), &mut game).unwrap();
        engine.add_upgrade(&id("thorn"), &mut game).unwrap();
        log.borrow_mut().clear();

        engine.update(&tick(), &mut game).unwrap();

        // thorn was removed mid-broadcast but still receives the update at its
        // snapshot level; charge was added mid-broadcast and is not visited
        assert_eq!(
            *log.borrow(),
            vec![
                "fire:update:1",
                "meddler:update:1",
                "thorn:lost:0",
                "charge:gained:1",
                "thorn:update:1",
            ]
        );
        let ids: Vec<_> = engine.equipped().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![id("fire"), id("meddler"), id("charge")]);

        // The next event sees the new ledger; charge levels up mid-broadcast
        // but is still visited at its snapshot level
        log.borrow_mut().clear();
        engine.update(&tick(), &mut game).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                "fire:update:1",
                "meddler:update:1",
                "charge:gained:2",
                "charge:update:1",
            ]
        );
        assert_eq!(engine.level_of(&id("charge")), 2);
    }

    #[test]
    fn test_self_removal_during_broadcast() {
        let log = new_log();
        let mut behaviors = recording_registry(&log);
        let regen_log = log.clone();
        behaviors.register("regen", move || ConsumedByHeal { log: regen_log.clone() });
        let mut engine = UpgradeEngine::new(catalog(), behaviors, LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::with_player(PlayerState::new(10));

        engine.add_upgrade(&id("regen"), &mut game).unwrap();
        engine.add_upgrade(&id("regen"), &mut game).unwrap();
        engine.add_upgrade(&id("fire"), &mut game).unwrap();
        log.borrow_mut().clear();

        engine.player_healed(&heal_event(3), &mut game).unwrap();
        assert_eq!(*log.borrow(), vec!["regen:healed:2", "fire:healed:1"]);
        assert_eq!(engine.level_of(&id("regen")), 1);

        log.borrow_mut().clear();
        engine.player_healed(&heal_event(3), &mut game).unwrap();
        assert_eq!(*log.borrow(), vec!["regen:healed:1", "fire:healed:1"]);
        assert!(!engine.is_equipped(&id("regen")));
    }

    #[test]
    fn test_remove_then_readd_during_broadcast() {
        struct Recycler;

        impl UpgradeBehavior for Recycler {
            fn on_update(&mut self, ctx: &mut UpgradeContext<'_>, _tick: &TickEvent) -> BehaviorResult {
                ctx.remove_upgrade("thorn", true);
                ctx.add_upgrade("thorn");
                Ok(())
            }
        }

        let log = new_log();
        let mut behaviors = recording_registry(&log);
        behaviors.register("meddler", || Recycler);
        let mut engine = UpgradeEngine::new(catalog(), behaviors, LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();

        engine.add_upgrade(&id("meddler"), &mut game).unwrap();
        engine.add_upgrade(&id("thorn"), &mut game).unwrap();
        log.borrow_mut().clear();

        engine.update(&tick(), &mut game).unwrap();

        // The old thorn instance gets the update once; the new one is not visited
        assert_eq!(
            *log.borrow(),
            vec!["thorn:lost:0", "thorn:gained:1", "thorn:update:1"]
        );
        assert_eq!(engine.level_of(&id("thorn")), 1);
        assert!(engine.retired.is_empty());
    }

    #[test]
    fn test_behavior_error_propagates() {
        let log = new_log();
        let mut behaviors = recording_registry(&log);
        behaviors.register("meddler", || Faulty);
        let mut engine = UpgradeEngine::new(catalog(), behaviors, LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();

        engine.add_upgrade(&id("meddler"), &mut game).unwrap();
        engine.add_upgrade(&id("fire"), &mut game).unwrap();
        log.borrow_mut().clear();

        let result = engine.update(&tick(), &mut game);
        assert!(matches!(
            result,
            Err(EngineError::Behavior { ref upgrade, .. }) if upgrade.as_str() == "meddler"
        ));
        // The broadcast stopped at the failing behavior
        assert!(log.borrow().is_empty());

        // The behavior was put back, so the ledger still works
        assert!(engine.is_equipped(&id("meddler")));
        engine.remove_upgrade(&id("meddler"), true, &mut game).unwrap();
        engine.update(&tick(), &mut game).unwrap();
        assert_eq!(*log.borrow(), vec!["fire:update:1"]);
    }

    #[test]
    fn test_battle_end_sweeps_despite_failed_broadcast() {
        struct SoreLoser;

        impl UpgradeBehavior for SoreLoser {
            fn on_game_state_changed(
                &mut self,
                _ctx: &mut UpgradeContext<'_>,
                _change: &GameStateChange,
            ) -> BehaviorResult {
                Err(BehaviorError::failed("not leaving"))
            }
        }

        let log = new_log();
        let mut behaviors = recording_registry(&log);
        behaviors.register("shield_boost", || SoreLoser);
        let mut engine = UpgradeEngine::new(catalog(), behaviors, LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();
        engine.add_upgrade(&id("shield_boost"), &mut game).unwrap();
        engine.add_upgrade(&id("rage"), &mut game).unwrap();

        let change = GameStateChange::new(GameState::Battle, GameState::Shop);
        let result = engine.game_state_changed(&change, &mut game);

        assert!(matches!(
            result,
            Err(EngineError::Behavior { ref upgrade, .. }) if upgrade.as_str() == "shield_boost"
        ));
        assert!(engine.equipped().is_empty());
        assert_eq!(game.state, GameState::Shop);
    }

    #[test]
    fn test_state_change_updates_context_before_broadcast() {
        struct BattleCounter;

        impl UpgradeBehavior for BattleCounter {
            fn on_game_state_changed(
                &mut self,
                ctx: &mut UpgradeContext<'_>,
                _change: &GameStateChange,
            ) -> BehaviorResult {
                if ctx.game.in_battle() {
                    ctx.game.bump_counter("battles", 1);
                }
                Ok(())
            }
        }

        let mut behaviors = BehaviorRegistry::new();
        behaviors.register("thorn", || BattleCounter);
        let mut engine = UpgradeEngine::new(catalog(), behaviors, LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();
        engine.add_upgrade(&id("thorn"), &mut game).unwrap();

        for (from, to) in [
            (GameState::MainMenu, GameState::Battle),
            (GameState::Battle, GameState::UpgradeSelection),
            (GameState::UpgradeSelection, GameState::Battle),
        ] {
            engine
                .dispatch(&GameplayEvent::GameStateChanged(GameStateChange::new(from, to)), &mut game)
                .unwrap();
        }

        assert!(game.in_battle());
        assert_eq!(game.flag("battles"), Some(&FlagValue::Int(2)));
    }

    #[test]
    fn test_empty_ledger_broadcast_is_noop() {
        let log = new_log();
        let mut engine = UpgradeEngine::new(catalog(), recording_registry(&log), LoadoutConfig::new(5), AllUnlocked);
        let mut game = GameContext::new();

        engine.shutdown(&mut game).unwrap();
        engine
            .player_damaged(
                &PlayerDamageEvent {
                    amount: 3,
                    source: EffectSource::new(EntityId::new(), EntityKind::Enemy),
                    extra: serde_json::Value::Null,
                },
                &mut game,
            )
            .unwrap();
        assert!(log.borrow().is_empty());
    }
}
