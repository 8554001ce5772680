use async_trait::async_trait;
use battle_core::{
    BattleConfig, BattlePhase, BattleState, CombatEvent, CombatEventKind, DamageType, EventHeader,
    Position3D, SubmittedAction, TeamId, Unit, UnitId,
};
use combat_runtime::{
    ActionProvider, AdvanceAndStrikeProvider, Event, Runtime, RuntimeConfig, RuntimeError, Topic,
    WaitActionProvider, encode_event,
};
use scene::HeadlessHost;

const FRAME_MS: u64 = 16;

fn squad() -> Vec<Unit> {
    vec![
        Unit::new("knight", "player", Position3D::new(2, 2, 0)).with_sprite("knight"),
        Unit::new("archer", "player", Position3D::new(3, 2, 0)).with_sprite("archer"),
        Unit::new("goblin", "enemy", Position3D::new(15, 15, 0)).with_sprite("goblin"),
        Unit::new("orc", "enemy", Position3D::new(16, 15, 0)).with_sprite("orc"),
    ]
}

/// Moves toward a cell it can never reach legally.
struct OutOfReachProvider;

#[async_trait]
impl ActionProvider for OutOfReachProvider {
    async fn provide_action(
        &self,
        unit: &UnitId,
        _state: &BattleState,
    ) -> combat_runtime::Result<SubmittedAction> {
        Ok(SubmittedAction::move_to(unit.clone(), Position3D::new(99, 99, 0)))
    }
}

#[tokio::test]
async fn test_basic_battle_setup() {
    let mut runtime = Runtime::builder(HeadlessHost::new())
        .config(RuntimeConfig::new(BattleConfig::new(20, 20)))
        .combat_id("setup")
        .participants(squad())
        .asset("tile", "tiles/grass.png")
        .build(0)
        .unwrap();

    assert_eq!(runtime.engine().phase(), BattlePhase::Idle);
    assert_eq!(runtime.winner(), None);
    assert_eq!(runtime.view().stats().units, 4);
    assert_eq!(runtime.view().stats().pool.pools, 5);

    runtime.start(0).unwrap();
    assert_eq!(runtime.engine().phase(), BattlePhase::WaitingAction);
    assert!(runtime.active_unit().is_some());
    assert!(runtime.view().is_busy());
}

#[tokio::test]
async fn test_step_requires_providers() {
    let mut runtime = Runtime::builder(HeadlessHost::new())
        .participants(squad())
        .build(0)
        .unwrap();
    runtime.start(0).unwrap();

    // First frame presents the start events; the next one asks for an action.
    runtime.step(FRAME_MS).await.unwrap();
    let mut result = Ok(());
    for frame in 2..200 {
        if let Err(err) = runtime.step(frame * FRAME_MS).await {
            result = Err(err);
            break;
        }
    }
    assert!(matches!(result, Err(RuntimeError::ProviderNotSet { .. })));
}

#[tokio::test]
async fn test_rejected_action_falls_back_to_wait() {
    let mut runtime = Runtime::builder(HeadlessHost::new())
        .participants(vec![
            Unit::new("hero", "player", Position3D::new(1, 1, 0)),
            Unit::new("slime", "enemy", Position3D::new(8, 8, 0)),
        ])
        .player_provider(OutOfReachProvider)
        .npc_provider(OutOfReachProvider)
        .build(0)
        .unwrap();
    runtime.start(0).unwrap();
    let first = runtime.active_unit().cloned().unwrap();

    let mut now = 0;
    loop {
        now += FRAME_MS;
        let outcome = runtime.step(now).await.unwrap();
        if outcome.acted {
            break;
        }
        assert!(now < 10_000, "no action was requested");
    }

    assert_eq!(runtime.engine().phase(), BattlePhase::WaitingAction);
    assert_ne!(runtime.active_unit(), Some(&first));
}

#[tokio::test]
async fn test_full_battle_runs_to_completion() {
    let config = RuntimeConfig::new(BattleConfig::new(10, 10).with_turn_limit(Some(30)));
    let mut runtime = Runtime::builder(HeadlessHost::new())
        .config(config)
        .participants(vec![
            Unit::new("knight", "player", Position3D::new(1, 1, 0)),
            Unit::new("goblin", "enemy", Position3D::new(6, 6, 0)),
        ])
        .asset("effect", "fx/numbers.png")
        .player_provider(AdvanceAndStrikeProvider)
        .npc_provider(AdvanceAndStrikeProvider)
        .build(0)
        .unwrap();
    let mut combat = runtime.subscribe(Topic::Combat);
    runtime.start(0).unwrap();

    let mut now = 0;
    let mut saw_end = false;
    let mut last_sequence = None;
    while !runtime.is_finished() {
        now += FRAME_MS;
        runtime.step(now).await.unwrap();
        while let Ok(event) = combat.try_recv() {
            let Event::Combat(event) = event else {
                panic!("combat topic carried a non-combat event");
            };
            assert!(last_sequence < Some(event.sequence()));
            last_sequence = Some(event.sequence());
            saw_end |= event.event_type() == "combat_ended";
        }
        assert!(now < 400_000, "battle did not finish");
    }

    assert_eq!(runtime.engine().phase(), BattlePhase::Finished);
    assert!(saw_end);

    let stats = runtime.shutdown();
    assert_eq!(stats.animations.queued + stats.animations.playing, 0);
}

#[tokio::test]
async fn test_surrender_ends_battle() {
    let mut runtime = Runtime::builder(HeadlessHost::new())
        .participants(squad())
        .player_provider(WaitActionProvider)
        .npc_provider(WaitActionProvider)
        .build(0)
        .unwrap();
    runtime.start(0).unwrap();
    runtime.surrender(&TeamId::from("enemy"), 50).unwrap();

    assert_eq!(runtime.winner(), Some(&TeamId::player()));
    let mut now = 50;
    while !runtime.is_finished() {
        now += FRAME_MS;
        runtime.step(now).await.unwrap();
        assert!(now < 20_000);
    }
}

#[tokio::test]
async fn test_local_runtime_rejects_remote_events() {
    let mut runtime = Runtime::builder(HeadlessHost::new())
        .combat_id("local")
        .participants(squad())
        .player_provider(WaitActionProvider)
        .npc_provider(WaitActionProvider)
        .build(0)
        .unwrap();
    runtime.start(0).unwrap();
    let next_sequence = runtime.engine().sequencer().next_sequence();

    let hit = CombatEvent::new(
        EventHeader {
            combat_id: "local".into(),
            timestamp: 10,
            turn_number: 1,
            sequence: 500,
        },
        CombatEventKind::DamageApplied {
            target_id: UnitId::from("goblin"),
            source_id: UnitId::from("knight"),
            damage: 100,
            damage_type: DamageType::Physical,
            hp_before: 100,
            hp_after: 0,
            was_critical: false,
            was_blocked: false,
            element: None,
        },
    );
    let raw = encode_event(&hit).unwrap();

    assert!(matches!(
        runtime.receive_remote(&raw),
        Err(RuntimeError::NotMirroring)
    ));
    assert!(matches!(
        runtime.flush_remote(20),
        Err(RuntimeError::NotMirroring)
    ));
    assert!(matches!(
        runtime.apply_remote(&raw, 20),
        Err(RuntimeError::NotMirroring)
    ));

    let goblin = runtime.engine().state().unit(&UnitId::from("goblin")).unwrap();
    assert_eq!(goblin.stats.hp, goblin.stats.hp_max);
    assert_eq!(runtime.engine().phase(), BattlePhase::WaitingAction);
    assert_eq!(runtime.engine().sequencer().next_sequence(), next_sequence);
}
