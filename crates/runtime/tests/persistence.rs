use battle_core::{BattleConfig, BattlePhase, Position3D, Unit};
use combat_runtime::{
    BattleSnapshot, Runtime, RuntimeConfig, RuntimeError, SnapshotError, WaitActionProvider,
};
use scene::HeadlessHost;
use tempfile::TempDir;

fn units() -> Vec<Unit> {
    vec![
        Unit::new("hero", "player", Position3D::new(1, 1, 0)),
        Unit::new("slime", "enemy", Position3D::new(6, 6, 0)),
    ]
}

async fn played_runtime() -> (Runtime<HeadlessHost>, u64) {
    let mut config = RuntimeConfig::new(BattleConfig::new(8, 8));
    config.session_id = "persist".to_owned();
    let mut runtime = Runtime::builder(HeadlessHost::new())
        .config(config)
        .combat_id("saved")
        .participants(units())
        .player_provider(WaitActionProvider)
        .npc_provider(WaitActionProvider)
        .build(0)
        .unwrap();
    runtime.start(0).unwrap();

    let mut now = 0;
    let mut turns = 0;
    while turns < 3 {
        now += 16;
        if runtime.step(now).await.unwrap().acted {
            turns += 1;
        }
    }
    (runtime, now)
}

#[tokio::test]
async fn test_snapshot_file_round_trip_resumes_battle() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("battles").join("persist.json");

    let (runtime, now) = played_runtime().await;
    runtime.save_snapshot(Some(path.as_path()), now).unwrap();
    let saved = runtime.snapshot(now);

    let loaded = BattleSnapshot::load(&path).unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.session_id, "persist");

    let mut resumed = Runtime::builder(HeadlessHost::new())
        .resume(loaded)
        .player_provider(WaitActionProvider)
        .npc_provider(WaitActionProvider)
        .build(now)
        .unwrap();
    resumed.start(now).unwrap();

    assert_eq!(resumed.engine().phase(), BattlePhase::WaitingAction);
    assert_eq!(resumed.engine().state(), runtime.engine().state());
    assert_eq!(resumed.active_unit(), runtime.active_unit());
    assert_eq!(
        resumed.engine().sequencer().next_sequence(),
        runtime.engine().sequencer().next_sequence()
    );
    assert_eq!(resumed.view().stats().units, 2);
}

#[test]
fn test_loading_garbage_reports_json_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not a snapshot").unwrap();

    let err = BattleSnapshot::load(&path).unwrap_err();
    assert!(matches!(err, SnapshotError::Json(_)));
    assert!(matches!(
        RuntimeError::from(err),
        RuntimeError::Snapshot(SnapshotError::Json(_))
    ));
}

#[test]
fn test_missing_file_reports_io_error() {
    let dir = TempDir::new().unwrap();
    let err = BattleSnapshot::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SnapshotError::Io(_)));
}
