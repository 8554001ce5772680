//! JSON snapshots of a battle.
//!
//! A snapshot stores the battle state, its configuration and the event
//! sequencer position, so a restored engine keeps stamping events where the
//! saved one stopped.
use std::fs;
use std::path::{Path, PathBuf};

use battle_core::{BattleConfig, BattleEngine, BattleState, EventSequencer};
use serde::{Deserialize, Serialize};

use crate::api::SnapshotError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleSnapshot {
    pub version: u32,
    pub session_id: String,
    /// Caller clock in milliseconds when the snapshot was taken.
    pub saved_at: u64,
    pub config: BattleConfig,
    pub state: BattleState,
    pub next_sequence: u64,
    pub last_timestamp: u64,
}

impl BattleSnapshot {
    pub const VERSION: u32 = 1;

    pub fn capture(session_id: impl Into<String>, engine: &BattleEngine, saved_at: u64) -> Self {
        let sequencer = engine.sequencer();
        Self {
            version: Self::VERSION,
            session_id: session_id.into(),
            saved_at,
            config: engine.config().clone(),
            state: engine.state().clone(),
            next_sequence: sequencer.next_sequence(),
            last_timestamp: sequencer.last_timestamp(),
        }
    }

    /// Rebuilds the engine, resuming event numbering after the saved position.
    pub fn restore(self) -> BattleEngine {
        let sequencer =
            EventSequencer::resume(self.state.id.clone(), self.next_sequence, self.last_timestamp);
        BattleEngine::from_parts(self.state, self.config, sequencer)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(raw)?;
        if snapshot.version != Self::VERSION {
            return Err(SnapshotError::Version {
                found: snapshot.version,
                expected: Self::VERSION,
            });
        }
        Ok(snapshot)
    }

    /// Writes through a temporary file and renames it into place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, self.to_json()?)?;
        fs::rename(&temp_path, path)?;

        tracing::debug!(
            session = %self.session_id,
            sequence = self.next_sequence,
            "saved snapshot to {}",
            path.display()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let snapshot = Self::from_json(&fs::read_to_string(path)?)?;
        tracing::debug!(session = %snapshot.session_id, "loaded snapshot from {}", path.display());
        Ok(snapshot)
    }

    /// Default file for a session under the platform data directory.
    pub fn default_path(session_id: &str) -> PathBuf {
        snapshot_dir().join(format!("{session_id}.json"))
    }
}

/// Platform data directory for snapshots.
///
/// - Linux: `~/.local/share/tactics/snapshots`
/// - macOS: `~/Library/Application Support/tactics/snapshots`
/// - Fallback: `./save_data/snapshots`
pub fn snapshot_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "tactics")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./save_data"))
        .join("snapshots")
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{Position3D, SubmittedAction, Unit};

    fn engine() -> BattleEngine {
        let units = vec![
            Unit::new("hero", "player", Position3D::new(1, 1, 0)),
            Unit::new("slime", "enemy", Position3D::new(8, 8, 0)),
        ];
        BattleEngine::new("snap", BattleConfig::new(10, 10), units, 1_000)
    }

    #[test]
    fn test_restored_engine_continues_sequence() {
        let mut engine = engine();
        engine.start(1_000).unwrap();
        let active = engine.state().active_unit_id.clone().unwrap();
        engine.act(SubmittedAction::wait(active), 1_500).unwrap();

        let snapshot = BattleSnapshot::capture("s1", &engine, 1_600);
        let restored = BattleSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(restored, snapshot);

        let engine = restored.restore();
        assert_eq!(engine.sequencer().next_sequence(), snapshot.next_sequence);
        assert_eq!(engine.sequencer().last_timestamp(), 1_500);
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let mut snapshot = BattleSnapshot::capture("s1", &engine(), 0);
        snapshot.version = 99;
        let raw = serde_json::to_string(&snapshot).unwrap();
        assert!(matches!(
            BattleSnapshot::from_json(&raw),
            Err(SnapshotError::Version { found: 99, .. })
        ));
    }

    #[test]
    fn test_default_path_ends_with_session() {
        let path = BattleSnapshot::default_path("abc");
        assert!(path.ends_with("snapshots/abc.json"));
    }
}
