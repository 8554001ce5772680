//! Runtime and view configuration with environment loaders.
use std::env;

use battle_core::{BattleConfig, IsoConfig};
use scene::{CameraConfig, PoolDefaults, SchedulerConfig, TextureCacheConfig};

/// Everything the combat view needs to build its scene components.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
    pub iso: IsoConfig,
    pub scheduler: SchedulerConfig,
    pub pools: PoolDefaults,
    pub textures: TextureCacheConfig,
    pub camera: CameraConfig,
    /// Capacity of each event bus topic.
    pub event_buffer_size: usize,
    /// Directory unit textures are loaded from, keyed by sprite id.
    pub asset_root: String,
    /// Margin kept around the battlefield when the camera frames it.
    pub frame_margin: f32,
}

impl ViewConfig {
    pub const DEFAULT_EVENT_BUFFER: usize = 100;
    pub const DEFAULT_ASSET_ROOT: &'static str = "assets/units";
    pub const DEFAULT_FRAME_MARGIN: f32 = 64.0;

    pub fn new() -> Self {
        Self {
            iso: IsoConfig::new(),
            scheduler: SchedulerConfig::new(),
            pools: PoolDefaults::new(),
            textures: TextureCacheConfig::new(),
            camera: CameraConfig::new(),
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER,
            asset_root: Self::DEFAULT_ASSET_ROOT.to_owned(),
            frame_margin: Self::DEFAULT_FRAME_MARGIN,
        }
    }

    /// Load the scene configs from their own variables, plus:
    /// - `TACTICS_EVENT_BUFFER` - per-topic event bus capacity (default: 100)
    pub fn from_env() -> Self {
        let mut config = Self {
            scheduler: SchedulerConfig::from_env(),
            pools: PoolDefaults::from_env(),
            textures: TextureCacheConfig::from_env(),
            camera: CameraConfig::from_env(),
            ..Self::new()
        };
        if let Some(size) = read_env::<usize>("TACTICS_EVENT_BUFFER") {
            config.event_buffer_size = size.max(1);
        }
        config
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime configuration shared by the battle loop and the view.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    pub battle: BattleConfig,
    pub view: ViewConfig,
    pub session_id: String,
    /// Frame period of the render loop in milliseconds.
    pub frame_ms: u64,
}

impl RuntimeConfig {
    pub const DEFAULT_SESSION_ID: &'static str = "local";
    pub const DEFAULT_FRAME_MS: u64 = 16;

    pub fn new(battle: BattleConfig) -> Self {
        Self {
            battle,
            view: ViewConfig::new(),
            session_id: Self::DEFAULT_SESSION_ID.to_owned(),
            frame_ms: Self::DEFAULT_FRAME_MS,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `TACTICS_TURN_LIMIT` - rounds before the battle ends (default: 50, `0` disables)
    /// - `TACTICS_SESSION_ID` - session identifier used for logs and snapshots
    /// - `TACTICS_FRAME_MS` - render loop period in milliseconds (default: 16)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.view = ViewConfig::from_env();
        if let Some(limit) = read_env::<u32>("TACTICS_TURN_LIMIT") {
            config.battle.turn_limit = (limit > 0).then_some(limit);
        }
        if let Ok(session_id) = env::var("TACTICS_SESSION_ID")
            && !session_id.trim().is_empty()
        {
            config.session_id = session_id;
        }
        if let Some(frame_ms) = read_env::<u64>("TACTICS_FRAME_MS") {
            config.frame_ms = frame_ms.max(1);
        }
        config
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(BattleConfig::new(
            BattleConfig::DEFAULT_GRID_SIZE,
            BattleConfig::DEFAULT_GRID_SIZE,
        ))
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.battle.grid_width, 20);
        assert_eq!(config.battle.turn_limit, Some(50));
        assert_eq!(config.view.event_buffer_size, 100);
        assert_eq!(config.view.scheduler.max_concurrent, 10);
        assert_eq!(config.view.camera.screen_width, 1280.0);
        assert_eq!(config.frame_ms, 16);
    }
}
