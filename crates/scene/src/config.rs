//! Tunables for the scene components and their environment loaders.
use std::env;

/// Animation scheduler configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Animations allowed to play at once. Ready animations beyond this wait.
    pub max_concurrent: usize,
    /// Capacity of each broadcast channel the scheduler publishes on.
    pub channel_capacity: usize,
}

impl SchedulerConfig {
    pub const DEFAULT_MAX_CONCURRENT: usize = 10;
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

    pub const fn new() -> Self {
        Self {
            max_concurrent: Self::DEFAULT_MAX_CONCURRENT,
            channel_capacity: Self::DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub const fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    /// Environment variables:
    /// - `TACTICS_MAX_ANIMATIONS` - concurrent animation ceiling (default: 10)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(max) = read_env::<usize>("TACTICS_MAX_ANIMATIONS") {
            config.max_concurrent = max.max(1);
        }
        config
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Sprite pool defaults and idle-sweep timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolDefaults {
    pub pool_size: usize,
    pub max_size: usize,
    /// How often [`crate::pool::SpriteManager::tick`] runs the idle sweep.
    pub sweep_interval_ms: u64,
    /// Free sprites unused for longer than this are eligible for eviction.
    pub max_idle_ms: u64,
}

impl PoolDefaults {
    pub const DEFAULT_POOL_SIZE: usize = 10;
    pub const DEFAULT_MAX_SIZE: usize = 50;
    pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 30_000;
    pub const DEFAULT_MAX_IDLE_MS: u64 = 60_000;

    pub const fn new() -> Self {
        Self {
            pool_size: Self::DEFAULT_POOL_SIZE,
            max_size: Self::DEFAULT_MAX_SIZE,
            sweep_interval_ms: Self::DEFAULT_SWEEP_INTERVAL_MS,
            max_idle_ms: Self::DEFAULT_MAX_IDLE_MS,
        }
    }

    /// Environment variables:
    /// - `TACTICS_SWEEP_INTERVAL_MS` - idle sweep period (default: 30000)
    /// - `TACTICS_MAX_IDLE_MS` - idle age before a free sprite may be dropped (default: 60000)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(interval) = read_env::<u64>("TACTICS_SWEEP_INTERVAL_MS") {
            config.sweep_interval_ms = interval.max(1);
        }
        if let Some(idle) = read_env::<u64>("TACTICS_MAX_IDLE_MS") {
            config.max_idle_ms = idle;
        }
        config
    }
}

impl Default for PoolDefaults {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureCacheConfig {
    pub max_entries: usize,
}

impl TextureCacheConfig {
    pub const DEFAULT_MAX_ENTRIES: usize = 100;

    pub const fn new() -> Self {
        Self {
            max_entries: Self::DEFAULT_MAX_ENTRIES,
        }
    }

    /// Environment variables:
    /// - `TACTICS_TEXTURE_CACHE_SIZE` - cached texture limit (default: 100)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(size) = read_env::<usize>("TACTICS_TEXTURE_CACHE_SIZE") {
            config.max_entries = size.max(1);
        }
        config
    }
}

impl Default for TextureCacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Viewport size, clamp bounds and motion tuning of the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Fraction of the remaining distance covered per follow tick.
    pub follow_smoothing: f32,
    /// Interval between two shake offsets.
    pub shake_step_ms: u64,
    /// Zoom change per wheel notch unit.
    pub wheel_zoom_speed: f32,
    pub channel_capacity: usize,
}

impl CameraConfig {
    pub const DEFAULT_SCREEN_WIDTH: f32 = 1280.0;
    pub const DEFAULT_SCREEN_HEIGHT: f32 = 720.0;
    pub const DEFAULT_BOUND: f32 = 1000.0;
    pub const DEFAULT_MIN_ZOOM: f32 = 0.5;
    pub const DEFAULT_MAX_ZOOM: f32 = 3.0;
    pub const DEFAULT_FOLLOW_SMOOTHING: f32 = 0.1;
    pub const DEFAULT_SHAKE_STEP_MS: u64 = 50;
    pub const DEFAULT_WHEEL_ZOOM_SPEED: f32 = 0.1;

    pub const fn new() -> Self {
        Self {
            screen_width: Self::DEFAULT_SCREEN_WIDTH,
            screen_height: Self::DEFAULT_SCREEN_HEIGHT,
            min_x: -Self::DEFAULT_BOUND,
            max_x: Self::DEFAULT_BOUND,
            min_y: -Self::DEFAULT_BOUND,
            max_y: Self::DEFAULT_BOUND,
            min_zoom: Self::DEFAULT_MIN_ZOOM,
            max_zoom: Self::DEFAULT_MAX_ZOOM,
            follow_smoothing: Self::DEFAULT_FOLLOW_SMOOTHING,
            shake_step_ms: Self::DEFAULT_SHAKE_STEP_MS,
            wheel_zoom_speed: Self::DEFAULT_WHEEL_ZOOM_SPEED,
            channel_capacity: 64,
        }
    }

    pub const fn with_screen(mut self, width: f32, height: f32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    /// Environment variables:
    /// - `TACTICS_SCREEN_WIDTH` - viewport width in pixels (default: 1280)
    /// - `TACTICS_SCREEN_HEIGHT` - viewport height in pixels (default: 720)
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(width) = read_env::<f32>("TACTICS_SCREEN_WIDTH") {
            config.screen_width = width.max(1.0);
        }
        if let Some(height) = read_env::<f32>("TACTICS_SCREEN_HEIGHT") {
            config.screen_height = height.max(1.0);
        }
        config
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
