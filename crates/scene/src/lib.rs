//! Presentation layer for an isometric battle.
//!
//! The scene crate owns everything that moves on screen but does not decide
//! the battle: easing curves, the animation scheduler, pooled sprites and the
//! camera. Components are advanced by an explicit millisecond clock passed to
//! their `tick` methods, which keeps them deterministic under test.
pub mod animation;
pub mod camera;
pub mod config;
pub mod easing;
pub mod pool;

pub use animation::{
    AnimationCallbacks, AnimationCategory, AnimationCompleted, AnimationFrame, AnimationId,
    AnimationKind, AnimationScheduler, AnimationSpec, AnimationStatus, ChainCompleted, ChainId,
    ChainMode, ChainSpec, QueueStatus,
};
pub use camera::{Camera, CameraBounds, CameraState, CameraTransition};
pub use config::{CameraConfig, PoolDefaults, SchedulerConfig, TextureCacheConfig};
pub use easing::{Easing, interpolate};
pub use pool::{
    HeadlessHost, HostError, PoolConfig, PoolError, PoolStats, RenderHost, Renderable,
    SpriteLease, SpriteManager, TextureCache, VisualUpdate,
};
