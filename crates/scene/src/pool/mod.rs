//! Pooled sprites and cached textures.
//!
//! [`SpriteManager`] hands out sprites from per-texture pools and takes them
//! back, so a battle reuses a fixed set of renderables instead of creating
//! and destroying them per event. Drawing is delegated to a [`RenderHost`].
mod error;
mod host;
mod sprites;
mod texture_cache;

pub use error::PoolError;
pub use host::{HeadlessHost, HeadlessSprite, HeadlessTexture, HostError, RenderHost, Renderable};
pub use sprites::{
    ManagedSprite, PoolConfig, PoolStats, SpriteId, SpriteLease, SpriteManager, VisualUpdate,
};
pub use texture_cache::{TextureCache, TextureCacheStats};
