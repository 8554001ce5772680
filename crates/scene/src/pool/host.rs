//! The seam between pooled sprites and whatever actually draws them.
use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

/// A drawable object the pool can position and style.
pub trait Renderable {
    fn set_position(&mut self, x: f32, y: f32);
    fn set_z_index(&mut self, z_index: i32);
    fn set_visible(&mut self, visible: bool);
    fn set_alpha(&mut self, alpha: f32);
    fn set_tint(&mut self, tint: u32);
    fn set_scale(&mut self, x: f32, y: f32);
    fn set_rotation(&mut self, radians: f32);
    fn set_anchor(&mut self, x: f32, y: f32);
}

/// Rendering backend: loads textures by key and creates sprites from them.
pub trait RenderHost {
    type Texture: Clone;
    type Sprite: Renderable;

    fn load_texture(&mut self, key: &str, path: &str) -> Result<Self::Texture, HostError>;

    fn create_sprite(&mut self, texture: &Self::Texture) -> Self::Sprite;

    fn destroy_sprite(&mut self, sprite: Self::Sprite);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("texture '{key}' could not be loaded from '{path}': {reason}")]
    Load {
        key: String,
        path: String,
        reason: String,
    },

    #[error("render host is not available")]
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadlessTexture {
    pub key: Arc<str>,
    pub path: Arc<str>,
}

/// In-memory sprite recording every property the pool sets.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessSprite {
    pub texture: Arc<str>,
    pub x: f32,
    pub y: f32,
    pub z_index: i32,
    pub visible: bool,
    pub alpha: f32,
    pub tint: u32,
    pub scale: (f32, f32),
    pub rotation: f32,
    pub anchor: (f32, f32),
}

impl Renderable for HeadlessSprite {
    fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    fn set_tint(&mut self, tint: u32) {
        self.tint = tint;
    }

    fn set_scale(&mut self, x: f32, y: f32) {
        self.scale = (x, y);
    }

    fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
    }

    fn set_anchor(&mut self, x: f32, y: f32) {
        self.anchor = (x, y);
    }
}

/// Render host without a display, used by tests and the headless binary.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    failing: BTreeSet<String>,
    loaded: usize,
    created: usize,
    destroyed: usize,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every load of `key` fail.
    pub fn failing_on(mut self, key: impl Into<String>) -> Self {
        self.failing.insert(key.into());
        self
    }

    pub fn textures_loaded(&self) -> usize {
        self.loaded
    }

    pub fn sprites_created(&self) -> usize {
        self.created
    }

    pub fn sprites_destroyed(&self) -> usize {
        self.destroyed
    }

    /// Sprites created and not yet destroyed.
    pub fn live_sprites(&self) -> usize {
        self.created - self.destroyed
    }
}

impl RenderHost for HeadlessHost {
    type Texture = HeadlessTexture;
    type Sprite = HeadlessSprite;

    fn load_texture(&mut self, key: &str, path: &str) -> Result<Self::Texture, HostError> {
        if self.failing.contains(key) {
            return Err(HostError::Load {
                key: key.to_owned(),
                path: path.to_owned(),
                reason: "simulated failure".to_owned(),
            });
        }
        self.loaded += 1;
        Ok(HeadlessTexture {
            key: Arc::from(key),
            path: Arc::from(path),
        })
    }

    fn create_sprite(&mut self, texture: &Self::Texture) -> Self::Sprite {
        self.created += 1;
        HeadlessSprite {
            texture: Arc::clone(&texture.key),
            x: 0.0,
            y: 0.0,
            z_index: 0,
            visible: true,
            alpha: 1.0,
            tint: 0xFF_FF_FF,
            scale: (1.0, 1.0),
            rotation: 0.0,
            anchor: (0.0, 0.0),
        }
    }

    fn destroy_sprite(&mut self, _sprite: Self::Sprite) {
        self.destroyed += 1;
    }
}
