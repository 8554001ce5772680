use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{debug, info, warn};

use super::error::PoolError;
use super::host::{RenderHost, Renderable};
use crate::config::PoolDefaults;

const ANCHOR: (f32, f32) = (0.5, 1.0);
const DEFAULT_TINT: u32 = 0xFF_FF_FF;
const ESTIMATED_SPRITE_KB: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpriteId(u64);

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sprite_{}", self.0)
    }
}

/// Exclusive claim on a checked-out sprite.
///
/// Leases cannot be cloned, and a lease outlived by `release_all` is simply
/// ignored, so a sprite never has two borrowers.
#[derive(Debug, PartialEq, Eq)]
pub struct SpriteLease {
    id: SpriteId,
    checkout: u64,
}

impl SpriteLease {
    pub fn id(&self) -> SpriteId {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    pub texture_key: String,
    /// Sprites created up front. The idle sweep never shrinks below this.
    pub initial_size: usize,
    pub auto_expand: bool,
    pub max_size: usize,
}

impl PoolConfig {
    pub fn new(texture_key: impl Into<String>, defaults: &PoolDefaults) -> Self {
        Self {
            texture_key: texture_key.into(),
            initial_size: defaults.pool_size,
            auto_expand: true,
            max_size: defaults.max_size,
        }
    }

    pub fn with_size(mut self, initial_size: usize) -> Self {
        self.initial_size = initial_size;
        self
    }

    pub fn with_auto_expand(mut self, auto_expand: bool) -> Self {
        self.auto_expand = auto_expand;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

pub struct ManagedSprite<S> {
    id: SpriteId,
    sprite: S,
    in_use: bool,
    checkout: u64,
    last_used: u64,
    pool_key: String,
    user_data: Option<String>,
}

impl<S> ManagedSprite<S> {
    pub fn id(&self) -> SpriteId {
        self.id
    }

    pub fn sprite(&self) -> &S {
        &self.sprite
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use
    }

    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    pub fn pool_key(&self) -> &str {
        &self.pool_key
    }

    pub fn user_data(&self) -> Option<&str> {
        self.user_data.as_deref()
    }
}

/// Partial visual update; `None` fields are left untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisualUpdate {
    pub alpha: Option<f32>,
    pub tint: Option<u32>,
    pub scale: Option<(f32, f32)>,
    pub rotation: Option<f32>,
    pub visible: Option<bool>,
}

impl VisualUpdate {
    pub fn alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn tint(mut self, tint: u32) -> Self {
        self.tint = Some(tint);
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Some((scale, scale));
        self
    }

    pub fn scale(mut self, x: f32, y: f32) -> Self {
        self.scale = Some((x, y));
        self
    }

    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = Some(radians);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoolStats {
    pub total: usize,
    pub active: usize,
    pub available: usize,
    pub pools: usize,
    pub memory_kb: f32,
}

struct Pool<S> {
    config: PoolConfig,
    sprites: Vec<ManagedSprite<S>>,
}

/// Keyed sprite pools over a [`RenderHost`].
pub struct SpriteManager<H: RenderHost> {
    host: H,
    defaults: PoolDefaults,
    textures: HashMap<String, H::Texture>,
    pools: BTreeMap<String, Pool<H::Sprite>>,
    next_id: u64,
    next_checkout: u64,
    clock: u64,
    last_sweep: u64,
    ready: bool,
}

impl<H: RenderHost> SpriteManager<H> {
    pub fn new(host: H, defaults: PoolDefaults) -> Self {
        Self {
            host,
            defaults,
            textures: HashMap::new(),
            pools: BTreeMap::new(),
            next_id: 0,
            next_checkout: 0,
            clock: 0,
            last_sweep: 0,
            ready: false,
        }
    }

    /// Loads every `(key, path)` texture through the host. Empty paths are
    /// skipped. The manager is ready only if all loads succeed.
    pub fn initialize<'a>(
        &mut self,
        textures: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<usize, PoolError> {
        self.ready = false;
        for (key, path) in textures {
            if path.trim().is_empty() {
                continue;
            }
            let texture =
                self.host
                    .load_texture(key, path)
                    .map_err(|source| PoolError::TextureLoad {
                        key: key.to_owned(),
                        source,
                    })?;
            self.textures.insert(key.to_owned(), texture);
        }
        self.ready = true;
        info!(textures = self.textures.len(), "sprite manager initialized");
        Ok(self.textures.len())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Registers a texture produced outside [`Self::initialize`].
    pub fn register_texture(&mut self, key: impl Into<String>, texture: H::Texture) {
        let key = key.into();
        debug!(texture = %key, "texture registered");
        self.textures.insert(key, texture);
    }

    pub fn texture(&self, key: &str) -> Option<&H::Texture> {
        self.textures.get(key)
    }

    pub fn defaults(&self) -> &PoolDefaults {
        &self.defaults
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Creates a pool of hidden sprites. An existing pool for the same key is kept.
    pub fn create_pool(&mut self, config: PoolConfig) -> Result<(), PoolError> {
        if self.pools.contains_key(&config.texture_key) {
            warn!(pool = %config.texture_key, "pool already exists");
            return Ok(());
        }
        let texture = self
            .textures
            .get(&config.texture_key)
            .cloned()
            .ok_or_else(|| PoolError::UnknownTexture(config.texture_key.clone()))?;

        let mut sprites = Vec::with_capacity(config.initial_size);
        for _ in 0..config.initial_size {
            sprites.push(self.spawn(&texture, &config.texture_key));
        }
        debug!(pool = %config.texture_key, size = sprites.len(), "pool created");
        self.pools
            .insert(config.texture_key.clone(), Pool { config, sprites });
        Ok(())
    }

    pub fn has_pool(&self, key: &str) -> bool {
        self.pools.contains_key(key)
    }

    pub fn pool_size(&self, key: &str) -> Option<usize> {
        self.pools.get(key).map(|pool| pool.sprites.len())
    }

    /// Checks out a free sprite, growing the pool when allowed.
    ///
    /// `None` signals back-pressure: the pool is missing or exhausted.
    pub fn get_sprite(
        &mut self,
        key: &str,
        user_data: Option<String>,
        now: u64,
    ) -> Option<SpriteLease> {
        self.clock = self.clock.max(now);
        let Some(pool) = self.pools.get(key) else {
            warn!(pool = key, "pool not found");
            return None;
        };
        let free = pool.sprites.iter().position(|sprite| !sprite.in_use);
        let size = pool.sprites.len();
        let can_grow = pool.config.auto_expand && size < pool.config.max_size;

        let index = match free {
            Some(index) => index,
            None if can_grow => self.expand(key)?,
            None => {
                warn!(pool = key, size, "no sprite available");
                return None;
            }
        };

        let checkout = self.next_checkout;
        self.next_checkout += 1;
        let pool = self.pools.get_mut(key)?;
        let managed = pool.sprites.get_mut(index)?;
        managed.in_use = true;
        managed.checkout = checkout;
        managed.last_used = now;
        managed.user_data = user_data;
        managed.sprite.set_visible(true);

        Some(SpriteLease {
            id: managed.id,
            checkout,
        })
    }

    /// Returns a sprite to its pool and resets its transform and visuals.
    pub fn release_sprite(&mut self, lease: SpriteLease) -> bool {
        let now = self.clock;
        let Some(managed) = self.leased_mut(&lease) else {
            debug!(sprite = %lease.id, "stale sprite lease");
            return false;
        };
        reset(managed, now);
        true
    }

    /// Releases every active sprite, optionally only those of one pool.
    ///
    /// Leases held for these sprites become stale.
    pub fn release_all(&mut self, key: Option<&str>) -> usize {
        let now = self.clock;
        let mut released = 0;
        for (pool_key, pool) in &mut self.pools {
            if key.is_some_and(|key| key != pool_key) {
                continue;
            }
            for managed in pool.sprites.iter_mut().filter(|sprite| sprite.in_use) {
                reset(managed, now);
                released += 1;
            }
        }
        released
    }

    pub fn sprite(&self, lease: &SpriteLease) -> Option<&ManagedSprite<H::Sprite>> {
        self.pools
            .values()
            .flat_map(|pool| pool.sprites.iter())
            .find(|sprite| sprite.id == lease.id && sprite.in_use && sprite.checkout == lease.checkout)
    }

    pub fn update_position(&mut self, lease: &SpriteLease, x: f32, y: f32, z_index: Option<i32>) -> bool {
        let Some(managed) = self.leased_mut(lease) else {
            return false;
        };
        managed.sprite.set_position(x, y);
        if let Some(z_index) = z_index {
            managed.sprite.set_z_index(z_index);
        }
        true
    }

    pub fn update_visuals(&mut self, lease: &SpriteLease, update: VisualUpdate) -> bool {
        let Some(managed) = self.leased_mut(lease) else {
            return false;
        };
        let sprite = &mut managed.sprite;
        if let Some(alpha) = update.alpha {
            sprite.set_alpha(alpha);
        }
        if let Some(tint) = update.tint {
            sprite.set_tint(tint);
        }
        if let Some(rotation) = update.rotation {
            sprite.set_rotation(rotation);
        }
        if let Some(visible) = update.visible {
            sprite.set_visible(visible);
        }
        if let Some((x, y)) = update.scale {
            sprite.set_scale(x, y);
        }
        true
    }

    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            pools: self.pools.len(),
            ..PoolStats::default()
        };
        for pool in self.pools.values() {
            stats.total += pool.sprites.len();
            stats.active += pool.sprites.iter().filter(|sprite| sprite.in_use).count();
        }
        stats.available = stats.total - stats.active;
        stats.memory_kb = stats.total as f32 * ESTIMATED_SPRITE_KB;
        stats
    }

    /// Runs the idle sweep when its interval has elapsed. Returns sprites removed.
    pub fn tick(&mut self, now: u64) -> usize {
        self.clock = self.clock.max(now);
        if now.saturating_sub(self.last_sweep) < self.defaults.sweep_interval_ms {
            return 0;
        }
        self.last_sweep = now;
        self.sweep(now)
    }

    /// Destroys free sprites idle for longer than the configured maximum,
    /// oldest first, without shrinking any pool below its initial size.
    pub fn sweep(&mut self, now: u64) -> usize {
        let max_idle = self.defaults.max_idle_ms;
        let mut removed = 0;
        for (key, pool) in &mut self.pools {
            let removable = pool.sprites.len().saturating_sub(pool.config.initial_size);
            if removable == 0 {
                continue;
            }
            let mut idle: Vec<(u64, SpriteId)> = pool
                .sprites
                .iter()
                .filter(|sprite| !sprite.in_use && now.saturating_sub(sprite.last_used) > max_idle)
                .map(|sprite| (sprite.last_used, sprite.id))
                .collect();
            idle.sort();
            idle.truncate(removable);
            if idle.is_empty() {
                continue;
            }

            let mut kept = Vec::with_capacity(pool.sprites.len() - idle.len());
            for managed in pool.sprites.drain(..) {
                if idle.iter().any(|(_, id)| *id == managed.id) {
                    self.host.destroy_sprite(managed.sprite);
                } else {
                    kept.push(managed);
                }
            }
            pool.sprites = kept;
            removed += idle.len();
            debug!(pool = %key, removed = idle.len(), size = pool.sprites.len(), "idle sprites swept");
        }
        removed
    }

    /// Destroys every sprite and forgets all textures.
    pub fn destroy(&mut self) {
        for (_, pool) in std::mem::take(&mut self.pools) {
            for managed in pool.sprites {
                self.host.destroy_sprite(managed.sprite);
            }
        }
        self.textures.clear();
        self.ready = false;
        debug!("sprite manager destroyed");
    }

    fn spawn(&mut self, texture: &H::Texture, key: &str) -> ManagedSprite<H::Sprite> {
        let mut sprite = self.host.create_sprite(texture);
        sprite.set_anchor(ANCHOR.0, ANCHOR.1);
        sprite.set_visible(false);
        let id = SpriteId(self.next_id);
        self.next_id += 1;
        ManagedSprite {
            id,
            sprite,
            in_use: false,
            checkout: 0,
            last_used: 0,
            pool_key: key.to_owned(),
            user_data: None,
        }
    }

    fn expand(&mut self, key: &str) -> Option<usize> {
        let texture = self.textures.get(key)?.clone();
        let managed = self.spawn(&texture, key);
        let pool = self.pools.get_mut(key)?;
        pool.sprites.push(managed);
        debug!(pool = key, size = pool.sprites.len(), "pool expanded");
        Some(pool.sprites.len() - 1)
    }

    fn leased_mut(&mut self, lease: &SpriteLease) -> Option<&mut ManagedSprite<H::Sprite>> {
        self.pools
            .values_mut()
            .flat_map(|pool| pool.sprites.iter_mut())
            .find(|sprite| sprite.id == lease.id && sprite.in_use && sprite.checkout == lease.checkout)
    }
}

fn reset<S: Renderable>(managed: &mut ManagedSprite<S>, now: u64) {
    let sprite = &mut managed.sprite;
    sprite.set_visible(false);
    sprite.set_position(0.0, 0.0);
    sprite.set_rotation(0.0);
    sprite.set_scale(1.0, 1.0);
    sprite.set_alpha(1.0);
    sprite.set_tint(DEFAULT_TINT);
    managed.in_use = false;
    managed.user_data = None;
    managed.last_used = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::HeadlessHost;

    fn manager() -> SpriteManager<HeadlessHost> {
        let mut manager = SpriteManager::new(HeadlessHost::new(), PoolDefaults::default());
        manager
            .initialize([("unit", "units.png"), ("tile", "tiles.png"), ("fx", "")])
            .unwrap();
        manager
    }

    fn assert_pool_invariant(manager: &SpriteManager<HeadlessHost>) {
        let stats = manager.stats();
        assert_eq!(stats.active + stats.available, stats.total);
    }

    #[test]
    fn test_initialize_skips_empty_paths() {
        let manager = manager();
        assert!(manager.is_ready());
        assert!(manager.texture("unit").is_some());
        assert!(manager.texture("fx").is_none());
        assert_eq!(manager.host().textures_loaded(), 2);
    }

    #[test]
    fn test_initialize_failure_leaves_manager_not_ready() {
        let mut manager =
            SpriteManager::new(HeadlessHost::new().failing_on("tile"), PoolDefaults::default());
        let err = manager
            .initialize([("unit", "units.png"), ("tile", "tiles.png")])
            .unwrap_err();
        assert!(matches!(err, PoolError::TextureLoad { ref key, .. } if key == "tile"));
        assert!(!manager.is_ready());
    }

    #[test]
    fn test_create_pool_requires_texture() {
        let mut manager = manager();
        let err = manager
            .create_pool(PoolConfig::new("missing", &PoolDefaults::default()))
            .unwrap_err();
        assert_eq!(err, PoolError::UnknownTexture("missing".to_owned()));
    }

    #[test]
    fn test_create_pool_twice_keeps_first() {
        let mut manager = manager();
        let defaults = PoolDefaults::default();
        manager
            .create_pool(PoolConfig::new("unit", &defaults).with_size(2))
            .unwrap();
        manager
            .create_pool(PoolConfig::new("unit", &defaults).with_size(5))
            .unwrap();
        assert_eq!(manager.pool_size("unit"), Some(2));
    }

    #[test]
    fn test_new_sprites_are_hidden_and_anchored() {
        let mut manager = manager();
        manager
            .create_pool(PoolConfig::new("unit", &PoolDefaults::default()).with_size(1))
            .unwrap();
        let lease = manager.get_sprite("unit", None, 0).unwrap();
        let sprite = manager.sprite(&lease).unwrap().sprite();
        assert_eq!(sprite.anchor, (0.5, 1.0));
        assert!(sprite.visible);
    }

    #[test]
    fn test_scarcity_without_expansion() {
        let mut manager = manager();
        manager
            .create_pool(
                PoolConfig::new("unit", &PoolDefaults::default())
                    .with_size(2)
                    .with_auto_expand(false),
            )
            .unwrap();

        let first = manager.get_sprite("unit", Some("a".into()), 0).unwrap();
        let second = manager.get_sprite("unit", Some("b".into()), 0).unwrap();
        assert_ne!(first.id(), second.id());
        assert!(manager.get_sprite("unit", None, 0).is_none());
        assert_pool_invariant(&manager);

        assert!(manager.release_sprite(first));
        let third = manager.get_sprite("unit", None, 1);
        assert!(third.is_some());
        assert_pool_invariant(&manager);
    }

    #[test]
    fn test_auto_expand_stops_at_max() {
        let mut manager = manager();
        manager
            .create_pool(
                PoolConfig::new("unit", &PoolDefaults::default())
                    .with_size(1)
                    .with_max_size(3),
            )
            .unwrap();

        let leases: Vec<_> = (0..3)
            .map(|_| manager.get_sprite("unit", None, 0).unwrap())
            .collect();
        assert_eq!(leases.len(), 3);
        assert!(manager.get_sprite("unit", None, 0).is_none());
        assert_eq!(manager.pool_size("unit"), Some(3));
    }

    #[test]
    fn test_release_resets_visuals() {
        let mut manager = manager();
        manager
            .create_pool(PoolConfig::new("unit", &PoolDefaults::default()).with_size(1))
            .unwrap();
        let lease = manager.get_sprite("unit", Some("u1".into()), 0).unwrap();
        let id = lease.id();
        manager.update_position(&lease, 10.0, 20.0, Some(7));
        manager.update_visuals(
            &lease,
            VisualUpdate::default().alpha(0.3).tint(0xff0000).uniform_scale(2.0).rotation(1.0),
        );
        assert_eq!(manager.sprite(&lease).unwrap().user_data(), Some("u1"));
        manager.release_sprite(lease);

        let lease = manager.get_sprite("unit", None, 1).unwrap();
        assert_eq!(lease.id(), id);
        let sprite = manager.sprite(&lease).unwrap().sprite();
        assert_eq!((sprite.x, sprite.y), (0.0, 0.0));
        assert_eq!(sprite.alpha, 1.0);
        assert_eq!(sprite.tint, 0xFFFFFF);
        assert_eq!(sprite.scale, (1.0, 1.0));
        assert_eq!(sprite.rotation, 0.0);
    }

    #[test]
    fn test_stale_lease_after_release_all() {
        let mut manager = manager();
        manager
            .create_pool(PoolConfig::new("unit", &PoolDefaults::default()).with_size(1))
            .unwrap();
        let stale = manager.get_sprite("unit", None, 0).unwrap();
        assert_eq!(manager.release_all(Some("unit")), 1);

        let fresh = manager.get_sprite("unit", None, 1).unwrap();
        assert_eq!(stale.id(), fresh.id());
        assert!(!manager.update_position(&stale, 1.0, 1.0, None));
        assert!(!manager.release_sprite(stale));
        assert!(manager.sprite(&fresh).is_some());
    }

    #[test]
    fn test_sweep_respects_minimum_size() {
        let mut manager = manager();
        manager
            .create_pool(PoolConfig::new("unit", &PoolDefaults::default()).with_size(2))
            .unwrap();
        let leases: Vec<_> = (0..5)
            .map(|_| manager.get_sprite("unit", None, 0).unwrap())
            .collect();
        for lease in leases {
            manager.release_sprite(lease);
        }
        assert_eq!(manager.pool_size("unit"), Some(5));

        assert_eq!(manager.tick(10_000), 0);
        assert_eq!(manager.tick(30_000), 0);
        assert_eq!(manager.tick(90_000), 3);
        assert_eq!(manager.pool_size("unit"), Some(2));
        assert_eq!(manager.sweep(500_000), 0);
        assert_eq!(manager.host().sprites_destroyed(), 3);
    }

    #[test]
    fn test_sweep_keeps_sprites_in_use() {
        let mut manager = manager();
        manager
            .create_pool(PoolConfig::new("unit", &PoolDefaults::default()).with_size(0))
            .unwrap();
        let _held = manager.get_sprite("unit", None, 0).unwrap();
        assert_eq!(manager.sweep(1_000_000), 0);
        assert_eq!(manager.stats().active, 1);
    }

    #[test]
    fn test_destroy_returns_sprites_to_host() {
        let mut manager = manager();
        manager
            .create_pool(PoolConfig::new("unit", &PoolDefaults::default()).with_size(3))
            .unwrap();
        manager
            .create_pool(PoolConfig::new("tile", &PoolDefaults::default()).with_size(2))
            .unwrap();
        assert_eq!(manager.stats().pools, 2);
        manager.destroy();
        assert_eq!(manager.host().live_sprites(), 0);
        assert_eq!(manager.stats(), PoolStats::default());
        assert!(!manager.is_ready());
    }
}
