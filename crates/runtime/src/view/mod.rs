//! Combat view orchestrator.
//!
//! [`CombatView`] owns the scene components (animation scheduler, sprite
//! pools, texture cache, camera) and turns combat events into animations.
//! The caller drives it with a monotonic millisecond clock through
//! [`CombatView::tick`].
mod dispatch;
mod frames;

use std::collections::{BTreeMap, VecDeque};

use battle_core::{
    BattleEngine, BattleState, CombatEvent, IsoCoords, IsoProjection, Position3D, Unit, UnitId,
};
use scene::pool::TextureCacheStats;
use scene::{
    AnimationCompleted, AnimationId, AnimationKind, AnimationScheduler, Camera, CameraState,
    CameraTransition, ChainCompleted, Easing, PoolConfig, PoolError, PoolStats, QueueStatus,
    RenderHost, SpriteLease, SpriteManager, TextureCache, VisualUpdate,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::api::ViewError;
use crate::config::ViewConfig;
use crate::events::{Event, EventBus};

/// Pool holding one sprite per grid cell.
pub const TILE_POOL: &str = "tile";
/// Pool for transient effect sprites such as floating numbers.
pub const EFFECT_POOL: &str = "effect";

/// A unit as the view knows it.
#[derive(Debug, PartialEq)]
pub struct UnitView {
    /// `None` when the unit's pool had no sprite to spare.
    pub lease: Option<SpriteLease>,
    pub pool: String,
    pub position: Position3D,
    pub hp: i32,
    pub hp_max: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewStats {
    pub pool: PoolStats,
    pub textures: TextureCacheStats,
    pub animations: QueueStatus,
    pub camera: CameraState,
    pub units: usize,
    pub events_handled: u64,
}

/// What one [`CombatView::tick`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub events: usize,
    pub frames: usize,
    pub completed: usize,
}

pub struct CombatView<H: RenderHost> {
    config: ViewConfig,
    projection: IsoProjection,
    scheduler: AnimationScheduler,
    sprites: SpriteManager<H>,
    textures: TextureCache<H::Texture>,
    camera: Camera,
    bus: EventBus,
    completions: broadcast::Receiver<AnimationCompleted>,
    chains: broadcast::Receiver<ChainCompleted>,
    camera_changes: broadcast::Receiver<CameraState>,
    pending: VecDeque<CombatEvent>,
    units: BTreeMap<UnitId, UnitView>,
    tiles: Vec<SpriteLease>,
    /// Effect sprites owned by a playing animation.
    effects: BTreeMap<AnimationId, SpriteLease>,
    /// Death animations whose unit is released on completion.
    dying: BTreeMap<AnimationId, UnitId>,
    grid: (i32, i32),
    last_sequence: Option<u64>,
    initialized: bool,
    events_handled: u64,
}

impl<H: RenderHost> CombatView<H> {
    pub fn new(config: ViewConfig, host: H) -> Self {
        let projection = IsoProjection::with_config(config.iso);
        let scheduler = AnimationScheduler::new(config.scheduler);
        let camera = Camera::new(config.camera, projection);
        let completions = scheduler.subscribe_completions();
        let chains = scheduler.subscribe_chains();
        let camera_changes = camera.subscribe();

        Self {
            projection,
            sprites: SpriteManager::new(host, config.pools),
            textures: TextureCache::new(config.textures),
            bus: EventBus::with_capacity(config.event_buffer_size),
            scheduler,
            camera,
            completions,
            chains,
            camera_changes,
            pending: VecDeque::new(),
            units: BTreeMap::new(),
            tiles: Vec::new(),
            effects: BTreeMap::new(),
            dying: BTreeMap::new(),
            grid: (0, 0),
            last_sequence: None,
            initialized: false,
            events_handled: 0,
            config,
        }
    }

    /// Loads assets, builds the pools and places every living unit.
    ///
    /// `assets` pairs texture keys with paths. A `"tile"` or `"effect"` key
    /// enables the matching pool. When loading fails the view stays
    /// uninitialized and every later call reports [`ViewError::NotInitialized`].
    pub fn initialize<'a>(
        &mut self,
        state: &BattleState,
        assets: impl IntoIterator<Item = (&'a str, &'a str)>,
        now: u64,
    ) -> Result<(), ViewError> {
        self.initialized = false;
        let assets: Vec<(&str, &str)> = assets.into_iter().collect();
        self.sprites
            .initialize(assets.iter().copied())
            .map_err(ViewError::Initialization)?;
        for (key, _) in &assets {
            if let Some(texture) = self.sprites.texture(key).cloned() {
                self.textures.insert(*key, texture, now);
            }
        }

        self.grid = (state.grid_width, state.grid_height);
        let defaults = *self.sprites.defaults();
        if self.sprites.texture(TILE_POOL).is_some() {
            let cells = (state.grid_width.max(0) * state.grid_height.max(0)) as usize;
            self.sprites
                .create_pool(
                    PoolConfig::new(TILE_POOL, &defaults)
                        .with_size(cells)
                        .with_auto_expand(false)
                        .with_max_size(cells),
                )
                .map_err(ViewError::Initialization)?;
            self.lay_tiles(now);
        }
        if self.sprites.texture(EFFECT_POOL).is_some() {
            self.sprites
                .create_pool(PoolConfig::new(EFFECT_POOL, &defaults))
                .map_err(ViewError::Initialization)?;
        }

        for unit in state.living_units() {
            self.spawn_unit(unit, now).map_err(|err| match err {
                ViewError::Pool(source) => ViewError::Initialization(source),
                other => other,
            })?;
        }

        self.frame_battlefield(None);
        self.initialized = true;
        info!(
            combat = %state.id,
            units = self.units.len(),
            tiles = self.tiles.len(),
            "combat view initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Buffers events for the next [`CombatView::tick`].
    pub fn enqueue(&mut self, events: impl IntoIterator<Item = CombatEvent>) {
        self.pending.extend(events);
    }

    /// Advances the view to `now`.
    ///
    /// Buffered events are dispatched first, then the scheduler runs and its
    /// frames are written to the sprites. Finished animations give their
    /// sprites back, and the camera and pools advance last.
    pub fn tick(&mut self, now: u64) -> Result<TickSummary, ViewError> {
        if !self.initialized {
            return Err(ViewError::NotInitialized);
        }

        let mut summary = TickSummary::default();
        while let Some(event) = self.pending.pop_front() {
            if let Err(err) = self.handle_event(&event, now) {
                warn!(error = %err, event = event.event_type(), "combat view skipped event");
            }
            summary.events += 1;
        }

        let frames = self.scheduler.tick(now);
        summary.frames = frames.len();
        for frame in &frames {
            self.apply_frame(frame);
        }
        summary.completed = self.settle_completions();

        self.camera.tick(now);
        self.forward_camera_changes();
        self.sprites.tick(now);
        Ok(summary)
    }

    /// Cell under a screen point at elevation `z`, if it is on the grid.
    pub fn pick_cell(&self, screen: IsoCoords, z: i32) -> Option<Position3D> {
        let cell = self.camera.screen_to_grid(screen, z);
        let (width, height) = self.grid;
        (cell.x >= 0 && cell.x < width && cell.y >= 0 && cell.y < height).then_some(cell)
    }

    /// Whether the cell under the pointer is a legal target for the active unit.
    pub fn is_legal_target(&self, engine: &BattleEngine, screen: IsoCoords, z: i32) -> bool {
        self.pick_cell(screen, z)
            .is_some_and(|cell| engine.is_legal_target(cell))
    }

    /// True while events or animations are still being presented.
    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty() || self.scheduler.has_active()
    }

    pub fn stats(&self) -> ViewStats {
        ViewStats {
            pool: self.sprites.stats(),
            textures: self.textures.stats(),
            animations: self.scheduler.status(),
            camera: self.camera.state().clone(),
            units: self.units.len(),
            events_handled: self.events_handled,
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn projection(&self) -> &IsoProjection {
        &self.projection
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut AnimationScheduler {
        &mut self.scheduler
    }

    pub fn sprites(&self) -> &SpriteManager<H> {
        &self.sprites
    }

    pub fn unit(&self, id: &UnitId) -> Option<&UnitView> {
        self.units.get(id)
    }

    /// Rendered sprite of a unit.
    pub fn unit_sprite(&self, id: &UnitId) -> Option<&H::Sprite> {
        let lease = self.units.get(id)?.lease.as_ref()?;
        self.sprites.sprite(lease).map(|managed| managed.sprite())
    }

    /// Cancels all animations, releases every sprite and returns final stats.
    pub fn shutdown(mut self) -> ViewStats {
        self.scheduler.cancel_all();
        self.settle_completions();
        let stats = self.stats();

        let Self {
            scheduler,
            mut sprites,
            mut textures,
            ..
        } = self;
        scheduler.destroy();
        let released = sprites.release_all(None);
        sprites.destroy();
        textures.clear();
        info!(released, events = stats.events_handled, "combat view shut down");
        stats
    }

    fn lay_tiles(&mut self, now: u64) {
        let (width, height) = self.grid;
        for y in 0..height {
            for x in 0..width {
                let cell = Position3D::new(x, y, 0);
                let Some(lease) = self.sprites.get_sprite(TILE_POOL, None, now) else {
                    return;
                };
                place(&mut self.sprites, &self.projection, &lease, cell);
                self.tiles.push(lease);
            }
        }
    }

    /// Makes sure the pool for `key` exists, loading its texture if needed.
    fn ensure_pool(&mut self, key: &str, now: u64) -> Result<(), PoolError> {
        if self.sprites.has_pool(key) {
            self.textures.get(key, now);
            return Ok(());
        }

        let texture = match self.textures.get(key, now).cloned() {
            Some(texture) => texture,
            None => match self.sprites.texture(key).cloned() {
                Some(texture) => texture,
                None => {
                    let path = format!("{}/{key}.png", self.config.asset_root);
                    self.sprites
                        .host_mut()
                        .load_texture(key, &path)
                        .map_err(|source| PoolError::TextureLoad {
                            key: key.to_owned(),
                            source,
                        })?
                }
            },
        };

        let evicted = self.textures.insert(key, texture.clone(), now);
        if !evicted.is_empty() {
            debug!(?evicted, "textures evicted from cache");
        }
        self.sprites.register_texture(key, texture);
        let defaults = *self.sprites.defaults();
        self.sprites.create_pool(PoolConfig::new(key, &defaults))
    }

    fn spawn_unit(&mut self, unit: &Unit, now: u64) -> Result<(), ViewError> {
        let pool = unit.sprite_id.clone();
        self.ensure_pool(&pool, now)?;

        let lease = self.sprites.get_sprite(&pool, Some(unit.id.to_string()), now);
        match &lease {
            Some(lease) => place(&mut self.sprites, &self.projection, lease, unit.position),
            None => warn!(unit = %unit.id, pool = %pool, "unit has no sprite"),
        }
        self.units.insert(
            unit.id.clone(),
            UnitView {
                lease,
                pool,
                position: unit.position,
                hp: unit.stats.hp,
                hp_max: unit.stats.hp_max,
            },
        );
        Ok(())
    }

    fn remove_unit(&mut self, id: &UnitId) {
        if let Some(unit) = self.units.remove(id)
            && let Some(lease) = unit.lease
        {
            self.sprites.release_sprite(lease);
        }
        if self.camera.following() == Some(id) {
            self.camera.stop_following();
        }
        debug!(unit = %id, "unit removed from view");
    }

    fn unit_position(&self, id: &UnitId) -> Result<Position3D, ViewError> {
        self.units
            .get(id)
            .map(|unit| unit.position)
            .ok_or_else(|| ViewError::UnknownUnit(id.clone()))
    }

    fn frame_battlefield(&mut self, transition: Option<CameraTransition>) {
        let (width, height) = self.grid;
        if width <= 0 || height <= 0 {
            return;
        }
        let corners = [
            Position3D::new(0, 0, 0),
            Position3D::new(width - 1, 0, 0),
            Position3D::new(0, height - 1, 0),
            Position3D::new(width - 1, height - 1, 0),
        ];
        self.camera
            .frame_area(&corners, self.config.frame_margin, transition);
    }

    /// Drains scheduler completions, returning how many animations finished.
    fn settle_completions(&mut self) -> usize {
        let mut count = 0;
        loop {
            match self.completions.try_recv() {
                Ok(done) => {
                    count += 1;
                    self.settle(&done);
                    self.bus.publish(Event::AnimationCompleted(done));
                }
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "animation completions lagged");
                    self.reconcile();
                }
                Err(_) => break,
            }
        }
        loop {
            match self.chains.try_recv() {
                Ok(done) => self.bus.publish(Event::ChainCompleted(done)),
                Err(TryRecvError::Lagged(missed)) => warn!(missed, "chain completions lagged"),
                Err(_) => break,
            }
        }
        count
    }

    fn settle(&mut self, done: &AnimationCompleted) {
        if let Some(lease) = self.effects.remove(&done.id) {
            self.sprites.release_sprite(lease);
        }
        if let Some(unit) = self.dying.remove(&done.id) {
            self.remove_unit(&unit);
        }
        // A cancelled move leaves the sprite mid-path.
        if !done.success
            && done.spec.kind == AnimationKind::UnitMove
            && let Some(id) = &done.spec.unit_id
            && let Some(unit) = self.units.get(id)
            && let Some(lease) = &unit.lease
        {
            place(&mut self.sprites, &self.projection, lease, unit.position);
        }
    }

    /// Releases everything owned by animations that are no longer queued.
    fn reconcile(&mut self) {
        let finished: Vec<AnimationId> = self
            .effects
            .keys()
            .chain(self.dying.keys())
            .copied()
            .filter(|id| self.scheduler.animation_status(*id).is_none())
            .collect();
        for id in finished {
            if let Some(lease) = self.effects.remove(&id) {
                self.sprites.release_sprite(lease);
            }
            if let Some(unit) = self.dying.remove(&id) {
                self.remove_unit(&unit);
            }
        }
    }

    fn forward_camera_changes(&mut self) {
        loop {
            match self.camera_changes.try_recv() {
                Ok(state) => self.bus.publish(Event::Camera(state)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }
}

/// Puts a sprite on a grid cell with its depth-sorted z-index.
fn place<H: RenderHost>(
    sprites: &mut SpriteManager<H>,
    projection: &IsoProjection,
    lease: &SpriteLease,
    cell: Position3D,
) {
    let world = projection.to_screen(cell);
    sprites.update_position(lease, world.x, world.y, Some(projection.z_index(cell)));
    sprites.update_visuals(lease, VisualUpdate::default().visible(true).alpha(1.0));
}

/// Camera move used for scripted framing.
fn framing_transition(duration: u64) -> CameraTransition {
    CameraTransition::new(duration, Easing::EaseInOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{BattleConfig, Unit};
    use scene::HeadlessHost;

    fn state() -> BattleState {
        let units = vec![
            Unit::new("knight", "player", Position3D::new(1, 1, 0)).with_sprite("knight"),
            Unit::new("slime", "enemy", Position3D::new(4, 4, 0)).with_sprite("slime"),
        ];
        BattleEngine::new("view", BattleConfig::new(6, 6), units, 0)
            .state()
            .clone()
    }

    fn view() -> CombatView<HeadlessHost> {
        let mut view = CombatView::new(ViewConfig::new(), HeadlessHost::new());
        view.initialize(&state(), [("tile", "tiles/grass.png"), ("effect", "fx/spark.png")], 0)
            .unwrap();
        view
    }

    #[test]
    fn test_initialize_places_units_and_tiles() {
        let view = view();
        assert!(view.is_initialized());
        assert_eq!(view.stats().units, 2);
        assert_eq!(view.tiles.len(), 36);

        let knight = UnitId::from("knight");
        let sprite = view.unit_sprite(&knight).unwrap();
        let expected = view.projection().to_screen(Position3D::new(1, 1, 0));
        assert_eq!((sprite.x, sprite.y), (expected.x, expected.y));
        assert!(sprite.visible);
    }

    #[test]
    fn test_failed_asset_load_leaves_view_unready() {
        let mut view = CombatView::new(ViewConfig::new(), HeadlessHost::new().failing_on("tile"));
        let err = view.initialize(&state(), [("tile", "tiles/grass.png")], 0);
        assert!(matches!(err, Err(ViewError::Initialization(_))));
        assert!(!view.is_initialized());
        assert_eq!(view.tick(16), Err(ViewError::NotInitialized));
    }

    #[test]
    fn test_pick_cell_stays_on_grid() {
        let view = view();
        let cell = Position3D::new(2, 3, 0);
        let screen = view.camera().grid_to_screen(cell);
        assert_eq!(view.pick_cell(screen, 0), Some(cell));

        let off_grid = view.camera().grid_to_screen(Position3D::new(9, 9, 0));
        assert_eq!(view.pick_cell(off_grid, 0), None);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let view = view();
        let stats = view.shutdown();
        assert_eq!(stats.units, 2);
        assert!(stats.pool.active > 0);
    }}
