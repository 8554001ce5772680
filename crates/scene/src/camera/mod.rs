//! Viewport camera over the isometric world.
//!
//! World space is the projected plane produced by
//! [`IsoProjection`](battle_core::IsoProjection). The camera maps it to the
//! screen as `screen = R(rotation) · (world · zoom) + position`.
//!
//! Every mutation, whether immediate, interpolated, followed or shaken, goes
//! through one clamping update, so position and zoom never leave
//! [`CameraBounds`].
mod jitter;

use battle_core::{IsoCoords, IsoProjection, Position3D, UnitId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::config::CameraConfig;
use crate::easing::Easing;

pub use jitter::Jitter;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl CameraBounds {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            min_x: config.min_x,
            max_x: config.max_x,
            min_y: config.min_y,
            max_y: config.max_y,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }

    pub fn clamp_position(&self, position: IsoCoords) -> IsoCoords {
        IsoCoords::new(
            position.x.max(self.min_x).min(self.max_x),
            position.y.max(self.min_y).min(self.max_y),
        )
    }

    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.max(self.min_zoom).min(self.max_zoom).max(f32::EPSILON)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    pub position: IsoCoords,
    pub zoom: f32,
    pub rotation: f32,
    pub bounds: CameraBounds,
    /// Grid cell the camera was last centered on.
    pub target: Option<Position3D>,
    pub following: Option<UnitId>,
}

/// Timed camera move. Without one, changes apply immediately.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraTransition {
    pub duration: u64,
    pub easing: Easing,
}

impl CameraTransition {
    pub const fn new(duration: u64, easing: Easing) -> Self {
        Self { duration, easing }
    }
}

/// Fields to change in the single clamping update. `None` keeps the value.
#[derive(Clone, Debug, Default, PartialEq)]
struct StateUpdate {
    position: Option<IsoCoords>,
    zoom: Option<f32>,
    rotation: Option<f32>,
    bounds: Option<CameraBounds>,
    target: Option<Option<Position3D>>,
    following: Option<Option<UnitId>>,
}

struct Follow {
    unit_id: UnitId,
    offset: IsoCoords,
    goal: Option<IsoCoords>,
}

struct Shake {
    origin: IsoCoords,
    intensity: f32,
    steps: u32,
    step: u32,
    next_at: u64,
}

struct Transition {
    spec: CameraTransition,
    started_at: u64,
    from_position: IsoCoords,
    from_zoom: f32,
    from_rotation: f32,
    to_position: Option<IsoCoords>,
    to_zoom: Option<f32>,
    to_rotation: Option<f32>,
}

pub struct Camera {
    config: CameraConfig,
    projection: IsoProjection,
    state: CameraState,
    follow: Option<Follow>,
    shake: Option<Shake>,
    transition: Option<Transition>,
    drag_anchor: Option<IsoCoords>,
    jitter: Jitter,
    clock: u64,
    changes: broadcast::Sender<CameraState>,
}

impl Camera {
    const SHAKE_SEED: u64 = 0x5eed_cafe;

    pub fn new(config: CameraConfig, projection: IsoProjection) -> Self {
        Self {
            state: CameraState {
                position: IsoCoords::ZERO,
                zoom: 1.0,
                rotation: 0.0,
                bounds: CameraBounds::from_config(&config),
                target: None,
                following: None,
            },
            changes: broadcast::channel(config.channel_capacity.max(1)).0,
            config,
            projection,
            follow: None,
            shake: None,
            transition: None,
            drag_anchor: None,
            jitter: Jitter::new(Self::SHAKE_SEED),
            clock: 0,
        }
    }

    /// Reseeds the shake noise.
    pub fn with_shake_seed(mut self, seed: u64) -> Self {
        self.jitter = Jitter::new(seed);
        self
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn projection(&self) -> &IsoProjection {
        &self.projection
    }

    pub fn position(&self) -> IsoCoords {
        self.state.position
    }

    pub fn zoom(&self) -> f32 {
        self.state.zoom
    }

    pub fn rotation(&self) -> f32 {
        self.state.rotation
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CameraState> {
        self.changes.subscribe()
    }

    pub fn screen_center(&self) -> IsoCoords {
        IsoCoords::new(self.config.screen_width / 2.0, self.config.screen_height / 2.0)
    }

    pub fn world_to_screen(&self, world: IsoCoords) -> IsoCoords {
        world.scale(self.state.zoom).rotate(self.state.rotation) + self.state.position
    }

    pub fn screen_to_world(&self, screen: IsoCoords) -> IsoCoords {
        (screen - self.state.position)
            .rotate(-self.state.rotation)
            .scale(1.0 / self.state.zoom)
    }

    pub fn grid_to_screen(&self, pos: Position3D) -> IsoCoords {
        self.world_to_screen(self.projection.to_screen(pos))
    }

    /// Grid cell under a screen point, assuming elevation `z`.
    pub fn screen_to_grid(&self, screen: IsoCoords, z: i32) -> Position3D {
        self.projection.to_grid(self.screen_to_world(screen), z)
    }

    pub fn is_visible(&self, world: IsoCoords, margin: f32) -> bool {
        let screen = self.world_to_screen(world);
        screen.x >= -margin
            && screen.x <= self.config.screen_width + margin
            && screen.y >= -margin
            && screen.y <= self.config.screen_height + margin
    }

    pub fn pan_to(&mut self, position: IsoCoords, transition: Option<CameraTransition>) {
        self.animate_or_apply(
            StateUpdate {
                position: Some(position),
                ..StateUpdate::default()
            },
            transition,
        );
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        let position = self.state.position + IsoCoords::new(dx, dy);
        self.pan_to(position, None);
    }

    /// Centers the grid cell on screen.
    pub fn pan_to_grid(&mut self, pos: Position3D, transition: Option<CameraTransition>) {
        let position = self.centering_position(self.projection.to_screen(pos), self.state.zoom);
        self.pan_to(position, transition);
    }

    pub fn center_on_unit(&mut self, pos: Position3D, transition: Option<CameraTransition>) {
        let position = self.centering_position(self.projection.to_screen(pos), self.state.zoom);
        self.animate_or_apply(
            StateUpdate {
                position: Some(position),
                target: Some(Some(pos)),
                ..StateUpdate::default()
            },
            transition,
        );
    }

    pub fn zoom_to(&mut self, zoom: f32, transition: Option<CameraTransition>) {
        self.animate_or_apply(
            StateUpdate {
                zoom: Some(zoom),
                ..StateUpdate::default()
            },
            transition,
        );
    }

    /// Relative zoom. With an anchor, the world point under the anchor stays put.
    pub fn zoom_by(&mut self, delta: f32, anchor: Option<IsoCoords>) {
        let zoom = self.state.bounds.clamp_zoom(self.state.zoom + delta);
        let position = anchor.map(|anchor| {
            let scale = zoom / self.state.zoom;
            anchor - (anchor - self.state.position).scale(scale)
        });
        self.transition = None;
        self.update(StateUpdate {
            zoom: Some(zoom),
            position,
            ..StateUpdate::default()
        });
    }

    pub fn rotate_to(&mut self, rotation: f32, transition: Option<CameraTransition>) {
        self.animate_or_apply(
            StateUpdate {
                rotation: Some(rotation),
                ..StateUpdate::default()
            },
            transition,
        );
    }

    /// Zooms and centers so every position fits inside the screen minus `margin`.
    pub fn frame_area(
        &mut self,
        positions: &[Position3D],
        margin: f32,
        transition: Option<CameraTransition>,
    ) {
        if positions.is_empty() {
            return;
        }
        let area = self.projection.bounds(positions);
        let bounds = self.state.bounds;
        let required = ((self.config.screen_width - margin * 2.0) / area.width())
            .min((self.config.screen_height - margin * 2.0) / area.height())
            .min(bounds.max_zoom);
        let zoom = bounds.clamp_zoom(required);
        let position = self.centering_position(area.center(), zoom);

        debug!(cells = positions.len(), zoom, "framing area");
        self.animate_or_apply(
            StateUpdate {
                position: Some(position),
                zoom: Some(zoom),
                ..StateUpdate::default()
            },
            transition,
        );
    }

    /// Starts following a unit. The camera eases toward it on every tick.
    pub fn follow_unit(&mut self, unit_id: impl Into<UnitId>, offset: IsoCoords) {
        let unit_id = unit_id.into();
        self.follow = Some(Follow {
            unit_id: unit_id.clone(),
            offset,
            goal: None,
        });
        self.update(StateUpdate {
            following: Some(Some(unit_id)),
            ..StateUpdate::default()
        });
    }

    pub fn stop_following(&mut self) {
        if self.follow.take().is_some() {
            self.update(StateUpdate {
                following: Some(None),
                ..StateUpdate::default()
            });
        }
    }

    /// Reports the followed unit's new cell; ignored for any other unit.
    pub fn update_follow_target(&mut self, unit_id: &UnitId, pos: Position3D) {
        let world = self.projection.to_screen(pos);
        let zoom = self.state.zoom;
        let goal = self.centering_position(world, zoom);
        if let Some(follow) = self.follow.as_mut().filter(|f| &f.unit_id == unit_id) {
            follow.goal = Some(goal + follow.offset);
        }
    }

    pub fn following(&self) -> Option<&UnitId> {
        self.follow.as_ref().map(|follow| &follow.unit_id)
    }

    /// Shakes around the current position for `duration` ms, decaying
    /// linearly, then returns exactly to where it started.
    pub fn shake(&mut self, intensity: f32, duration: u64) {
        let steps = (duration / self.config.shake_step_ms.max(1)) as u32;
        let origin = self
            .shake
            .as_ref()
            .map(|shake| shake.origin)
            .unwrap_or(self.state.position);
        if steps == 0 {
            return;
        }
        self.shake = Some(Shake {
            origin,
            intensity,
            steps,
            step: 0,
            next_at: self.clock,
        });
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn set_bounds(&mut self, bounds: CameraBounds) {
        self.update(StateUpdate {
            bounds: Some(bounds),
            ..StateUpdate::default()
        });
    }

    /// Pointer pressed for panning. Panning by hand stops following.
    pub fn begin_drag(&mut self, screen: IsoCoords) {
        self.drag_anchor = Some(screen);
        self.stop_following();
    }

    pub fn drag_to(&mut self, screen: IsoCoords) {
        let Some(anchor) = self.drag_anchor else {
            return;
        };
        let delta = screen - anchor;
        self.drag_anchor = Some(screen);
        self.pan_by(delta.x, delta.y);
    }

    pub fn end_drag(&mut self) {
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Mouse wheel zoom anchored at the cursor. Negative `delta_y` zooms in.
    pub fn wheel(&mut self, delta_y: f32, cursor: IsoCoords) {
        let delta = -delta_y * self.config.wheel_zoom_speed * 0.001;
        self.zoom_by(delta, Some(cursor));
    }

    /// Advances transitions, follow smoothing and shake to `now`.
    pub fn tick(&mut self, now: u64) {
        self.clock = self.clock.max(now);
        self.tick_transition(now);
        self.tick_follow();
        self.tick_shake(now);
    }

    fn tick_transition(&mut self, now: u64) {
        let Some(transition) = &self.transition else {
            return;
        };
        let elapsed = now.saturating_sub(transition.started_at);
        let t = if transition.spec.duration == 0 {
            1.0
        } else {
            (elapsed as f32 / transition.spec.duration as f32).min(1.0)
        };
        let eased = transition.spec.easing.apply(t);

        let update = StateUpdate {
            position: transition
                .to_position
                .map(|to| transition.from_position.lerp(to, eased)),
            zoom: transition
                .to_zoom
                .map(|to| transition.from_zoom + (to - transition.from_zoom) * eased),
            rotation: transition
                .to_rotation
                .map(|to| transition.from_rotation + (to - transition.from_rotation) * eased),
            ..StateUpdate::default()
        };
        if t >= 1.0 {
            self.transition = None;
            trace!("camera transition finished");
        }
        self.update(update);
    }

    fn tick_follow(&mut self) {
        let Some(goal) = self.follow.as_ref().and_then(|follow| follow.goal) else {
            return;
        };
        let smoothing = self.config.follow_smoothing;
        match self.shake.as_mut() {
            Some(shake) => {
                shake.origin = shake.origin.lerp(goal, smoothing);
            }
            None => {
                let position = self.state.position.lerp(goal, smoothing);
                self.update(StateUpdate {
                    position: Some(position),
                    ..StateUpdate::default()
                });
            }
        }
    }

    fn tick_shake(&mut self, now: u64) {
        let step_ms = self.config.shake_step_ms.max(1);
        let mut position = None;
        let mut finished = false;

        if let Some(shake) = self.shake.as_mut() {
            while now >= shake.next_at && shake.step < shake.steps {
                let decay = 1.0 - shake.step as f32 / shake.steps as f32;
                let dx = self.jitter.next_centered() * shake.intensity * decay;
                let dy = self.jitter.next_centered() * shake.intensity * decay;
                position = Some(shake.origin + IsoCoords::new(dx, dy));
                shake.step += 1;
                shake.next_at += step_ms;
            }
            if shake.step >= shake.steps && now >= shake.next_at {
                position = Some(shake.origin);
                finished = true;
            }
        }

        if finished {
            self.shake = None;
            trace!("camera shake finished");
        }
        if position.is_some() {
            self.update(StateUpdate {
                position,
                ..StateUpdate::default()
            });
        }
    }

    /// Camera position that puts `world` at the screen center for `zoom`.
    fn centering_position(&self, world: IsoCoords, zoom: f32) -> IsoCoords {
        self.screen_center() - world.scale(zoom).rotate(self.state.rotation)
    }

    fn animate_or_apply(&mut self, update: StateUpdate, transition: Option<CameraTransition>) {
        let Some(spec) = transition.filter(|spec| spec.duration > 0) else {
            self.transition = None;
            self.update(update);
            return;
        };

        if update.target.is_some() || update.bounds.is_some() || update.following.is_some() {
            self.update(StateUpdate {
                target: update.target.clone(),
                bounds: update.bounds,
                following: update.following.clone(),
                ..StateUpdate::default()
            });
        }
        self.transition = Some(Transition {
            spec,
            started_at: self.clock,
            from_position: self.state.position,
            from_zoom: self.state.zoom,
            from_rotation: self.state.rotation,
            to_position: update.position,
            to_zoom: update.zoom,
            to_rotation: update.rotation,
        });
    }

    /// The one place camera state changes. Clamps, then publishes if anything moved.
    fn update(&mut self, update: StateUpdate) {
        let mut next = self.state.clone();
        if let Some(bounds) = update.bounds {
            next.bounds = bounds;
        }
        if let Some(position) = update.position {
            next.position = position;
        }
        if let Some(zoom) = update.zoom {
            next.zoom = zoom;
        }
        if let Some(rotation) = update.rotation {
            next.rotation = rotation;
        }
        if let Some(target) = update.target {
            next.target = target;
        }
        if let Some(following) = update.following {
            next.following = following;
        }
        next.position = next.bounds.clamp_position(next.position);
        next.zoom = next.bounds.clamp_zoom(next.zoom);

        if next == self.state {
            return;
        }
        self.state = next;
        if self.changes.send(self.state.clone()).is_err() {
            trace!("no camera subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn camera() -> Camera {
        Camera::new(CameraConfig::default(), IsoProjection::new())
    }

    fn close(a: IsoCoords, b: IsoCoords) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn test_position_and_zoom_are_clamped() {
        let mut camera = camera();
        camera.pan_to(IsoCoords::new(5000.0, -5000.0), None);
        assert_eq!(camera.position(), IsoCoords::new(1000.0, -1000.0));

        camera.zoom_to(10.0, None);
        assert_eq!(camera.zoom(), 3.0);
        camera.zoom_to(0.01, None);
        assert_eq!(camera.zoom(), 0.5);
    }

    #[test]
    fn test_inverted_bounds_do_not_panic() {
        let mut camera = camera();
        let mut bounds = camera.state().bounds;
        bounds.min_x = 10.0;
        bounds.max_x = -10.0;
        camera.set_bounds(bounds);
        camera.pan_to(IsoCoords::new(0.0, 0.0), None);
        assert_eq!(camera.position().x, -10.0);
    }

    #[test]
    fn test_screen_world_round_trip() {
        let mut camera = camera();
        camera.pan_to(IsoCoords::new(120.0, -40.0), None);
        camera.zoom_to(1.7, None);
        camera.rotate_to(0.4, None);

        for world in [
            IsoCoords::new(0.0, 0.0),
            IsoCoords::new(640.0, 100.0),
            IsoCoords::new(-73.5, 912.25),
        ] {
            let back = camera.screen_to_world(camera.world_to_screen(world));
            assert!(close(back, world), "{world:?} came back as {back:?}");
        }
    }

    #[test]
    fn test_zoom_by_anchor_keeps_point_fixed() {
        let mut camera = camera();
        camera.pan_to(IsoCoords::new(50.0, 30.0), None);
        let cursor = IsoCoords::new(400.0, 300.0);
        let world = camera.screen_to_world(cursor);

        camera.zoom_by(0.5, Some(cursor));
        assert_eq!(camera.zoom(), 1.5);
        assert!(close(camera.world_to_screen(world), cursor));
    }

    #[test]
    fn test_frame_area_centers_region() {
        let mut camera = camera();
        let cells = [Position3D::new(0, 0, 0), Position3D::new(10, 10, 0)];
        camera.frame_area(&cells, 100.0, None);

        let area = camera.projection().bounds(&cells);
        assert!((camera.zoom() - 1.625).abs() < EPS);
        assert!(close(camera.world_to_screen(area.center()), camera.screen_center()));
    }

    #[test]
    fn test_frame_single_cell_uses_max_zoom() {
        let mut camera = camera();
        camera.frame_area(&[Position3D::new(2, 2, 0)], 50.0, None);
        assert_eq!(camera.zoom(), 3.0);
    }

    #[test]
    fn test_follow_smooths_instead_of_snapping() {
        let mut camera = camera();
        let unit = UnitId::from("hero");
        camera.follow_unit(unit.clone(), IsoCoords::ZERO);
        camera.update_follow_target(&unit, Position3D::new(3, 1, 0));

        let start = camera.position();
        camera.tick(16);
        let after = camera.position();
        camera.pan_to_grid(Position3D::new(3, 1, 0), None);
        let goal = camera.position();

        let expected = start.lerp(goal, 0.1);
        assert!(close(after, expected));
        assert!(!close(after, goal));
    }

    #[test]
    fn test_follow_ignores_other_units() {
        let mut camera = camera();
        camera.follow_unit("hero", IsoCoords::ZERO);
        camera.update_follow_target(&UnitId::from("villain"), Position3D::new(9, 9, 0));
        camera.tick(16);
        assert_eq!(camera.position(), IsoCoords::ZERO);
    }

    #[test]
    fn test_drag_pans_and_stops_following() {
        let mut camera = camera();
        camera.follow_unit("hero", IsoCoords::ZERO);
        camera.begin_drag(IsoCoords::new(100.0, 100.0));
        assert!(camera.following().is_none());
        assert!(camera.state().following.is_none());

        camera.drag_to(IsoCoords::new(130.0, 90.0));
        assert_eq!(camera.position(), IsoCoords::new(30.0, -10.0));
        camera.end_drag();
        camera.drag_to(IsoCoords::new(500.0, 500.0));
        assert_eq!(camera.position(), IsoCoords::new(30.0, -10.0));
    }

    #[test]
    fn test_wheel_zooms_in_on_negative_delta() {
        let mut camera = camera();
        camera.wheel(-1000.0, IsoCoords::new(640.0, 360.0));
        assert!((camera.zoom() - 1.1).abs() < EPS);
    }

    #[test]
    fn test_shake_decays_and_restores() {
        let mut camera = camera();
        camera.pan_to(IsoCoords::new(10.0, 20.0), None);
        let origin = camera.position();
        camera.shake(10.0, 500);
        assert!(camera.is_shaking());

        for now in (0..500).step_by(50) {
            camera.tick(now);
            let offset = camera.position() - origin;
            assert!(offset.x.abs() <= 5.0 && offset.y.abs() <= 5.0);
        }
        camera.tick(500);
        assert!(!camera.is_shaking());
        assert_eq!(camera.position(), origin);
    }

    #[test]
    fn test_transition_interpolates() {
        let mut camera = camera();
        camera.pan_to(
            IsoCoords::new(100.0, 0.0),
            Some(CameraTransition::new(200, Easing::Linear)),
        );
        assert!(camera.is_transitioning());
        assert_eq!(camera.position(), IsoCoords::ZERO);

        camera.tick(100);
        assert!(close(camera.position(), IsoCoords::new(50.0, 0.0)));
        camera.tick(200);
        assert!(close(camera.position(), IsoCoords::new(100.0, 0.0)));
        assert!(!camera.is_transitioning());
    }

    #[test]
    fn test_is_visible() {
        let camera = camera();
        assert!(camera.is_visible(IsoCoords::new(640.0, 360.0), 0.0));
        assert!(!camera.is_visible(IsoCoords::new(-50.0, 0.0), 0.0));
        assert!(camera.is_visible(IsoCoords::new(-50.0, 0.0), 60.0));
    }

    #[test]
    fn test_screen_to_grid_picks_cell() {
        let camera = camera();
        let cell = Position3D::new(4, 7, 0);
        let screen = camera.grid_to_screen(cell);
        assert_eq!(camera.screen_to_grid(screen, 0), cell);
    }

    #[test]
    fn test_changes_are_published() {
        let mut camera = camera();
        let mut rx = camera.subscribe();
        camera.pan_by(5.0, 0.0);
        camera.pan_by(0.0, 0.0);
        assert_eq!(rx.try_recv().unwrap().position, IsoCoords::new(5.0, 0.0));
        assert!(rx.try_recv().is_err());
    }
}
