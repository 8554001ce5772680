//! Writes scheduler frames onto sprites.
use std::f32::consts::PI;

use scene::{AnimationFrame, AnimationKind, RenderHost, VisualUpdate};

use super::CombatView;

/// Fraction of the distance to the target covered by an attack lunge.
const LUNGE_REACH: f32 = 0.35;
const ATTACK_SCALE: f32 = 0.2;
/// Screen pixels a floating number rises over its lifetime.
const NUMBER_RISE: f32 = 40.0;
const HIT_TINT: u32 = 0xFF_44_44;
const NEUTRAL_TINT: u32 = 0xFF_FF_FF;

impl<H: RenderHost> CombatView<H> {
    pub(super) fn apply_frame(&mut self, frame: &AnimationFrame) {
        match frame.kind {
            AnimationKind::UnitMove => self.apply_move(frame),
            AnimationKind::UnitAttack => self.apply_lunge(frame),
            AnimationKind::UnitDamage => {
                let tint = if frame.finished { NEUTRAL_TINT } else { HIT_TINT };
                self.apply_visuals(frame, VisualUpdate::default().tint(tint));
            }
            AnimationKind::UnitDeath => {
                let alpha = (1.0 - frame.eased).clamp(0.0, 1.0);
                self.apply_visuals(frame, VisualUpdate::default().alpha(alpha));
            }
            AnimationKind::DamageNumber | AnimationKind::HealingNumber => self.apply_number(frame),
            _ => {}
        }
    }

    fn apply_move(&mut self, frame: &AnimationFrame) {
        let (Some(id), Some(from), Some(to)) = (&frame.unit_id, frame.source, frame.target) else {
            return;
        };
        let Some(lease) = self.units.get(id).and_then(|unit| unit.lease.as_ref()) else {
            return;
        };
        let world = self
            .projection
            .lerp(self.projection.to_screen(from), self.projection.to_screen(to), frame.eased);
        // Depth switches halfway so the sprite sorts with the cell it is entering.
        let cell = if frame.eased < 0.5 { from } else { to };
        self.sprites
            .update_position(lease, world.x, world.y, Some(self.projection.z_index(cell)));
    }

    fn apply_lunge(&mut self, frame: &AnimationFrame) {
        let Some(unit) = frame.unit_id.as_ref().and_then(|id| self.units.get(id)) else {
            return;
        };
        let Some(lease) = unit.lease.as_ref() else {
            return;
        };
        let base = self.projection.to_screen(unit.position);
        let swing = (frame.progress * PI).sin();
        let world = match frame.target {
            Some(target) => base.lerp(self.projection.to_screen(target), swing * LUNGE_REACH),
            None => base,
        };
        self.sprites.update_position(lease, world.x, world.y, None);
        self.sprites.update_visuals(
            lease,
            VisualUpdate::default().uniform_scale(1.0 + ATTACK_SCALE * swing),
        );
    }

    fn apply_number(&mut self, frame: &AnimationFrame) {
        let Some(lease) = self.effects.get(&frame.id) else {
            return;
        };
        let Some(cell) = frame
            .unit_id
            .as_ref()
            .and_then(|id| self.units.get(id))
            .map(|unit| unit.position)
            .or(frame.target)
        else {
            return;
        };
        let base = self.projection.to_screen(cell);
        let alpha = if frame.progress < 0.5 {
            1.0
        } else {
            2.0 * (1.0 - frame.progress)
        };
        self.sprites
            .update_position(lease, base.x, base.y - NUMBER_RISE * frame.eased, None);
        self.sprites
            .update_visuals(lease, VisualUpdate::default().alpha(alpha));
    }

    fn apply_visuals(&mut self, frame: &AnimationFrame, update: VisualUpdate) {
        if let Some(lease) = frame
            .unit_id
            .as_ref()
            .and_then(|id| self.units.get(id))
            .and_then(|unit| unit.lease.as_ref())
        {
            self.sprites.update_visuals(lease, update);
        }
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{BattleConfig, BattleEngine, Position3D, Unit, UnitId};
    use scene::{AnimationId, HeadlessHost, animation::unit_walk};

    use super::*;
    use crate::config::ViewConfig;

    fn view() -> CombatView<HeadlessHost> {
        let units = vec![Unit::new("knight", "player", Position3D::new(0, 0, 0))];
        let engine = BattleEngine::new("f1", BattleConfig::new(4, 4), units, 0);
        let mut view = CombatView::new(ViewConfig::new(), HeadlessHost::new());
        view.initialize(engine.state(), std::iter::empty(), 0).unwrap();
        view
    }

    fn frame(kind: AnimationKind, progress: f32) -> AnimationFrame {
        let spec = unit_walk("knight", Position3D::new(0, 0, 0), Position3D::new(1, 0, 0));
        AnimationFrame {
            id: AnimationId(1),
            kind,
            unit_id: spec.unit_id,
            source: spec.source,
            target: spec.target,
            progress,
            eased: progress,
            finished: progress >= 1.0,
        }
    }

    #[test]
    fn test_move_frame_interpolates_between_cells() {
        let mut view = view();
        view.apply_frame(&frame(AnimationKind::UnitMove, 0.5));

        let from = view.projection().to_screen(Position3D::new(0, 0, 0));
        let to = view.projection().to_screen(Position3D::new(1, 0, 0));
        let sprite = view.unit_sprite(&UnitId::from("knight")).unwrap();
        assert!((sprite.x - (from.x + to.x) / 2.0).abs() < 1e-3);
        assert!((sprite.y - (from.y + to.y) / 2.0).abs() < 1e-3);
        assert_eq!(sprite.z_index, view.projection().z_index(Position3D::new(1, 0, 0)));
    }

    #[test]
    fn test_death_frame_fades_unit() {
        let mut view = view();
        view.apply_frame(&frame(AnimationKind::UnitDeath, 0.75));
        let sprite = view.unit_sprite(&UnitId::from("knight")).unwrap();
        assert_eq!(sprite.alpha, 0.25);
    }

    #[test]
    fn test_attack_returns_to_rest() {
        let mut view = view();
        view.apply_frame(&frame(AnimationKind::UnitAttack, 0.5));
        let rest = view.projection().to_screen(Position3D::new(0, 0, 0));
        let lunged = view.unit_sprite(&UnitId::from("knight")).unwrap().clone();
        assert!(lunged.x != rest.x || lunged.y != rest.y);

        view.apply_frame(&frame(AnimationKind::UnitAttack, 1.0));
        let sprite = view.unit_sprite(&UnitId::from("knight")).unwrap();
        assert!((sprite.x - rest.x).abs() < 1e-3);
        assert!((sprite.y - rest.y).abs() < 1e-3);
    }
}
