//! Combat event to animation mapping.
use battle_core::{ActionType, AnimationCue, CombatEvent, CombatEventKind, DamageType, IsoCoords, Position3D, UnitId};
use scene::animation::{
    healing, magic_cast, magical_damage, melee_attack, param, physical_damage, unit_run, unit_walk,
};
use scene::{AnimationKind, AnimationSpec, ChainSpec, Easing, RenderHost};
use tracing::{debug, info, trace, warn};

use super::{CombatView, EFFECT_POOL, framing_transition};
use crate::api::ViewError;
use crate::events::Event;

/// Paths longer than this are played at running speed.
const RUN_THRESHOLD: usize = 3;
const CRITICAL_SHAKE: f32 = 2.0;
const SHAKE_DURATION: u64 = 300;

impl<H: RenderHost> CombatView<H> {
    /// Presents one combat event immediately.
    ///
    /// Events at or below the last handled sequence are skipped, so a replayed
    /// batch does not animate twice.
    pub fn handle_event(&mut self, event: &CombatEvent, now: u64) -> Result<(), ViewError> {
        if !self.initialized {
            return Err(ViewError::NotInitialized);
        }
        if let Some(last) = self.last_sequence
            && event.sequence() <= last
        {
            trace!(sequence = event.sequence(), last, "event already presented");
            return Ok(());
        }
        self.last_sequence = Some(event.sequence());
        self.events_handled += 1;
        self.bus.publish(Event::Combat(event.clone()));
        trace!(event = event.event_type(), sequence = event.sequence(), "presenting combat event");

        match &event.kind {
            CombatEventKind::CombatStarted {
                initial_positions, ..
            } => {
                for (id, cell) in initial_positions {
                    if let Some(unit) = self.units.get_mut(id) {
                        unit.position = *cell;
                        if let Some(lease) = &unit.lease {
                            super::place(&mut self.sprites, &self.projection, lease, *cell);
                        }
                    }
                }
                self.frame_battlefield(Some(framing_transition(800)));
            }
            CombatEventKind::TurnStarted { unit_id, .. } => {
                let cell = self.unit_position(unit_id)?;
                self.camera.follow_unit(unit_id.clone(), IsoCoords::ZERO);
                self.camera.update_follow_target(unit_id, cell);
            }
            CombatEventKind::UnitMoved {
                unit_id,
                from,
                to,
                path,
                ..
            } => self.present_move(unit_id, *from, *to, path, now)?,
            CombatEventKind::ActionResolved {
                source_id,
                target_ids,
                action_type,
                ..
            } => match action_type {
                ActionType::Attack => {
                    let target = match target_ids.first() {
                        Some(target) => self.unit_position(target)?,
                        None => self.unit_position(source_id)?,
                    };
                    self.scheduler
                        .enqueue(melee_attack(source_id.clone(), target), now);
                }
                ActionType::Defend => {
                    let spec = AnimationSpec::new(AnimationKind::UnitDefend)
                        .with_unit(source_id.clone())
                        .with_duration(400);
                    self.scheduler.enqueue(spec, now);
                }
                _ => {}
            },
            CombatEventKind::DamageApplied {
                target_id,
                damage,
                damage_type,
                hp_after,
                was_critical,
                ..
            } => {
                self.set_hp(target_id, *hp_after)?;
                let flash = AnimationSpec::new(AnimationKind::UnitDamage)
                    .with_unit(target_id.clone())
                    .with_duration(300);
                self.scheduler.enqueue(flash, now);

                let number = match damage_type {
                    DamageType::Physical | DamageType::True => {
                        physical_damage(target_id.clone(), *damage)
                    }
                    _ => magical_damage(target_id.clone(), *damage),
                };
                if let Some(intensity) = number.param(param::SHAKE_INTENSITY) {
                    let intensity = if *was_critical {
                        intensity * CRITICAL_SHAKE
                    } else {
                        intensity
                    };
                    self.camera.shake(intensity, SHAKE_DURATION);
                }
                self.spawn_effect(number, now);
            }
            CombatEventKind::HealingApplied {
                target_id,
                healing: amount,
                hp_after,
                ..
            } => {
                self.set_hp(target_id, *hp_after)?;
                self.spawn_effect(healing(target_id.clone(), *amount), now);
            }
            CombatEventKind::StatusApplied {
                target_id,
                status_type,
                ..
            } => {
                let cell = self.unit_position(target_id)?;
                let aura = AnimationSpec::new(AnimationKind::Aura)
                    .with_unit(target_id.clone())
                    .with_target(cell)
                    .with_duration(600);
                self.scheduler.enqueue(aura, now);
                debug!(unit = %target_id, status = ?status_type, "status applied");
            }
            CombatEventKind::StatusRemoved {
                target_id,
                status_type,
                ..
            } => debug!(unit = %target_id, status = ?status_type, "status removed"),
            CombatEventKind::SkillUsed {
                source_id,
                target_positions,
                ..
            } => {
                let cast = magic_cast(source_id.clone());
                if target_positions.is_empty() {
                    self.scheduler.enqueue(cast, now);
                } else {
                    let impacts = target_positions
                        .iter()
                        .map(|cell| {
                            AnimationSpec::new(AnimationKind::AreaEffect)
                                .with_target(*cell)
                                .with_duration(600)
                                .with_easing(Easing::EaseOut)
                        })
                        .collect();
                    self.scheduler
                        .enqueue_chain(ChainSpec::mixed(vec![vec![cast], impacts]), now);
                }
            }
            CombatEventKind::UnitDefeated { unit_id, .. } => {
                self.unit_position(unit_id)?;
                let death = AnimationSpec::new(AnimationKind::UnitDeath)
                    .with_unit(unit_id.clone())
                    .with_duration(800)
                    .with_easing(Easing::EaseIn);
                let id = self.scheduler.enqueue(death, now);
                self.dying.insert(id, unit_id.clone());
                if self.camera.following() == Some(unit_id) {
                    self.camera.stop_following();
                }
            }
            CombatEventKind::CombatEnded {
                winner_id, reason, ..
            } => {
                self.camera.stop_following();
                let survivors: Vec<Position3D> = self
                    .units
                    .iter()
                    .filter(|(id, _)| !self.dying.values().any(|dying| dying == *id))
                    .map(|(_, unit)| unit.position)
                    .collect();
                self.camera.frame_area(
                    &survivors,
                    self.config.frame_margin,
                    Some(framing_transition(1000)),
                );
                let fade = AnimationSpec::new(AnimationKind::ScreenFade)
                    .with_delay(1000)
                    .with_duration(1000);
                self.scheduler.enqueue(fade, now);
                info!(winner = ?winner_id, reason = ?reason, "combat ended");
            }
            CombatEventKind::TerrainChanged {
                position, new_type, ..
            } => {
                let spec = AnimationSpec::new(AnimationKind::TerrainChange)
                    .with_target(*position)
                    .with_duration(500);
                self.scheduler.enqueue(spec, now);
                debug!(cell = %position, terrain = ?new_type, "terrain changed");
            }
            CombatEventKind::AnimationRequest {
                animation_type,
                source_id,
                target_id,
                position,
                duration,
                parameters,
            } => {
                let mut spec =
                    AnimationSpec::new(cue_kind(*animation_type)).with_duration(*duration);
                if let Some(source) = source_id {
                    spec = spec.with_unit(source.clone());
                }
                let target = match (position, target_id) {
                    (Some(cell), _) => Some(*cell),
                    (None, Some(target)) => Some(self.unit_position(target)?),
                    (None, None) => None,
                };
                if let Some(target) = target {
                    spec = spec.with_target(target);
                }
                for (key, value) in parameters {
                    spec = spec.with_param(key.clone(), *value);
                }
                self.scheduler.enqueue(spec, now);
            }
        }
        Ok(())
    }

    fn present_move(
        &mut self,
        unit_id: &UnitId,
        from: Position3D,
        to: Position3D,
        path: &[Position3D],
        now: u64,
    ) -> Result<(), ViewError> {
        let unit = self
            .units
            .get_mut(unit_id)
            .ok_or_else(|| ViewError::UnknownUnit(unit_id.clone()))?;
        unit.position = to;

        let mut waypoints: Vec<Position3D> = path
            .iter()
            .copied()
            .skip_while(|cell| *cell == from)
            .collect();
        if waypoints.last() != Some(&to) {
            waypoints.push(to);
        }

        let running = waypoints.len() > RUN_THRESHOLD;
        let mut previous = from;
        let steps = waypoints
            .into_iter()
            .map(|cell| {
                let step = if running {
                    unit_run(unit_id.clone(), previous, cell)
                } else {
                    unit_walk(unit_id.clone(), previous, cell)
                };
                previous = cell;
                step
            })
            .collect();
        self.scheduler.enqueue_chain(ChainSpec::sequence(steps), now);
        self.camera.update_follow_target(unit_id, to);
        Ok(())
    }

    fn set_hp(&mut self, unit_id: &UnitId, hp: i32) -> Result<(), ViewError> {
        let unit = self
            .units
            .get_mut(unit_id)
            .ok_or_else(|| ViewError::UnknownUnit(unit_id.clone()))?;
        unit.hp = hp.clamp(0, unit.hp_max.max(0));
        Ok(())
    }

    /// Enqueues an effect animation, borrowing an effect sprite when one is free.
    fn spawn_effect(&mut self, spec: AnimationSpec, now: u64) {
        let anchor = spec
            .unit_id
            .as_ref()
            .and_then(|id| self.units.get(id))
            .map(|unit| unit.position)
            .or(spec.target);
        let lease = if self.sprites.has_pool(EFFECT_POOL) {
            self.sprites.get_sprite(EFFECT_POOL, Some(spec.kind.to_string()), now)
        } else {
            None
        };
        let id = self.scheduler.enqueue(spec, now);

        match (lease, anchor) {
            (Some(lease), Some(cell)) => {
                super::place(&mut self.sprites, &self.projection, &lease, cell);
                self.effects.insert(id, lease);
            }
            (Some(lease), None) => {
                self.sprites.release_sprite(lease);
            }
            (None, _) if self.sprites.has_pool(EFFECT_POOL) => {
                warn!(animation = %id, "effect pool exhausted, playing without sprite");
            }
            (None, _) => {}
        }
    }
}

fn cue_kind(cue: AnimationCue) -> AnimationKind {
    match cue {
        AnimationCue::Attack => AnimationKind::UnitAttack,
        AnimationCue::Skill => AnimationKind::UnitCast,
        AnimationCue::Movement => AnimationKind::UnitMove,
        AnimationCue::Damage => AnimationKind::UnitDamage,
        AnimationCue::Heal => AnimationKind::UnitHeal,
        AnimationCue::Death => AnimationKind::UnitDeath,
        AnimationCue::Effect => AnimationKind::AreaEffect,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use battle_core::{BattleConfig, BattleEngine, EventHeader, Unit};
    use scene::{AnimationStatus, HeadlessHost};

    use crate::config::ViewConfig;

    fn view() -> CombatView<HeadlessHost> {
        let units = vec![
            Unit::new("knight", "player", Position3D::new(1, 1, 0)),
            Unit::new("slime", "enemy", Position3D::new(3, 1, 0)),
        ];
        let engine = BattleEngine::new("d1", BattleConfig::new(6, 6), units, 0);
        let mut view = CombatView::new(ViewConfig::new(), HeadlessHost::new());
        view.initialize(engine.state(), [("effect", "fx/spark.png")], 0)
            .unwrap();
        view
    }

    fn event(sequence: u64, kind: CombatEventKind) -> CombatEvent {
        CombatEvent::new(
            EventHeader {
                combat_id: "d1".into(),
                timestamp: sequence * 10,
                turn_number: 1,
                sequence,
            },
            kind,
        )
    }

    fn moved(sequence: u64) -> CombatEvent {
        event(
            sequence,
            CombatEventKind::UnitMoved {
                unit_id: UnitId::from("knight"),
                from: Position3D::new(1, 1, 0),
                to: Position3D::new(2, 2, 0),
                path: vec![Position3D::new(2, 1, 0), Position3D::new(2, 2, 0)],
                movement_cost: 2,
            },
        )
    }

    #[test]
    fn test_move_plays_one_walk_per_step() {
        let mut view = view();
        view.handle_event(&moved(1), 0).unwrap();

        assert_eq!(view.scheduler().active_chains(), 1);
        assert_eq!(view.scheduler().status().queued + view.scheduler().status().playing, 1);
        assert_eq!(
            view.unit(&UnitId::from("knight")).unwrap().position,
            Position3D::new(2, 2, 0)
        );
    }

    #[test]
    fn test_repeated_sequence_is_not_replayed() {
        let mut view = view();
        view.handle_event(&moved(4), 0).unwrap();
        view.handle_event(&moved(4), 0).unwrap();
        assert_eq!(view.stats().events_handled, 1);
        assert_eq!(view.scheduler().active_chains(), 1);
    }

    #[test]
    fn test_damage_updates_hp_and_borrows_effect_sprite() {
        let mut view = view();
        let damage = event(
            1,
            CombatEventKind::DamageApplied {
                target_id: UnitId::from("slime"),
                source_id: UnitId::from("knight"),
                damage: 7,
                damage_type: DamageType::Physical,
                hp_before: 10,
                hp_after: 3,
                was_critical: true,
                was_blocked: false,
                element: None,
            },
        );
        view.handle_event(&damage, 0).unwrap();

        assert_eq!(view.unit(&UnitId::from("slime")).unwrap().hp, 3);
        assert_eq!(view.effects.len(), 1);
        assert!(view.camera().is_shaking());
    }

    #[test]
    fn test_unknown_unit_is_reported() {
        let mut view = view();
        let turn = event(
            1,
            CombatEventKind::TurnStarted {
                unit_id: UnitId::from("ghost"),
                available_actions: Vec::new(),
                time_limit: None,
            },
        );
        assert_eq!(
            view.handle_event(&turn, 0),
            Err(ViewError::UnknownUnit(UnitId::from("ghost")))
        );
    }

    #[test]
    fn test_animation_request_maps_cue() {
        let mut view = view();
        let request = event(
            1,
            CombatEventKind::AnimationRequest {
                animation_type: AnimationCue::Heal,
                source_id: Some(UnitId::from("knight")),
                target_id: Some(UnitId::from("slime")),
                position: None,
                duration: 250,
                parameters: [("scale".to_owned(), 1.5)].into(),
            },
        );
        view.handle_event(&request, 0).unwrap();
        let frames = view.scheduler_mut().tick(0);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].kind, AnimationKind::UnitHeal);
        assert_eq!(frames[0].target, Some(Position3D::new(3, 1, 0)));
        assert_eq!(
            view.scheduler().animation_status(frames[0].id),
            Some(AnimationStatus::Playing)
        );
    }

    #[test]
    fn test_cue_kinds_are_distinct() {
        let cues = [
            AnimationCue::Attack,
            AnimationCue::Skill,
            AnimationCue::Movement,
            AnimationCue::Damage,
            AnimationCue::Heal,
            AnimationCue::Death,
            AnimationCue::Effect,
        ];
        let kinds: HashSet<AnimationKind> = cues.into_iter().map(cue_kind).collect();
        assert_eq!(kinds.len(), cues.len());
    }
}
