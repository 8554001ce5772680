//! Action validation and resolution.
//!
//! Damage and healing rules are fixed placeholders:
//! physical `max(1, atk - def)`, skill `max(1, power + int/2 - def/2)`,
//! healing `power + faith/10`. Defending halves incoming damage.
use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::action::{ActionError, ActionType, SubmittedAction};
use crate::coords::{Direction, Position3D, cells_within};
use crate::events::{
    ActionEffect, CombatEvent, CombatEventKind, DamageType, EffectKind, StatusRemovalReason,
};
use crate::state::{
    BattlePhase, EffectTarget, Element, Skill, SkillEffect, SkillEffectKind, Status, StatusKind,
    Unit, UnitId,
};

use super::BattleEngine;

/// Experience credited to whoever lands a killing blow.
const DEFEAT_EXPERIENCE: u32 = 25;
/// Healing of a consumable effect that names no value.
const DEFAULT_ITEM_HEAL: i32 = 30;
/// Default duration of a status effect that names none.
const DEFAULT_STATUS_DURATION: u32 = 3;

pub(super) fn physical_damage(attacker: &Unit, defender: &Unit) -> i32 {
    let atk = attacker.effective_stats().attack;
    let def = defender.effective_stats().defense;
    (atk - def).max(1)
}

pub(super) fn skill_damage(skill: &Skill, caster: &Unit, defender: &Unit) -> i32 {
    let int = caster.effective_stats().intelligence;
    let def = defender.effective_stats().defense;
    (skill.power + int / 2 - def / 2).max(1)
}

pub(super) fn skill_healing(skill: &Skill, caster: &Unit) -> i32 {
    skill.power + caster.effective_stats().faith / 10
}

/// L-shaped path, x first, excluding the start and including the end.
fn straight_path(from: Position3D, to: Position3D) -> Vec<Position3D> {
    let mut path = Vec::new();
    let mut cursor = from;
    while cursor.x != to.x {
        cursor.x += (to.x - cursor.x).signum();
        path.push(Position3D::new(cursor.x, cursor.y, from.z));
    }
    while cursor.y != to.y {
        cursor.y += (to.y - cursor.y).signum();
        path.push(Position3D::new(cursor.x, cursor.y, from.z));
    }
    if let Some(last) = path.last_mut() {
        last.z = to.z;
    }
    path
}

impl BattleEngine {
    fn target_cell(&self, action: &SubmittedAction) -> Result<Position3D, ActionError> {
        let target = action.target().ok_or(ActionError::MissingTarget)?;
        if !self.state.contains(target) {
            return Err(ActionError::OutOfBounds);
        }
        Ok(target)
    }

    /// Enemy or ally standing on the cell, rejecting empty and corpse-only cells.
    fn occupant(&self, cell: Position3D) -> Result<&Unit, ActionError> {
        if let Some(unit) = self.state.unit_at(cell) {
            return Ok(unit);
        }
        let has_corpse = self
            .state
            .participants
            .iter()
            .any(|unit| unit.position.same_cell(cell));
        Err(if has_corpse {
            ActionError::TargetDefeated
        } else {
            ActionError::InvalidTarget
        })
    }

    /// Living units in a skill's area that the effect applies to.
    fn affected_units(
        &self,
        caster: &Unit,
        center: Position3D,
        aoe: u32,
        target: EffectTarget,
    ) -> Vec<UnitId> {
        let cells = cells_within(center, aoe, true);
        self.state
            .living_units()
            .filter(|unit| cells.iter().any(|cell| cell.same_cell(unit.position)))
            .filter(|unit| target.accepts(unit.id == caster.id, unit.team_id == caster.team_id))
            .map(|unit| unit.id.clone())
            .collect()
    }

    pub(super) fn validate(&self, action: &SubmittedAction) -> Result<(), ActionError> {
        if self.state.phase != BattlePhase::WaitingAction {
            return Err(ActionError::WrongPhase(self.state.phase));
        }
        let unit = self
            .state
            .unit(&action.unit_id)
            .ok_or_else(|| ActionError::UnitNotFound(action.unit_id.clone()))?;
        if self.state.active_unit_id.as_ref() != Some(&unit.id) {
            return Err(ActionError::NotActiveUnit(unit.id.clone()));
        }
        if !unit.is_active() {
            return Err(ActionError::ActorDefeated(unit.id.clone()));
        }
        if !unit.can_act() {
            return Err(ActionError::ActorIncapacitated(unit.id.clone()));
        }
        let stats = unit.effective_stats();

        match action.action_type {
            ActionType::Move => {
                let target = self.target_cell(action)?;
                if !self.config.is_passable(target.x, target.y) {
                    return Err(ActionError::Impassable);
                }
                if self.state.unit_at(target).is_some() {
                    return Err(ActionError::Occupied);
                }
                let distance = target.planar_distance(unit.position);
                if distance == 0 || distance > stats.movement {
                    return Err(ActionError::OutOfRange);
                }
            }
            ActionType::Attack => {
                let target = self.target_cell(action)?;
                let distance = target.planar_distance(unit.position);
                if distance == 0 || distance > stats.range {
                    return Err(ActionError::OutOfRange);
                }
                let defender = self.occupant(target)?;
                if !defender.is_enemy_of(unit) {
                    return Err(ActionError::InvalidTarget);
                }
            }
            ActionType::Skill => {
                let skill_id = action.skill_id.as_deref().unwrap_or_default();
                let skill = unit
                    .skill(skill_id)
                    .ok_or_else(|| ActionError::UnknownSkill(skill_id.to_owned()))?;
                if unit.has_status(StatusKind::Silence) {
                    return Err(ActionError::Silenced);
                }
                if skill.cost > unit.stats.mp {
                    return Err(ActionError::InsufficientMp {
                        required: skill.cost,
                        available: unit.stats.mp,
                    });
                }
                if unit.cooldown(&skill.id) > 0 {
                    return Err(ActionError::OnCooldown(skill.id.clone()));
                }
                let target = self.target_cell(action)?;
                if target.planar_distance(unit.position) > skill.range {
                    return Err(ActionError::OutOfRange);
                }
                self.validate_skill_area(unit, skill, target)?;
            }
            ActionType::Item => {
                let item_id = action.item_id.as_deref().unwrap_or_default();
                if unit.consumable(item_id).is_none() {
                    return Err(ActionError::UnknownItem(item_id.to_owned()));
                }
                let target = self.target_cell(action)?;
                if target.planar_distance(unit.position) > 1 {
                    return Err(ActionError::OutOfRange);
                }
                let recipient = self.occupant(target)?;
                if recipient.is_enemy_of(unit) {
                    return Err(ActionError::InvalidTarget);
                }
            }
            ActionType::Wait | ActionType::Defend => {}
        }
        Ok(())
    }

    fn validate_skill_area(
        &self,
        caster: &Unit,
        skill: &Skill,
        target: Position3D,
    ) -> Result<(), ActionError> {
        let effects = skill.resolved_effects();
        let moves = effects
            .iter()
            .any(|e| matches!(e.kind, SkillEffectKind::Move | SkillEffectKind::Teleport));
        if moves {
            if !self.config.is_passable(target.x, target.y) {
                return Err(ActionError::Impassable);
            }
            if self.state.unit_at(target).is_some_and(|u| u.id != caster.id) {
                return Err(ActionError::Occupied);
            }
        }

        let needs_units = effects.iter().any(|e| {
            matches!(
                e.kind,
                SkillEffectKind::Damage | SkillEffectKind::Heal | SkillEffectKind::Status
            )
        });
        if needs_units && !moves {
            let any = effects.iter().any(|effect| {
                !self
                    .affected_units(caster, target, skill.aoe_size, effect.target)
                    .is_empty()
            });
            if !any {
                return Err(ActionError::InvalidTarget);
            }
        }
        Ok(())
    }

    /// Applies a validated action. Leaves the battle in `Resolving`.
    pub(super) fn resolve(&mut self, action: SubmittedAction, now: u64, out: &mut Vec<CombatEvent>) {
        self.state.phase = BattlePhase::Resolving;
        self.state.available_actions.clear();
        self.state.selected_action = Some(action.clone());

        let source = action.unit_id.clone();
        let mut targets = Vec::new();
        let mut effects = Vec::new();

        match action.action_type {
            ActionType::Move => {
                if let Some(target) = action.target() {
                    let to = self.ground(target.x, target.y);
                    self.move_unit(&source, to, now, out);
                    effects.push(ActionEffect::new(EffectKind::Move, source.clone(), None));
                }
            }
            ActionType::Attack => {
                let defender = action
                    .target()
                    .and_then(|cell| self.state.unit_at(cell))
                    .map(|unit| unit.id.clone());
                if let Some(defender) = defender {
                    self.face_toward(&source, &defender);
                    let amount = match (self.state.unit(&source), self.state.unit(&defender)) {
                        (Some(a), Some(d)) => physical_damage(a, d),
                        _ => 0,
                    };
                    let dealt = self.apply_damage(
                        &source,
                        &defender,
                        amount,
                        DamageType::Physical,
                        None,
                        now,
                        out,
                    );
                    effects.push(ActionEffect::new(
                        EffectKind::Damage,
                        defender.clone(),
                        Some(dealt),
                    ));
                    targets.push(defender);
                }
            }
            ActionType::Skill => {
                if let Some(target) = action.target() {
                    let skill_id = action.skill_id.clone().unwrap_or_default();
                    self.resolve_skill(&source, &skill_id, target, now, out, &mut targets, &mut effects);
                }
            }
            ActionType::Item => {
                if let Some(target) = action.target() {
                    let item_id = action.item_id.clone().unwrap_or_default();
                    self.resolve_item(&source, &item_id, target, now, out, &mut targets, &mut effects);
                }
            }
            ActionType::Defend => {
                self.state.defending.insert(source.clone());
            }
            ActionType::Wait => {}
        }

        let kind = CombatEventKind::ActionResolved {
            source_id: source.clone(),
            target_ids: targets,
            skill_id: action.skill_id.clone(),
            action_type: action.action_type,
            success: true,
            effects,
        };
        self.emit(now, kind, out);
        debug!(
            battle = %self.state.id,
            unit = %source,
            action = %action.action_type,
            "action resolved"
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_skill(
        &mut self,
        source: &UnitId,
        skill_id: &str,
        target: Position3D,
        now: u64,
        out: &mut Vec<CombatEvent>,
        targets: &mut Vec<UnitId>,
        effects: &mut Vec<ActionEffect>,
    ) {
        let Some(caster) = self.state.unit(source) else {
            return;
        };
        let Some(skill) = caster.skill(skill_id).cloned() else {
            return;
        };
        let caster = caster.clone();

        if let Some(unit) = self.state.unit_mut(source) {
            unit.stats.mp = (unit.stats.mp - skill.cost).max(0);
            if skill.cooldown > 0 {
                // +1 so the upkeep at the caster's next turn start leaves the full cooldown.
                unit.cooldowns.insert(skill.id.clone(), skill.cooldown + 1);
            }
        }
        self.state.statistics.record_skill(&skill.id);

        let target_positions = cells_within(target, skill.aoe_size, true)
            .into_iter()
            .filter(|cell| self.state.contains(*cell))
            .map(|cell| self.ground(cell.x, cell.y))
            .collect();
        let kind = CombatEventKind::SkillUsed {
            source_id: source.clone(),
            skill_id: skill.id.clone(),
            target_positions,
            mp_cost: skill.cost,
            cast_time: skill.cast_time,
            interrupted: false,
        };
        self.emit(now, kind, out);

        for effect in skill.resolved_effects() {
            match effect.kind {
                SkillEffectKind::Move | SkillEffectKind::Teleport => {
                    let to = self.ground(target.x, target.y);
                    self.move_unit(source, to, now, out);
                    effects.push(ActionEffect::new(EffectKind::Move, source.clone(), None));
                    continue;
                }
                _ => {}
            }

            for id in self.affected_units(&caster, target, skill.aoe_size, effect.target) {
                let Some(defender) = self.state.unit(&id).cloned() else {
                    continue;
                };
                if !defender.is_active() {
                    continue;
                }
                let applied = self.apply_effect(&caster, &defender, &skill, &effect, now, out);
                if let Some(applied) = applied {
                    effects.push(applied);
                }
                if !targets.contains(&id) {
                    targets.push(id);
                }
            }
        }
    }

    fn apply_effect(
        &mut self,
        caster: &Unit,
        defender: &Unit,
        skill: &Skill,
        effect: &SkillEffect,
        now: u64,
        out: &mut Vec<CombatEvent>,
    ) -> Option<ActionEffect> {
        match effect.kind {
            SkillEffectKind::Damage => {
                let amount = effect
                    .value
                    .unwrap_or_else(|| skill_damage(skill, caster, defender));
                let element = (skill.element != Element::None).then_some(skill.element);
                let dealt = self.apply_damage(
                    &caster.id,
                    &defender.id,
                    amount,
                    DamageType::for_element(skill.element),
                    element,
                    now,
                    out,
                );
                Some(ActionEffect::new(
                    EffectKind::Damage,
                    defender.id.clone(),
                    Some(dealt),
                ))
            }
            SkillEffectKind::Heal => {
                let amount = effect.value.unwrap_or_else(|| skill_healing(skill, caster));
                self.apply_healing(&caster.id, &defender.id, amount, now, out);
                Some(ActionEffect::new(
                    EffectKind::Heal,
                    defender.id.clone(),
                    Some(amount),
                ))
            }
            SkillEffectKind::Status => {
                let kind = effect.status_type?;
                let duration = effect.duration.unwrap_or(DEFAULT_STATUS_DURATION);
                let status = Status::new(kind, duration, caster.id.as_str())
                    .with_intensity(effect.value.unwrap_or(1));
                self.apply_status(&caster.id, &defender.id, status, now, out);
                Some(ActionEffect::status(defender.id.clone(), kind, duration))
            }
            SkillEffectKind::Move | SkillEffectKind::Teleport => None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn resolve_item(
        &mut self,
        source: &UnitId,
        item_id: &str,
        target: Position3D,
        now: u64,
        out: &mut Vec<CombatEvent>,
        targets: &mut Vec<UnitId>,
        effects: &mut Vec<ActionEffect>,
    ) {
        let Some(recipient) = self.state.unit_at(target).map(|unit| unit.id.clone()) else {
            return;
        };
        let Some(unit) = self.state.unit_mut(source) else {
            return;
        };
        let Some(index) = unit.items.iter().position(|item| item.id == item_id) else {
            return;
        };
        let item = unit.items.remove(index);

        for effect in &item.effects {
            match effect.kind {
                SkillEffectKind::Heal => {
                    let amount = effect.value.unwrap_or(DEFAULT_ITEM_HEAL);
                    self.apply_healing(source, &recipient, amount, now, out);
                    effects.push(ActionEffect::new(
                        EffectKind::Heal,
                        recipient.clone(),
                        Some(amount),
                    ));
                }
                SkillEffectKind::Status => {
                    if let Some(kind) = effect.status_type {
                        let duration = effect.duration.unwrap_or(DEFAULT_STATUS_DURATION);
                        let status = Status::new(kind, duration, item.id.as_str());
                        self.apply_status(source, &recipient, status, now, out);
                        effects.push(ActionEffect::status(recipient.clone(), kind, duration));
                    }
                }
                SkillEffectKind::Damage => {
                    let amount = effect.value.unwrap_or(DEFAULT_ITEM_HEAL);
                    let dealt = self.apply_damage(
                        source,
                        &recipient,
                        amount,
                        DamageType::True,
                        None,
                        now,
                        out,
                    );
                    effects.push(ActionEffect::new(
                        EffectKind::Damage,
                        recipient.clone(),
                        Some(dealt),
                    ));
                }
                SkillEffectKind::Move | SkillEffectKind::Teleport => {}
            }
        }
        targets.push(recipient);
    }

    fn face_toward(&mut self, source: &UnitId, target: &UnitId) {
        let Some(to) = self.state.unit(target).map(|unit| unit.position) else {
            return;
        };
        if let Some(unit) = self.state.unit_mut(source) {
            let delta = to - unit.position;
            if let Some(direction) = Direction::from_delta(delta.x, delta.y) {
                unit.facing = direction;
            }
        }
    }

    fn move_unit(&mut self, id: &UnitId, to: Position3D, now: u64, out: &mut Vec<CombatEvent>) {
        let Some(unit) = self.state.unit_mut(id) else {
            return;
        };
        let from = unit.position;
        let delta = to - from;
        if let Some(direction) = Direction::from_delta(delta.x, delta.y) {
            unit.facing = direction;
        }
        unit.position = to;

        let kind = CombatEventKind::UnitMoved {
            unit_id: id.clone(),
            from,
            to,
            path: straight_path(from, to),
            movement_cost: from.planar_distance(to),
        };
        self.emit(now, kind, out);
    }

    /// Applies damage and returns the hp actually removed.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn apply_damage(
        &mut self,
        source: &UnitId,
        target: &UnitId,
        amount: i32,
        damage_type: DamageType,
        element: Option<Element>,
        now: u64,
        out: &mut Vec<CombatEvent>,
    ) -> i32 {
        let blocked = self.state.defending.contains(target);
        let amount = if blocked { (amount / 2).max(1) } else { amount };
        let Some(unit) = self.state.unit_mut(target) else {
            return 0;
        };
        let hp_before = unit.stats.hp;
        let hp_after = (hp_before - amount).max(0);
        unit.stats.hp = hp_after;
        let dealt = hp_before - hp_after;
        self.state.statistics.record_damage(source, dealt);

        let kind = CombatEventKind::DamageApplied {
            target_id: target.clone(),
            source_id: source.clone(),
            damage: amount,
            damage_type,
            hp_before,
            hp_after,
            was_critical: false,
            was_blocked: blocked,
            element,
        };
        self.emit(now, kind, out);

        if hp_after == 0 {
            self.defeat(target, Some(source), now, out);
        }
        dealt
    }

    pub(super) fn apply_healing(
        &mut self,
        source: &UnitId,
        target: &UnitId,
        amount: i32,
        now: u64,
        out: &mut Vec<CombatEvent>,
    ) {
        let Some(unit) = self.state.unit_mut(target) else {
            return;
        };
        let cap = unit.effective_stats().hp_max;
        let hp_before = unit.stats.hp;
        let hp_after = (hp_before + amount.max(0)).min(cap).max(hp_before);
        unit.stats.hp = hp_after;
        self.state.statistics.record_healing(source, hp_after - hp_before);

        let kind = CombatEventKind::HealingApplied {
            target_id: target.clone(),
            source_id: source.clone(),
            healing: hp_after - hp_before,
            hp_before,
            hp_after,
            mp_before: None,
            mp_after: None,
        };
        self.emit(now, kind, out);
    }

    /// Adds a status, replacing an existing one of the same kind.
    fn apply_status(
        &mut self,
        source: &UnitId,
        target: &UnitId,
        status: Status,
        now: u64,
        out: &mut Vec<CombatEvent>,
    ) {
        let Some(unit) = self.state.unit_mut(target) else {
            return;
        };
        let replaced = unit.has_status(status.kind);
        unit.statuses.retain(|existing| existing.kind != status.kind);
        let (status_type, duration, intensity) = (status.kind, status.duration, status.intensity);
        unit.statuses.push(status);

        if replaced {
            let kind = CombatEventKind::StatusRemoved {
                target_id: target.clone(),
                status_type,
                reason: StatusRemovalReason::Replaced,
            };
            self.emit(now, kind, out);
        }
        let kind = CombatEventKind::StatusApplied {
            target_id: target.clone(),
            source_id: source.clone(),
            status_type,
            duration,
            intensity,
            stackable: false,
        };
        self.emit(now, kind, out);
    }

    /// Marks a unit dead, strips its statuses and credits the killer.
    fn defeat(
        &mut self,
        id: &UnitId,
        killer: Option<&UnitId>,
        now: u64,
        out: &mut Vec<CombatEvent>,
    ) {
        let Some(unit) = self.state.unit_mut(id) else {
            return;
        };
        unit.is_alive = false;
        unit.stats.hp = 0;
        let statuses: Vec<StatusKind> = unit.statuses.drain(..).map(|s| s.kind).collect();
        let team = unit.team_id.clone();
        self.state.defending.remove(id);
        self.state.statistics.record_defeat(&team);

        for status_type in statuses {
            let kind = CombatEventKind::StatusRemoved {
                target_id: id.clone(),
                status_type,
                reason: StatusRemovalReason::Death,
            };
            self.emit(now, kind, out);
        }

        let killer = killer
            .filter(|killer| self.state.unit(killer).is_some())
            .cloned();
        let mut experience_gained = BTreeMap::new();
        if let Some(killer) = &killer {
            experience_gained.insert(killer.clone(), DEFEAT_EXPERIENCE);
        }
        let kind = CombatEventKind::UnitDefeated {
            unit_id: id.clone(),
            killer_id: killer,
            revivable: false,
            experience_gained,
            items_dropped: Vec::new(),
        };
        self.emit(now, kind, out);
        info!(battle = %self.state.id, unit = %id, team = %team, "unit defeated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_path() {
        let path = straight_path(Position3D::new(0, 0, 0), Position3D::new(2, 1, 1));
        assert_eq!(
            path,
            vec![
                Position3D::new(1, 0, 0),
                Position3D::new(2, 0, 0),
                Position3D::new(2, 1, 1),
            ]
        );
        assert!(straight_path(Position3D::ORIGIN, Position3D::ORIGIN).is_empty());
    }

    #[test]
    fn test_damage_rules() {
        let attacker = Unit::new("a", "player", Position3D::ORIGIN);
        let defender = Unit::new("d", "enemy", Position3D::new(1, 0, 0));
        assert_eq!(physical_damage(&attacker, &defender), 5);

        let fireball = Skill::new("fire", crate::state::SkillType::Attack).with_power(30);
        assert_eq!(skill_damage(&fireball, &attacker, &defender), 30 + 5 - 7);

        let cure = Skill::new("cure", crate::state::SkillType::Heal).with_power(20);
        assert_eq!(skill_healing(&cure, &attacker), 25);
    }
}
