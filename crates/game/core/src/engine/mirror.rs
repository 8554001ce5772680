//! Applying events produced by a remote authority.
//!
//! In mirror mode the local engine never resolves actions itself; it folds
//! authoritative events into its [`crate::BattleState`] and the caller runs
//! [`BattleEngine::evaluate`] afterwards.
use tracing::{trace, warn};

use crate::action::{ActionError, ActionType};
use crate::config::TerrainTile;
use crate::coords::Direction;
use crate::events::{CombatEvent, CombatEventKind};
use crate::state::{BattlePhase, Status};

use super::BattleEngine;

impl BattleEngine {
    /// Folds one authoritative event into local state.
    ///
    /// Events referring to unknown units are rejected without side effects.
    pub fn apply_event(&mut self, event: &CombatEvent) -> Result<(), ActionError> {
        self.check_subject(&event.kind)?;
        trace!(battle = %self.state.id, event = event.event_type(), seq = event.sequence(), "mirroring event");

        let turn_number = event.header.turn_number;
        match &event.kind {
            CombatEventKind::CombatStarted {
                participants,
                initial_positions,
                ..
            } => {
                self.state.turn_queue = participants
                    .iter()
                    .filter(|id| self.state.unit(id).is_some())
                    .cloned()
                    .collect();
                for (id, position) in initial_positions {
                    if let Some(unit) = self.state.unit_mut(id) {
                        unit.position = *position;
                    }
                }
                self.state.current_turn = turn_number.max(1);
                self.state.current_turn_index = 0;
                if self.state.phase == BattlePhase::Idle {
                    self.state.phase = BattlePhase::WaitingAction;
                }
            }
            CombatEventKind::TurnStarted { unit_id, .. } => {
                self.state.current_turn = turn_number.max(self.state.current_turn);
                if let Some(index) = self.state.turn_queue.iter().position(|id| id == unit_id) {
                    self.state.current_turn_index = index;
                }
                self.state.active_unit_id = Some(unit_id.clone());
                self.state.is_player_turn = self
                    .state
                    .unit(unit_id)
                    .is_some_and(|unit| unit.team_id.is_player());
                self.state.defending.remove(unit_id);
                self.set_phase(BattlePhase::WaitingAction);
            }
            CombatEventKind::ActionResolved {
                source_id,
                action_type,
                ..
            } => {
                if *action_type == ActionType::Defend {
                    self.state.defending.insert(source_id.clone());
                }
                self.set_phase(BattlePhase::Resolving);
            }
            CombatEventKind::DamageApplied {
                target_id,
                source_id,
                hp_before,
                hp_after,
                ..
            } => {
                if let Some(unit) = self.state.unit_mut(target_id) {
                    unit.stats.hp = *hp_after;
                }
                self.state
                    .statistics
                    .record_damage(source_id, hp_before.saturating_sub(*hp_after).max(0));
            }
            CombatEventKind::HealingApplied {
                target_id,
                source_id,
                healing,
                hp_after,
                mp_after,
                ..
            } => {
                if let Some(unit) = self.state.unit_mut(target_id) {
                    unit.stats.hp = *hp_after;
                    if let Some(mp) = mp_after {
                        unit.stats.mp = *mp;
                    }
                }
                self.state.statistics.record_healing(source_id, *healing);
            }
            CombatEventKind::UnitMoved { unit_id, from, to, .. } => {
                if let Some(unit) = self.state.unit_mut(unit_id) {
                    unit.position = *to;
                    if let Some(direction) = Direction::from_delta(
                        to.x.saturating_sub(from.x),
                        to.y.saturating_sub(from.y),
                    ) {
                        unit.facing = direction;
                    }
                }
            }
            CombatEventKind::StatusApplied {
                target_id,
                source_id,
                status_type,
                duration,
                intensity,
                stackable,
            } => {
                if let Some(unit) = self.state.unit_mut(target_id) {
                    if !stackable {
                        unit.statuses.retain(|status| status.kind != *status_type);
                    }
                    unit.statuses.push(
                        Status::new(*status_type, *duration, source_id.as_str())
                            .with_intensity(*intensity),
                    );
                }
            }
            CombatEventKind::StatusRemoved {
                target_id,
                status_type,
                ..
            } => {
                if let Some(unit) = self.state.unit_mut(target_id) {
                    unit.statuses.retain(|status| status.kind != *status_type);
                }
            }
            CombatEventKind::SkillUsed {
                source_id,
                skill_id,
                mp_cost,
                ..
            } => {
                if let Some(unit) = self.state.unit_mut(source_id) {
                    unit.stats.mp = unit.stats.mp.saturating_sub(*mp_cost).max(0);
                }
                self.state.statistics.record_skill(skill_id);
            }
            CombatEventKind::UnitDefeated { unit_id, .. } => {
                let mut team = None;
                if let Some(unit) = self.state.unit_mut(unit_id) {
                    if unit.is_alive {
                        team = Some(unit.team_id.clone());
                    }
                    unit.is_alive = false;
                    unit.stats.hp = 0;
                    unit.statuses.clear();
                }
                if let Some(team) = team {
                    self.state.statistics.record_defeat(&team);
                }
                self.state.defending.remove(unit_id);
            }
            CombatEventKind::CombatEnded {
                winner_id,
                reason,
                rewards,
                battle_stats,
            } => {
                self.state.phase = BattlePhase::Finished;
                self.state.winner = winner_id.clone();
                self.state.end_reason = Some(*reason);
                self.state.rewards = Some(rewards.clone());
                self.state.statistics = battle_stats.clone();
                self.state.active_unit_id = None;
                self.state.available_actions.clear();
            }
            CombatEventKind::TerrainChanged {
                position, new_type, ..
            } => match self.config.tile_mut(position.x, position.y) {
                Some(tile) => *tile = TerrainTile::new(*new_type, tile.height),
                None => warn!(battle = %self.state.id, %position, "terrain change outside configured terrain"),
            },
            CombatEventKind::AnimationRequest { .. } => {}
        }

        self.sequencer.observe(&event.header);
        Ok(())
    }

    fn set_phase(&mut self, phase: BattlePhase) {
        if !self.state.phase.is_finished() {
            self.state.phase = phase;
        }
    }

    fn check_subject(&self, kind: &CombatEventKind) -> Result<(), ActionError> {
        match kind.subject() {
            Some(id) if self.state.unit(id).is_none() => Err(ActionError::UnitNotFound(id.clone())),
            _ => Ok(()),
        }
    }
}
