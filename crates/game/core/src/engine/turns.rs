//! Turn queue maintenance and turn-start upkeep.
use tracing::{debug, trace};

use crate::action::ActionType;
use crate::events::{CombatEvent, CombatEventKind, StatusRemovalReason};
use crate::state::{BattlePhase, StatusKind, UnitId};

use super::BattleEngine;

impl BattleEngine {
    /// Living participants by descending effective speed; ties keep roster order.
    pub(super) fn build_turn_queue(&mut self) {
        let mut ranked: Vec<(i32, UnitId)> = self
            .state
            .living_units()
            .map(|unit| (unit.effective_stats().speed, unit.id.clone()))
            .collect();
        // `sort_by` is stable.
        ranked.sort_by(|a, b| b.0.cmp(&a.0));
        self.state.turn_queue = ranked.into_iter().map(|(_, id)| id).collect();
    }

    fn is_living(&self, id: &UnitId) -> bool {
        self.state.unit(id).is_some_and(|unit| unit.is_active())
    }

    /// Drops dead units while keeping the cursor on the same slot.
    pub(super) fn prune_queue(&mut self) {
        let index = self.state.current_turn_index;
        let before = self.state.turn_queue[..index.min(self.state.turn_queue.len())]
            .iter()
            .filter(|id| self.is_living(id))
            .count();
        let queue = std::mem::take(&mut self.state.turn_queue);
        self.state.turn_queue = queue.into_iter().filter(|id| self.is_living(id)).collect();
        self.state.current_turn_index = if self.state.turn_queue.is_empty() {
            0
        } else {
            before.min(self.state.turn_queue.len() - 1)
        };
    }

    /// Moves the cursor past the current unit, removing the dead and
    /// bumping `current_turn` when the queue wraps.
    pub(super) fn advance_queue(&mut self) {
        let len = self.state.turn_queue.len();
        let index = self.state.current_turn_index.min(len.saturating_sub(1));
        let next = self.state.turn_queue[..(index + 1).min(len)]
            .iter()
            .filter(|id| self.is_living(id))
            .count();

        let queue = std::mem::take(&mut self.state.turn_queue);
        self.state.turn_queue = queue.into_iter().filter(|id| self.is_living(id)).collect();

        if next >= self.state.turn_queue.len() {
            self.state.current_turn_index = 0;
            self.state.current_turn += 1;
            trace!(battle = %self.state.id, turn = self.state.current_turn, "turn queue wrapped");
        } else {
            self.state.current_turn_index = next;
        }
    }

    /// Opens the turn of the unit under the cursor, passing over units that
    /// cannot act until one can or the battle ends.
    pub(super) fn begin_turn(&mut self, now: u64, out: &mut Vec<CombatEvent>) {
        loop {
            let Some(id) = self
                .state
                .turn_queue
                .get(self.state.current_turn_index)
                .cloned()
            else {
                self.check_finished(now, out);
                return;
            };

            self.state.active_unit_id = Some(id.clone());
            self.state.is_player_turn = self
                .state
                .unit(&id)
                .is_some_and(|unit| unit.team_id.is_player());
            self.state.defending.remove(&id);

            self.run_upkeep(&id, now, out);
            if self.check_finished(now, out) {
                return;
            }

            let can_act = self.state.unit(&id).is_some_and(|unit| unit.can_act());
            if can_act {
                self.state.phase = BattlePhase::WaitingAction;
                self.state.available_actions = self.compute_available_actions(&id);
                let kind = CombatEventKind::TurnStarted {
                    unit_id: id.clone(),
                    available_actions: self
                        .state
                        .available_actions
                        .iter()
                        .map(|action| action.action_type)
                        .fold(Vec::new(), |mut acc, kind| {
                            if !acc.contains(&kind) {
                                acc.push(kind);
                            }
                            acc
                        }),
                    time_limit: self.time_remaining(now),
                };
                self.emit(now, kind, out);
                debug!(
                    battle = %self.state.id,
                    unit = %id,
                    turn = self.state.current_turn,
                    "turn started"
                );
                return;
            }

            if self.is_living(&id) {
                debug!(battle = %self.state.id, unit = %id, "unit cannot act, passing turn");
                let kind = CombatEventKind::ActionResolved {
                    source_id: id.clone(),
                    target_ids: Vec::new(),
                    skill_id: None,
                    action_type: ActionType::Wait,
                    success: false,
                    effects: Vec::new(),
                };
                self.emit(now, kind, out);
            }

            self.advance_queue();
            if self.check_finished(now, out) {
                return;
            }
        }
    }

    /// Turn-start processing: hp ticks, status expiry and cooldowns.
    fn run_upkeep(&mut self, id: &UnitId, now: u64, out: &mut Vec<CombatEvent>) {
        let Some(unit) = self.state.unit(id) else {
            return;
        };
        let ticking: Vec<_> = unit
            .statuses
            .iter()
            .filter(|status| status.kind.ticks())
            .map(|status| (status.kind, status.tick_amount(), UnitId::new(&status.source)))
            .collect();

        for (kind, amount, source) in ticking {
            if !self.is_living(id) {
                break;
            }
            match kind {
                StatusKind::Poison => {
                    self.apply_damage(
                        &source,
                        id,
                        amount,
                        crate::events::DamageType::Poison,
                        None,
                        now,
                        out,
                    );
                }
                StatusKind::Regen => self.apply_healing(&source, id, amount, now, out),
                _ => {}
            }
        }

        if !self.is_living(id) {
            return;
        }

        let mut expired = Vec::new();
        if let Some(unit) = self.state.unit_mut(id) {
            for status in &mut unit.statuses {
                status.duration = status.duration.saturating_sub(1);
            }
            unit.statuses.retain(|status| {
                if status.duration == 0 {
                    expired.push(status.kind);
                    false
                } else {
                    true
                }
            });
            for remaining in unit.cooldowns.values_mut() {
                *remaining = remaining.saturating_sub(1);
            }
            unit.cooldowns.retain(|_, remaining| *remaining > 0);
        }

        for status_type in expired {
            let kind = CombatEventKind::StatusRemoved {
                target_id: id.clone(),
                status_type,
                reason: StatusRemovalReason::Expired,
            };
            self.emit(now, kind, out);
        }
    }

    /// Seconds left on the battle clock.
    pub(super) fn time_remaining(&self, now: u64) -> Option<u64> {
        let limit_ms = self.config.time_limit?.saturating_mul(1000);
        let elapsed = now.saturating_sub(self.state.start_time);
        Some(limit_ms.saturating_sub(elapsed) / 1000)
    }
}
