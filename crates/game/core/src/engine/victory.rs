use tracing::info;

use crate::events::{BattleRewards, CombatEndReason, CombatEvent, CombatEventKind};
use crate::state::{BattlePhase, TeamId};

use super::BattleEngine;

const EXPERIENCE_PER_DEFEAT: u32 = 50;
const GOLD_PER_DEFEAT: u32 = 25;
const JOB_POINTS_PER_DEFEAT: u32 = 5;

impl BattleEngine {
    /// Why the battle should end now, and who won.
    fn outcome(&self, now: u64) -> Option<(Option<TeamId>, CombatEndReason)> {
        let remaining = self.state.remaining_teams();
        let sole_survivor = match remaining.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };

        if remaining.len() <= 1 {
            return Some((sole_survivor, CombatEndReason::DefeatAll));
        }
        if self
            .config
            .turn_limit
            .is_some_and(|limit| self.state.current_turn > limit)
        {
            return Some((sole_survivor, CombatEndReason::TurnLimit));
        }
        let elapsed = now.saturating_sub(self.state.start_time);
        if self
            .config
            .time_limit
            .is_some_and(|limit| elapsed >= limit.saturating_mul(1000))
        {
            return Some((sole_survivor, CombatEndReason::Timeout));
        }
        None
    }

    /// Finishes the battle if an end condition holds. Returns whether it did.
    pub(super) fn check_finished(&mut self, now: u64, out: &mut Vec<CombatEvent>) -> bool {
        if self.state.phase.is_finished() {
            return true;
        }
        match self.outcome(now) {
            Some((winner, reason)) => {
                self.finish(winner, reason, now, out);
                true
            }
            None => false,
        }
    }

    pub(super) fn finish(
        &mut self,
        winner: Option<TeamId>,
        reason: CombatEndReason,
        now: u64,
        out: &mut Vec<CombatEvent>,
    ) {
        self.prune_queue();
        self.state.phase = BattlePhase::Finished;
        self.state.winner = winner.clone();
        self.state.end_reason = Some(reason);
        self.state.active_unit_id = None;
        self.state.is_player_turn = false;
        self.state.selected_action = None;
        self.state.available_actions.clear();

        self.state.statistics.total_turns = self.state.current_turn;
        self.state.statistics.duration = now.saturating_sub(self.state.start_time);

        let rewards = self.rewards_for(winner.as_ref());
        self.state.rewards = Some(rewards.clone());

        let kind = CombatEventKind::CombatEnded {
            winner_id: winner.clone(),
            reason,
            rewards,
            battle_stats: self.state.statistics.clone(),
        };
        self.emit(now, kind, out);

        info!(
            battle = %self.state.id,
            winner = winner.as_ref().map(|team| team.as_str()).unwrap_or("none"),
            reason = %reason,
            turns = self.state.current_turn,
            "battle finished"
        );
    }

    fn rewards_for(&self, winner: Option<&TeamId>) -> BattleRewards {
        let Some(winner) = winner else {
            return BattleRewards::default();
        };
        let defeated = self
            .state
            .participants
            .iter()
            .filter(|unit| &unit.team_id != winner && !unit.is_active())
            .count() as u32;

        let mut rewards = BattleRewards {
            experience: EXPERIENCE_PER_DEFEAT * defeated,
            gold: GOLD_PER_DEFEAT * defeated,
            ..BattleRewards::default()
        };
        for unit in self.state.team_units(winner).filter(|unit| unit.is_active()) {
            *rewards.job_points.entry(unit.job.id.clone()).or_default() +=
                JOB_POINTS_PER_DEFEAT * defeated;
        }
        rewards
    }
}
