//! Authoritative battle state.
//!
//! [`BattleState`] is owned by [`crate::BattleEngine`]. Views and runtime
//! layers read it freely but never write to it; every change is the result of
//! an engine transition or of a mirrored [`crate::CombatEvent`].
pub mod kit;
pub mod unit;

use std::collections::BTreeSet;

pub use kit::{
    EffectTarget, Element, Equipment, Item, ItemType, Job, Rarity, Skill, SkillEffect,
    SkillEffectKind, SkillType, Status, StatusKind,
};
pub use unit::{StatBonuses, TeamId, Unit, UnitId, UnitStats};

use crate::action::{AvailableAction, SubmittedAction};
use crate::config::BattleConfig;
use crate::coords::Position3D;
use crate::events::{BattleRewards, BattleStatistics, CombatEndReason};

/// Top-level phase of the battle state machine.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BattlePhase {
    /// Participants placed, queue not built yet.
    #[default]
    Idle,
    /// The active unit must submit an action.
    WaitingAction,
    /// An action's events have been emitted and are being presented.
    Resolving,
    /// Terminal.
    Finished,
}

impl BattlePhase {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BattleState {
    pub id: String,
    pub participants: Vec<Unit>,
    /// Round counter, starting at 1 and bumped whenever the queue wraps.
    pub current_turn: u32,
    pub active_unit_id: Option<UnitId>,
    pub grid_width: i32,
    pub grid_height: i32,
    pub phase: BattlePhase,
    pub turn_queue: Vec<UnitId>,
    pub current_turn_index: usize,
    pub winner: Option<TeamId>,
    pub end_reason: Option<CombatEndReason>,
    pub rewards: Option<BattleRewards>,
    /// Milliseconds on the caller's clock when the battle was created.
    pub start_time: u64,
    pub is_player_turn: bool,
    pub selected_action: Option<SubmittedAction>,
    pub available_actions: Vec<AvailableAction>,
    /// Units whose defend stance lasts until their next turn.
    #[cfg_attr(feature = "serde", serde(default))]
    pub defending: BTreeSet<UnitId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub statistics: BattleStatistics,
}

impl BattleState {
    /// Fresh battle in [`BattlePhase::Idle`].
    pub fn new(
        id: impl Into<String>,
        config: &BattleConfig,
        participants: Vec<Unit>,
        start_time: u64,
    ) -> Self {
        Self {
            id: id.into(),
            participants,
            current_turn: 1,
            active_unit_id: None,
            grid_width: config.grid_width,
            grid_height: config.grid_height,
            phase: BattlePhase::Idle,
            turn_queue: Vec::new(),
            current_turn_index: 0,
            winner: None,
            end_reason: None,
            rewards: None,
            start_time,
            is_player_turn: false,
            selected_action: None,
            available_actions: Vec::new(),
            defending: BTreeSet::new(),
            statistics: BattleStatistics::default(),
        }
    }

    pub fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.participants.iter().find(|unit| &unit.id == id)
    }

    pub fn unit_mut(&mut self, id: &UnitId) -> Option<&mut Unit> {
        self.participants.iter_mut().find(|unit| &unit.id == id)
    }

    pub fn active_unit(&self) -> Option<&Unit> {
        self.active_unit_id.as_ref().and_then(|id| self.unit(id))
    }

    /// Living unit standing on the given ground cell.
    pub fn unit_at(&self, cell: Position3D) -> Option<&Unit> {
        self.participants
            .iter()
            .find(|unit| unit.is_active() && unit.position.same_cell(cell))
    }

    pub fn living_units(&self) -> impl Iterator<Item = &Unit> {
        self.participants.iter().filter(|unit| unit.is_active())
    }

    /// Teams in order of first appearance among participants.
    pub fn teams(&self) -> Vec<TeamId> {
        let mut teams: Vec<TeamId> = Vec::new();
        for unit in &self.participants {
            if !teams.contains(&unit.team_id) {
                teams.push(unit.team_id.clone());
            }
        }
        teams
    }

    pub fn team_units<'a>(&'a self, team: &'a TeamId) -> impl Iterator<Item = &'a Unit> {
        self.participants
            .iter()
            .filter(move |unit| &unit.team_id == team)
    }

    /// Every member is dead or at `hp <= 0`.
    pub fn is_team_defeated(&self, team: &TeamId) -> bool {
        self.team_units(team).all(|unit| !unit.is_active())
    }

    pub fn remaining_teams(&self) -> Vec<TeamId> {
        self.teams()
            .into_iter()
            .filter(|team| !self.is_team_defeated(team))
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_finished() || self.remaining_teams().len() <= 1
    }

    pub fn contains(&self, cell: Position3D) -> bool {
        cell.x >= 0 && cell.x < self.grid_width && cell.y >= 0 && cell.y < self.grid_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> BattleState {
        let units = vec![
            Unit::new("p1", "player", Position3D::new(2, 3, 0)),
            Unit::new("p2", "player", Position3D::new(3, 2, 0)),
            Unit::new("e1", "enemy", Position3D::new(15, 16, 0)),
            Unit::new("e2", "enemy", Position3D::new(16, 15, 0)),
        ];
        BattleState::new("battle_1", &BattleConfig::default(), units, 0)
    }

    #[test]
    fn test_new_battle_is_idle() {
        let state = scenario();
        assert_eq!(state.phase, BattlePhase::Idle);
        assert_eq!(state.participants.len(), 4);
        assert_eq!(state.winner, None);
        assert_eq!(state.current_turn, 1);
        assert_eq!(state.grid_width, 20);
    }

    #[test]
    fn test_team_defeat_counts_zero_hp() {
        let mut state = scenario();
        assert_eq!(state.remaining_teams().len(), 2);

        let enemy = TeamId::new("enemy");
        for id in ["e1", "e2"] {
            if let Some(unit) = state.unit_mut(&UnitId::from(id)) {
                unit.stats.hp = 0;
            }
        }
        assert!(state.is_team_defeated(&enemy));
        assert_eq!(state.remaining_teams(), vec![TeamId::player()]);
        assert!(state.is_finished());
    }

    #[test]
    fn test_unit_at_ignores_elevation_and_dead() {
        let mut state = scenario();
        assert!(state.unit_at(Position3D::new(2, 3, 4)).is_some());
        if let Some(unit) = state.unit_mut(&UnitId::from("p1")) {
            unit.is_alive = false;
        }
        assert!(state.unit_at(Position3D::new(2, 3, 0)).is_none());
    }
}
