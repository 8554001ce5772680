//! Actions a unit can submit on its turn.
//!
//! A [`SubmittedAction`] is the request; the engine validates it against the
//! current [`crate::BattleState`] and either rejects it with an
//! [`ActionError`] or resolves it into combat events.
mod error;

pub use error::ActionError;

use crate::coords::Position3D;
use crate::state::UnitId;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionType {
    Move,
    Attack,
    Skill,
    Item,
    Wait,
    Defend,
}

impl ActionType {
    /// Whether the action needs a target cell.
    pub const fn needs_target(self) -> bool {
        !matches!(self, Self::Wait | Self::Defend)
    }
}

/// Action chosen by the active unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SubmittedAction {
    pub unit_id: UnitId,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub action_type: ActionType,
    pub skill_id: Option<String>,
    pub item_id: Option<String>,
    pub target_positions: Vec<Position3D>,
}

impl SubmittedAction {
    fn new(unit_id: impl Into<UnitId>, action_type: ActionType) -> Self {
        Self {
            unit_id: unit_id.into(),
            action_type,
            skill_id: None,
            item_id: None,
            target_positions: Vec::new(),
        }
    }

    fn targeting(mut self, target: Position3D) -> Self {
        self.target_positions.push(target);
        self
    }

    pub fn move_to(unit_id: impl Into<UnitId>, target: Position3D) -> Self {
        Self::new(unit_id, ActionType::Move).targeting(target)
    }

    pub fn attack(unit_id: impl Into<UnitId>, target: Position3D) -> Self {
        Self::new(unit_id, ActionType::Attack).targeting(target)
    }

    pub fn skill(unit_id: impl Into<UnitId>, skill_id: impl Into<String>, target: Position3D) -> Self {
        let mut action = Self::new(unit_id, ActionType::Skill).targeting(target);
        action.skill_id = Some(skill_id.into());
        action
    }

    pub fn item(unit_id: impl Into<UnitId>, item_id: impl Into<String>, target: Position3D) -> Self {
        let mut action = Self::new(unit_id, ActionType::Item).targeting(target);
        action.item_id = Some(item_id.into());
        action
    }

    pub fn wait(unit_id: impl Into<UnitId>) -> Self {
        Self::new(unit_id, ActionType::Wait)
    }

    pub fn defend(unit_id: impl Into<UnitId>) -> Self {
        Self::new(unit_id, ActionType::Defend)
    }

    pub fn target(&self) -> Option<Position3D> {
        self.target_positions.first().copied()
    }
}

/// An option offered to the active unit at turn start.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AvailableAction {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub action_type: ActionType,
    pub skill_id: Option<String>,
    pub item_id: Option<String>,
    pub name: String,
    pub description: String,
    pub cost: i32,
    pub range: u32,
    pub valid_targets: Vec<Position3D>,
    pub required_target_count: u32,
}

impl AvailableAction {
    pub fn accepts(&self, cell: Position3D) -> bool {
        self.valid_targets.iter().any(|target| target.same_cell(cell))
    }
}
