//! Options offered to the active unit and input-side target checks.
use crate::action::{ActionType, AvailableAction};
use crate::coords::{Position3D, cells_within};
use crate::state::{ItemType, StatusKind, Unit, UnitId};

use super::BattleEngine;

impl BattleEngine {
    /// Actions computed for the active unit when its turn opened.
    pub fn available_actions(&self) -> &[AvailableAction] {
        &self.state.available_actions
    }

    /// Whether any available action of the active unit accepts `cell`.
    pub fn is_legal_target(&self, cell: Position3D) -> bool {
        self.state
            .available_actions
            .iter()
            .any(|action| action.accepts(cell))
    }

    pub fn is_legal_target_for(&self, action_type: ActionType, cell: Position3D) -> bool {
        self.state
            .available_actions
            .iter()
            .filter(|action| action.action_type == action_type)
            .any(|action| action.accepts(cell))
    }

    /// Ground cell at `(x, y)` lifted to its terrain height.
    pub(super) fn ground(&self, x: i32, y: i32) -> Position3D {
        Position3D::new(x, y, self.config.height_at(x, y))
    }

    /// Cells the unit could move to this turn.
    pub(super) fn move_targets(&self, unit: &Unit) -> Vec<Position3D> {
        let movement = unit.effective_stats().movement;
        cells_within(unit.position, movement, false)
            .into_iter()
            .filter(|cell| self.config.is_passable(cell.x, cell.y))
            .filter(|cell| self.state.unit_at(*cell).is_none())
            .map(|cell| self.ground(cell.x, cell.y))
            .collect()
    }

    fn attack_targets(&self, unit: &Unit) -> Vec<Position3D> {
        let range = unit.effective_stats().range;
        self.state
            .living_units()
            .filter(|other| other.is_enemy_of(unit))
            .filter(|other| {
                let distance = other.position.planar_distance(unit.position);
                distance >= 1 && distance <= range
            })
            .map(|other| other.position)
            .collect()
    }

    fn skill_targets(&self, unit: &Unit, range: u32) -> Vec<Position3D> {
        cells_within(unit.position, range, true)
            .into_iter()
            .filter(|cell| self.state.contains(*cell))
            .map(|cell| self.ground(cell.x, cell.y))
            .collect()
    }

    fn item_targets(&self, unit: &Unit) -> Vec<Position3D> {
        self.state
            .living_units()
            .filter(|other| !other.is_enemy_of(unit))
            .filter(|other| other.position.planar_distance(unit.position) <= 1)
            .map(|other| other.position)
            .collect()
    }

    pub(super) fn compute_available_actions(&self, id: &UnitId) -> Vec<AvailableAction> {
        let Some(unit) = self.state.unit(id) else {
            return Vec::new();
        };
        let stats = unit.effective_stats();
        let mut actions = Vec::new();

        let moves = self.move_targets(unit);
        if !moves.is_empty() {
            actions.push(AvailableAction {
                action_type: ActionType::Move,
                skill_id: None,
                item_id: None,
                name: "Move".to_owned(),
                description: "Move to another cell".to_owned(),
                cost: 0,
                range: stats.movement,
                valid_targets: moves,
                required_target_count: 1,
            });
        }

        let attacks = self.attack_targets(unit);
        if !attacks.is_empty() {
            actions.push(AvailableAction {
                action_type: ActionType::Attack,
                skill_id: None,
                item_id: None,
                name: "Attack".to_owned(),
                description: "Basic physical attack".to_owned(),
                cost: 0,
                range: stats.range,
                valid_targets: attacks,
                required_target_count: 1,
            });
        }

        if !unit.has_status(StatusKind::Silence) {
            for skill in &unit.skills {
                if skill.cost > unit.stats.mp || unit.cooldown(&skill.id) > 0 {
                    continue;
                }
                actions.push(AvailableAction {
                    action_type: ActionType::Skill,
                    skill_id: Some(skill.id.clone()),
                    item_id: None,
                    name: skill.name.clone(),
                    description: skill.description.clone(),
                    cost: skill.cost,
                    range: skill.range,
                    valid_targets: self.skill_targets(unit, skill.range),
                    required_target_count: 1,
                });
            }
        }

        let item_targets = self.item_targets(unit);
        for item in unit
            .items
            .iter()
            .filter(|item| item.kind == ItemType::Consumable)
        {
            actions.push(AvailableAction {
                action_type: ActionType::Item,
                skill_id: None,
                item_id: Some(item.id.clone()),
                name: item.name.clone(),
                description: String::new(),
                cost: 0,
                range: 1,
                valid_targets: item_targets.clone(),
                required_target_count: 1,
            });
        }

        for (action_type, name, description) in [
            (ActionType::Defend, "Defend", "Halve incoming damage until next turn"),
            (ActionType::Wait, "Wait", "End the turn"),
        ] {
            actions.push(AvailableAction {
                action_type,
                skill_id: None,
                item_id: None,
                name: name.to_owned(),
                description: description.to_owned(),
                cost: 0,
                range: 0,
                valid_targets: Vec::new(),
                required_target_count: 0,
            });
        }

        actions
    }
}
