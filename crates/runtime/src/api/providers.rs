//! Asynchronous abstraction for sourcing player and NPC intent.
//!
//! Runtime users plug in [`ActionProvider`] implementations so a battle can
//! run with human input, scripted fixtures, or simple policies.
use async_trait::async_trait;
use battle_core::{ActionType, BattleState, Position3D, SubmittedAction, Unit, UnitId};

use super::errors::{Result, RuntimeError};

/// Trait for providing actions based on the current battle state.
///
/// Different implementations can handle:
/// - Player input (from UI/CLI)
/// - Enemy policies
/// - Scripted/replayed actions
/// - Testing fixtures
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Choose an action for `unit`, which is the active unit of `state`.
    ///
    /// `state.available_actions` lists what the engine will accept this turn.
    async fn provide_action(&self, unit: &UnitId, state: &BattleState) -> Result<SubmittedAction>;
}

/// A simple action provider that always returns Wait action.
/// Useful for testing or as a fallback.
pub struct WaitActionProvider;

#[async_trait]
impl ActionProvider for WaitActionProvider {
    async fn provide_action(&self, unit: &UnitId, _state: &BattleState) -> Result<SubmittedAction> {
        Ok(SubmittedAction::wait(unit.clone()))
    }
}

/// Demo policy: strike the nearest enemy if possible, otherwise walk toward it.
pub struct AdvanceAndStrikeProvider;

impl AdvanceAndStrikeProvider {
    fn nearest_enemy<'a>(state: &'a BattleState, me: &Unit) -> Option<&'a Unit> {
        state
            .living_units()
            .filter(|unit| unit.is_enemy_of(me))
            .min_by_key(|unit| (me.position.manhattan(unit.position), unit.id.clone()))
    }

    fn offered_targets(state: &BattleState, action_type: ActionType) -> impl Iterator<Item = Position3D> + '_ {
        state
            .available_actions
            .iter()
            .filter(move |action| action.action_type == action_type)
            .flat_map(|action| action.valid_targets.iter().copied())
    }
}

#[async_trait]
impl ActionProvider for AdvanceAndStrikeProvider {
    async fn provide_action(&self, unit: &UnitId, state: &BattleState) -> Result<SubmittedAction> {
        let me = state.unit(unit).ok_or(RuntimeError::NoActiveUnit)?;
        let Some(enemy) = Self::nearest_enemy(state, me) else {
            return Ok(SubmittedAction::wait(unit.clone()));
        };

        if let Some(target) = Self::offered_targets(state, ActionType::Attack)
            .find(|cell| cell.same_cell(enemy.position))
        {
            return Ok(SubmittedAction::attack(unit.clone(), target));
        }

        let current = me.position.manhattan(enemy.position);
        let step = Self::offered_targets(state, ActionType::Move)
            .map(|cell| (cell.manhattan(enemy.position), cell))
            .filter(|(distance, _)| *distance < current)
            .min();

        Ok(match step {
            Some((_, cell)) => SubmittedAction::move_to(unit.clone(), cell),
            None => SubmittedAction::wait(unit.clone()),
        })
    }
}
