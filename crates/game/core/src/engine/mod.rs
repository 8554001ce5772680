//! Battle state machine.
//!
//! [`BattleEngine`] owns the authoritative [`BattleState`] and drives it
//! through `Idle → WaitingAction → Resolving → Finished`. Every transition
//! returns the [`CombatEvent`]s it produced, stamped in strictly increasing
//! sequence order. Invalid submissions are rejected with an [`ActionError`]
//! before anything is touched.
//!
//! Time is always supplied by the caller as milliseconds, so the engine is
//! deterministic and replayable.
mod available;
mod mirror;
mod resolve;
mod turns;
mod victory;

use tracing::{debug, info};

use crate::action::{ActionError, SubmittedAction};
use crate::config::BattleConfig;
use crate::events::{CombatEvent, CombatEventKind, EventSequencer, GridSize};
use crate::state::{BattlePhase, BattleState, TeamId, Unit};

/// Events produced by a submitted action, plus the phase it left behind.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub events: Vec<CombatEvent>,
    pub phase: BattlePhase,
}

impl Resolution {
    pub fn is_finished(&self) -> bool {
        self.phase.is_finished()
    }
}

pub struct BattleEngine {
    state: BattleState,
    config: BattleConfig,
    sequencer: EventSequencer,
}

impl BattleEngine {
    /// Creates a battle in [`BattlePhase::Idle`].
    pub fn new(
        id: impl Into<String>,
        config: BattleConfig,
        participants: Vec<Unit>,
        now: u64,
    ) -> Self {
        let state = BattleState::new(id, &config, participants, now);
        let sequencer = EventSequencer::new(state.id.clone());
        Self {
            state,
            config,
            sequencer,
        }
    }

    /// Rebuilds an engine around a restored state.
    pub fn from_parts(state: BattleState, config: BattleConfig, sequencer: EventSequencer) -> Self {
        Self {
            state,
            config,
            sequencer,
        }
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &EventSequencer {
        &self.sequencer
    }

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn winner(&self) -> Option<&TeamId> {
        self.state.winner.as_ref()
    }

    /// `Idle → WaitingAction`: builds the turn queue and opens the first turn.
    pub fn start(&mut self, now: u64) -> Result<Vec<CombatEvent>, ActionError> {
        if self.state.phase != BattlePhase::Idle {
            return Err(ActionError::WrongPhase(self.state.phase));
        }

        self.build_turn_queue();
        self.state.current_turn = 1;
        self.state.current_turn_index = 0;

        let mut events = Vec::new();
        let kind = CombatEventKind::CombatStarted {
            participants: self.state.participants.iter().map(|u| u.id.clone()).collect(),
            grid_size: GridSize {
                width: self.state.grid_width,
                height: self.state.grid_height,
            },
            initial_positions: self
                .state
                .participants
                .iter()
                .map(|u| (u.id.clone(), u.position))
                .collect(),
        };
        self.emit(now, kind, &mut events);

        info!(
            battle = %self.state.id,
            participants = self.state.participants.len(),
            queue = self.state.turn_queue.len(),
            "battle started"
        );

        if !self.check_finished(now, &mut events) {
            self.begin_turn(now, &mut events);
        }
        Ok(events)
    }

    /// `WaitingAction → Resolving`: validates and resolves the active unit's action.
    ///
    /// On rejection nothing changes and no event is emitted.
    pub fn submit_action(
        &mut self,
        action: SubmittedAction,
        now: u64,
    ) -> Result<Resolution, ActionError> {
        if let Err(err) = self.validate(&action) {
            debug!(
                battle = %self.state.id,
                unit = %action.unit_id,
                action = %action.action_type,
                error = %err,
                "action rejected"
            );
            return Err(err);
        }

        let mut events = Vec::new();
        self.resolve(action, now, &mut events);
        Ok(Resolution {
            events,
            phase: self.state.phase,
        })
    }

    /// `Resolving → WaitingAction | Finished`: hands the turn to the next living unit.
    pub fn end_resolution(&mut self, now: u64) -> Result<Vec<CombatEvent>, ActionError> {
        if self.state.phase != BattlePhase::Resolving {
            return Err(ActionError::WrongPhase(self.state.phase));
        }

        let mut events = Vec::new();
        self.state.selected_action = None;
        if self.check_finished(now, &mut events) {
            return Ok(events);
        }
        self.advance_queue();
        if self.check_finished(now, &mut events) {
            return Ok(events);
        }
        self.begin_turn(now, &mut events);
        Ok(events)
    }

    /// Submits an action and immediately ends its resolution.
    pub fn act(&mut self, action: SubmittedAction, now: u64) -> Result<Resolution, ActionError> {
        let mut resolution = self.submit_action(action, now)?;
        if resolution.phase == BattlePhase::Resolving {
            resolution.events.extend(self.end_resolution(now)?);
        }
        resolution.phase = self.state.phase;
        Ok(resolution)
    }

    /// Re-checks victory and limits, emitting `CombatEnded` if the battle is over.
    pub fn evaluate(&mut self, now: u64) -> Option<CombatEvent> {
        if self.state.phase.is_finished() {
            return None;
        }
        let mut events = Vec::new();
        self.prune_queue();
        self.check_finished(now, &mut events);
        events.pop()
    }

    /// Ends the battle with `team` conceding.
    pub fn surrender(&mut self, team: &TeamId, now: u64) -> Result<CombatEvent, ActionError> {
        if self.state.phase.is_finished() {
            return Err(ActionError::WrongPhase(self.state.phase));
        }
        let remaining: Vec<TeamId> = self
            .state
            .remaining_teams()
            .into_iter()
            .filter(|t| t != team)
            .collect();
        let winner = match remaining.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        let mut events = Vec::new();
        self.finish(winner, crate::events::CombatEndReason::Surrender, now, &mut events);
        events.pop().ok_or(ActionError::WrongPhase(self.state.phase))
    }

    fn emit(&mut self, now: u64, kind: CombatEventKind, out: &mut Vec<CombatEvent>) {
        let event = self.sequencer.stamp(now, self.state.current_turn, kind);
        out.push(event);
    }
}
