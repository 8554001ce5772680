//! Combat events: the only way battle changes leave the engine.
//!
//! Every event carries an [`EventHeader`] whose `(timestamp, sequence)` pair
//! totally orders it within a battle. With the `serde` feature, an event
//! serializes to one flat record:
//! `{"type": "damage_applied", "combatId": .., "timestamp": .., "turnNumber": .., "sequence": .., ...payload}`.
mod sequencer;
mod summary;

use std::collections::BTreeMap;

pub use sequencer::EventSequencer;
pub use summary::{BattleRewards, BattleStatistics};

use crate::action::ActionType;
use crate::config::TerrainKind;
use crate::coords::Position3D;
use crate::state::{Element, StatusKind, TeamId, UnitId};

/// Ordering and routing fields shared by every event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EventHeader {
    pub combat_id: String,
    pub timestamp: u64,
    pub turn_number: u32,
    pub sequence: u64,
}

impl EventHeader {
    /// Sort key giving the total order of events within a battle.
    pub fn order_key(&self) -> (u64, u64) {
        (self.timestamp, self.sequence)
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatEvent {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub header: EventHeader,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: CombatEventKind,
}

impl CombatEvent {
    pub fn new(header: EventHeader, kind: CombatEventKind) -> Self {
        Self { header, kind }
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    pub fn sequence(&self) -> u64 {
        self.header.sequence
    }

    pub fn timestamp(&self) -> u64 {
        self.header.timestamp
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum DamageType {
    Physical,
    Magical,
    True,
    Poison,
    Fire,
    Ice,
}

impl DamageType {
    /// Damage type a skill of the given element deals.
    pub fn for_element(element: Element) -> Self {
        match element {
            Element::Fire => Self::Fire,
            Element::Ice => Self::Ice,
            _ => Self::Magical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum StatusRemovalReason {
    Expired,
    Dispelled,
    Replaced,
    Death,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum CombatEndReason {
    DefeatAll,
    Timeout,
    TurnLimit,
    Surrender,
    ObjectiveComplete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum EffectKind {
    Damage,
    Heal,
    Status,
    Move,
    StatChange,
}

/// Summary of one consequence of an action, listed in `ActionResolved`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ActionEffect {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: EffectKind,
    pub target_id: UnitId,
    pub value: Option<i32>,
    pub status_type: Option<StatusKind>,
    pub duration: Option<u32>,
    pub stat_type: Option<String>,
}

impl ActionEffect {
    pub fn new(kind: EffectKind, target_id: UnitId, value: Option<i32>) -> Self {
        Self {
            kind,
            target_id,
            value,
            status_type: None,
            duration: None,
            stat_type: None,
        }
    }

    pub fn status(target_id: UnitId, status: StatusKind, duration: u32) -> Self {
        Self {
            kind: EffectKind::Status,
            target_id,
            value: None,
            status_type: Some(status),
            duration: Some(duration),
            stat_type: None,
        }
    }
}

/// Visual cue the authority asks views to play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum AnimationCue {
    Attack,
    Skill,
    Movement,
    Damage,
    Heal,
    Death,
    Effect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSize {
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")
)]
pub enum CombatEventKind {
    CombatStarted {
        participants: Vec<UnitId>,
        grid_size: GridSize,
        initial_positions: BTreeMap<UnitId, Position3D>,
    },
    TurnStarted {
        unit_id: UnitId,
        /// Action types offered to the unit this turn.
        available_actions: Vec<ActionType>,
        /// Seconds left on the battle clock, when one is configured.
        time_limit: Option<u64>,
    },
    ActionResolved {
        source_id: UnitId,
        target_ids: Vec<UnitId>,
        skill_id: Option<String>,
        action_type: ActionType,
        success: bool,
        effects: Vec<ActionEffect>,
    },
    DamageApplied {
        target_id: UnitId,
        source_id: UnitId,
        damage: i32,
        damage_type: DamageType,
        hp_before: i32,
        hp_after: i32,
        was_critical: bool,
        was_blocked: bool,
        element: Option<Element>,
    },
    HealingApplied {
        target_id: UnitId,
        source_id: UnitId,
        healing: i32,
        hp_before: i32,
        hp_after: i32,
        mp_before: Option<i32>,
        mp_after: Option<i32>,
    },
    UnitMoved {
        unit_id: UnitId,
        from: Position3D,
        to: Position3D,
        path: Vec<Position3D>,
        movement_cost: u32,
    },
    StatusApplied {
        target_id: UnitId,
        source_id: UnitId,
        status_type: StatusKind,
        duration: u32,
        intensity: i32,
        stackable: bool,
    },
    StatusRemoved {
        target_id: UnitId,
        status_type: StatusKind,
        reason: StatusRemovalReason,
    },
    SkillUsed {
        source_id: UnitId,
        skill_id: String,
        target_positions: Vec<Position3D>,
        mp_cost: i32,
        cast_time: u32,
        interrupted: bool,
    },
    UnitDefeated {
        unit_id: UnitId,
        killer_id: Option<UnitId>,
        revivable: bool,
        experience_gained: BTreeMap<UnitId, u32>,
        items_dropped: Vec<String>,
    },
    CombatEnded {
        winner_id: Option<TeamId>,
        reason: CombatEndReason,
        rewards: BattleRewards,
        battle_stats: BattleStatistics,
    },
    TerrainChanged {
        position: Position3D,
        old_type: TerrainKind,
        new_type: TerrainKind,
        source_id: Option<UnitId>,
        duration: Option<u32>,
    },
    AnimationRequest {
        animation_type: AnimationCue,
        source_id: Option<UnitId>,
        target_id: Option<UnitId>,
        position: Option<Position3D>,
        duration: u64,
        parameters: BTreeMap<String, f32>,
    },
}

impl CombatEventKind {
    /// Wire names of every event type, as found in the `type` field.
    pub const TYPES: [&'static str; 13] = [
        "combat_started",
        "turn_started",
        "action_resolved",
        "damage_applied",
        "healing_applied",
        "unit_moved",
        "status_applied",
        "status_removed",
        "skill_used",
        "unit_defeated",
        "combat_ended",
        "terrain_changed",
        "animation_request",
    ];

    pub fn is_known_type(event_type: &str) -> bool {
        Self::TYPES.contains(&event_type)
    }

    pub fn event_type(&self) -> &'static str {
        let index = match self {
            Self::CombatStarted { .. } => 0,
            Self::TurnStarted { .. } => 1,
            Self::ActionResolved { .. } => 2,
            Self::DamageApplied { .. } => 3,
            Self::HealingApplied { .. } => 4,
            Self::UnitMoved { .. } => 5,
            Self::StatusApplied { .. } => 6,
            Self::StatusRemoved { .. } => 7,
            Self::SkillUsed { .. } => 8,
            Self::UnitDefeated { .. } => 9,
            Self::CombatEnded { .. } => 10,
            Self::TerrainChanged { .. } => 11,
            Self::AnimationRequest { .. } => 12,
        };
        Self::TYPES[index]
    }

    /// Unit the event is primarily about, if any.
    pub fn subject(&self) -> Option<&UnitId> {
        match self {
            Self::TurnStarted { unit_id, .. }
            | Self::UnitMoved { unit_id, .. }
            | Self::UnitDefeated { unit_id, .. } => Some(unit_id),
            Self::ActionResolved { source_id, .. } | Self::SkillUsed { source_id, .. } => {
                Some(source_id)
            }
            Self::DamageApplied { target_id, .. }
            | Self::HealingApplied { target_id, .. }
            | Self::StatusApplied { target_id, .. }
            | Self::StatusRemoved { target_id, .. } => Some(target_id),
            Self::AnimationRequest { source_id, .. } => source_id.as_ref(),
            Self::CombatStarted { .. } | Self::CombatEnded { .. } | Self::TerrainChanged { .. } => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_names_match_table() {
        let kind = CombatEventKind::StatusRemoved {
            target_id: UnitId::from("u1"),
            status_type: StatusKind::Poison,
            reason: StatusRemovalReason::Expired,
        };
        assert_eq!(kind.event_type(), "status_removed");
        assert!(CombatEventKind::is_known_type("animation_request"));
        assert!(!CombatEventKind::is_known_type("CombatCommencé"));
    }

    #[test]
    fn test_subject() {
        let kind = CombatEventKind::DamageApplied {
            target_id: UnitId::from("target"),
            source_id: UnitId::from("source"),
            damage: 5,
            damage_type: DamageType::Physical,
            hp_before: 10,
            hp_after: 5,
            was_critical: false,
            was_blocked: false,
            element: None,
        };
        assert_eq!(kind.subject(), Some(&UnitId::from("target")));
    }
}
