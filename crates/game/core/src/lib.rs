//! Deterministic combat rules and isometric coordinate math.
//!
//! `battle-core` defines the canonical battle model (units, turn queue,
//! phases, combat events) and the pure coordinate engine used to place that
//! model on an isometric grid. All battle mutation flows through
//! [`engine::BattleEngine`]; rendering crates only read [`BattleState`] and
//! consume the [`CombatEvent`]s the engine emits.
pub mod action;
pub mod config;
pub mod coords;
pub mod engine;
pub mod error;
pub mod events;
pub mod state;

pub use action::{ActionError, ActionType, AvailableAction, SubmittedAction};
pub use config::{BattleConfig, IsoConfig, TerrainKind, TerrainTile, VictoryCondition};
pub use coords::{
    DepthKey, Direction, IsoCoords, IsoProjection, Neighborhood, Position3D, ScreenBounds,
};
pub use engine::{BattleEngine, Resolution};
pub use error::{CoreError, ErrorSeverity};
pub use events::{
    ActionEffect, AnimationCue, BattleRewards, BattleStatistics, CombatEndReason, CombatEvent,
    CombatEventKind, DamageType, EffectKind, EventHeader, EventSequencer, GridSize,
    StatusRemovalReason,
};
pub use state::{
    BattlePhase, BattleState, EffectTarget, Element, Equipment, Item, ItemType, Job, Rarity, Skill,
    SkillEffect, SkillEffectKind, SkillType, StatBonuses, Status, StatusKind, TeamId, Unit, UnitId,
    UnitStats,
};
