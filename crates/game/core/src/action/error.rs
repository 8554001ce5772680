//! Action rejection reasons.

use crate::error::{CoreError, ErrorSeverity};
use crate::state::{BattlePhase, UnitId};

/// Why a submitted action was rejected. Rejection never mutates the battle.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionError {
    /// The operation is not allowed in the current phase.
    #[error("not allowed during {0} phase")]
    WrongPhase(BattlePhase),

    #[error("unit {0} not found")]
    UnitNotFound(UnitId),

    /// The submitter is not the active unit.
    #[error("it is not {0}'s turn")]
    NotActiveUnit(UnitId),

    #[error("unit {0} has been defeated")]
    ActorDefeated(UnitId),

    /// Sleep or stun.
    #[error("unit {0} cannot act")]
    ActorIncapacitated(UnitId),

    #[error("action requires a target")]
    MissingTarget,

    #[error("target is outside the battlefield")]
    OutOfBounds,

    #[error("target is out of range")]
    OutOfRange,

    #[error("no valid unit at target")]
    InvalidTarget,

    #[error("target has been defeated")]
    TargetDefeated,

    #[error("cell is occupied")]
    Occupied,

    #[error("cell is impassable")]
    Impassable,

    #[error("unknown skill {0}")]
    UnknownSkill(String),

    #[error("unknown or unusable item {0}")]
    UnknownItem(String),

    #[error("not enough MP: need {required}, have {available}")]
    InsufficientMp { required: i32, available: i32 },

    #[error("skill {0} is on cooldown")]
    OnCooldown(String),

    #[error("unit is silenced")]
    Silenced,
}

impl CoreError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        use ActionError::*;
        match self {
            WrongPhase(_) | NotActiveUnit(_) => ErrorSeverity::Recoverable,
            UnitNotFound(_) | MissingTarget | OutOfBounds => ErrorSeverity::Validation,
            ActorDefeated(_) | ActorIncapacitated(_) => ErrorSeverity::Recoverable,
            OutOfRange | InvalidTarget | TargetDefeated => ErrorSeverity::Validation,
            Occupied | Impassable => ErrorSeverity::Recoverable,
            UnknownSkill(_) | UnknownItem(_) => ErrorSeverity::Validation,
            InsufficientMp { .. } | OnCooldown(_) | Silenced => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use ActionError::*;
        match self {
            WrongPhase(_) => "ACTION_WRONG_PHASE",
            UnitNotFound(_) => "ACTION_UNIT_NOT_FOUND",
            NotActiveUnit(_) => "ACTION_NOT_ACTIVE_UNIT",
            ActorDefeated(_) => "ACTION_ACTOR_DEFEATED",
            ActorIncapacitated(_) => "ACTION_ACTOR_INCAPACITATED",
            MissingTarget => "ACTION_MISSING_TARGET",
            OutOfBounds => "ACTION_OUT_OF_BOUNDS",
            OutOfRange => "ACTION_OUT_OF_RANGE",
            InvalidTarget => "ACTION_INVALID_TARGET",
            TargetDefeated => "ACTION_TARGET_DEFEATED",
            Occupied => "ACTION_OCCUPIED",
            Impassable => "ACTION_IMPASSABLE",
            UnknownSkill(_) => "ACTION_UNKNOWN_SKILL",
            UnknownItem(_) => "ACTION_UNKNOWN_ITEM",
            InsufficientMp { .. } => "ACTION_INSUFFICIENT_MP",
            OnCooldown(_) => "ACTION_ON_COOLDOWN",
            Silenced => "ACTION_SILENCED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_severity() {
        let err = ActionError::OutOfRange;
        assert_eq!(err.error_code(), "ACTION_OUT_OF_RANGE");
        assert_eq!(err.severity(), ErrorSeverity::Validation);

        let err = ActionError::InsufficientMp {
            required: 10,
            available: 3,
        };
        assert!(err.severity().is_recoverable());
        assert_eq!(err.to_string(), "not enough MP: need 10, have 3");
    }
}
