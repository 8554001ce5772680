//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the battle engine, the scene components, the transport
//! adapter and snapshot persistence so clients can bubble them up with
//! consistent context. Every error classifies itself through [`CoreError`].
use std::fmt;

use battle_core::{ActionError, CoreError, ErrorSeverity, UnitId};
use scene::PoolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{kind} action provider not set")]
    ProviderNotSet { kind: ProviderKind },

    #[error("battle has no active unit")]
    NoActiveUnit,

    /// Remote events were offered to a runtime that owns the authoritative engine.
    #[error("remote events are only accepted in mirror mode")]
    NotMirroring,

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl CoreError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::ProviderNotSet { .. } => ErrorSeverity::Fatal,
            RuntimeError::NoActiveUnit => ErrorSeverity::Internal,
            RuntimeError::NotMirroring => ErrorSeverity::Validation,
            RuntimeError::Action(err) => err.severity(),
            RuntimeError::View(err) => err.severity(),
            RuntimeError::Transport(err) => err.severity(),
            RuntimeError::Snapshot(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::ProviderNotSet { .. } => "RUNTIME_PROVIDER_NOT_SET",
            RuntimeError::NoActiveUnit => "RUNTIME_NO_ACTIVE_UNIT",
            RuntimeError::NotMirroring => "RUNTIME_NOT_MIRRORING",
            RuntimeError::Action(err) => err.error_code(),
            RuntimeError::View(err) => err.error_code(),
            RuntimeError::Transport(err) => err.error_code(),
            RuntimeError::Snapshot(err) => err.error_code(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    Player,
    Npc,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderKind::Player => "player",
            ProviderKind::Npc => "npc",
        };
        write!(f, "{}", label)
    }
}

/// Combat view failures. Back-pressure from a full pool is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("combat view is not initialized")]
    NotInitialized,

    #[error("combat view failed to initialize")]
    Initialization(#[source] PoolError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("event refers to unknown unit {0}")]
    UnknownUnit(UnitId),
}

impl CoreError for ViewError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            ViewError::NotInitialized => ErrorSeverity::Recoverable,
            ViewError::Initialization(_) => ErrorSeverity::Fatal,
            ViewError::Pool(err) => err.severity(),
            ViewError::UnknownUnit(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ViewError::NotInitialized => "VIEW_NOT_INITIALIZED",
            ViewError::Initialization(_) => "VIEW_INITIALIZATION",
            ViewError::Pool(err) => err.error_code(),
            ViewError::UnknownUnit(_) => "VIEW_UNKNOWN_UNIT",
        }
    }
}

/// Why an inbound message was not delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("message is missing field '{0}'")]
    MissingField(&'static str),

    #[error("message field '{field}' is invalid: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("message belongs to combat {found}, expected {expected}")]
    WrongCombat { expected: String, found: String },

    #[error("duplicate event sequence {0}")]
    Duplicate(u64),

    #[error("stale event sequence {sequence}, already delivered up to {delivered}")]
    Stale { sequence: u64, delivered: u64 },

    #[error("failed to encode message: {0}")]
    Encode(String),
}

impl CoreError for TransportError {
    fn severity(&self) -> ErrorSeverity {
        use TransportError::*;
        match self {
            Malformed(_) | MissingField(_) | InvalidField { .. } | WrongCombat { .. } => {
                ErrorSeverity::Validation
            }
            Duplicate(_) | Stale { .. } => ErrorSeverity::Recoverable,
            Encode(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        use TransportError::*;
        match self {
            Malformed(_) => "TRANSPORT_MALFORMED",
            MissingField(_) => "TRANSPORT_MISSING_FIELD",
            InvalidField { .. } => "TRANSPORT_INVALID_FIELD",
            WrongCombat { .. } => "TRANSPORT_WRONG_COMBAT",
            Duplicate(_) => "TRANSPORT_DUPLICATE",
            Stale { .. } => "TRANSPORT_STALE",
            Encode(_) => "TRANSPORT_ENCODE",
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },
}

impl CoreError for SnapshotError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            SnapshotError::Io(_) => ErrorSeverity::Recoverable,
            SnapshotError::Json(_) | SnapshotError::Version { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SnapshotError::Io(_) => "SNAPSHOT_IO",
            SnapshotError::Json(_) => "SNAPSHOT_JSON",
            SnapshotError::Version { .. } => "SNAPSHOT_VERSION",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_delegates_classification() {
        let err = RuntimeError::from(ActionError::OutOfRange);
        assert_eq!(err.error_code(), "ACTION_OUT_OF_RANGE");
        assert_eq!(err.severity(), ErrorSeverity::Validation);

        let err = RuntimeError::ProviderNotSet {
            kind: ProviderKind::Npc,
        };
        assert_eq!(err.to_string(), "npc action provider not set");
    }

    #[test]
    fn test_transport_codes() {
        let err = TransportError::Stale {
            sequence: 3,
            delivered: 7,
        };
        assert!(err.severity().is_recoverable());
        assert_eq!(err.error_code(), "TRANSPORT_STALE");
        assert_eq!(TransportError::MissingField("type").to_string(), "message is missing field 'type'");
    }
}
