//! Common error infrastructure for battle-core.
//!
//! Domain-specific errors (e.g. [`crate::ActionError`]) live next to the
//! operations they validate and implement [`CoreError`] so callers can
//! classify a rejection without matching every variant.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the same submitter may retry with a different choice
/// - **Validation**: malformed input that should not be retried unchanged
/// - **Internal**: state inconsistency that indicates a bug
/// - **Fatal**: the battle cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Retry with an alternative action.
    ///
    /// Examples: target out of range, not enough MP
    Recoverable,

    /// Invalid input, should not retry without changes.
    ///
    /// Examples: unknown unit, target cell outside the grid
    Validation,

    /// Unexpected state inconsistency.
    Internal,

    /// Battle state cannot continue.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all battle-core errors.
///
/// `error_code` doubles as the rejection reason surfaced to whoever submitted
/// the failing request, so codes must stay stable once published.
pub trait CoreError: std::fmt::Display + std::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier for this error variant.
    fn error_code(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
