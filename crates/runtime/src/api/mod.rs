//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on orchestration and adapters.

pub mod errors;
pub mod providers;

pub use errors::{ProviderKind, Result, RuntimeError, SnapshotError, TransportError, ViewError};
pub use providers::{ActionProvider, AdvanceAndStrikeProvider, WaitActionProvider};
