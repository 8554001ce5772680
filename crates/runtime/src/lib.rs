//! Runtime orchestration for isometric tactical battles.
//!
//! This crate wires the battle engine to the scene components: it sources
//! actions from providers, presents the resulting combat events through the
//! [`CombatView`], and persists or mirrors battles. Consumers embed
//! [`Runtime`] and drive it with their own clock.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`view`] turns combat events into animations, sprites and camera moves
//! - [`api`] exposes the error and provider types downstream clients use
//! - [`events`] provides the topic-based event bus
//! - [`transport`] decodes and orders combat events received as JSON
//! - [`snapshot`] saves and restores battles
pub mod api;
pub mod config;
pub mod events;
pub mod runtime;
pub mod snapshot;
pub mod transport;
pub mod view;

pub use api::{
    ActionProvider, AdvanceAndStrikeProvider, ProviderKind, Result, RuntimeError, SnapshotError,
    TransportError, ViewError, WaitActionProvider,
};
pub use config::{RuntimeConfig, ViewConfig};
pub use events::{Event, EventBus, Topic};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeMode, StepOutcome};
pub use snapshot::{BattleSnapshot, snapshot_dir};
pub use transport::{ActionMessage, EventInbox, Inbound, decode_event, encode_action, encode_event};
pub use view::{CombatView, TickSummary, UnitView, ViewStats};
