//! Topic-based event bus for view events.
//!
//! Combat events, animation completions and camera changes are published to
//! separate topics, and consumers subscribe only to the topics they need.

mod bus;

pub use bus::{Event, EventBus, Topic};
