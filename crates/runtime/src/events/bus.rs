//! Topic-based event bus implementation.

use std::collections::HashMap;

use battle_core::CombatEvent;
use scene::{AnimationCompleted, CameraState, ChainCompleted};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Combat events as the view consumed them
    Combat,
    /// Animation and chain completions
    Animation,
    /// Camera state changes
    Camera,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Combat, Topic::Animation, Topic::Camera];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone)]
pub enum Event {
    Combat(CombatEvent),
    AnimationCompleted(AnimationCompleted),
    ChainCompleted(ChainCompleted),
    Camera(CameraState),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Combat(_) => Topic::Combat,
            Event::AnimationCompleted(_) | Event::ChainCompleted(_) => Topic::Animation,
            Event::Camera(_) => Topic::Camera,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Clones share the same channels.
#[derive(Clone)]
pub struct EventBus {
    combat: broadcast::Sender<Event>,
    animation: broadcast::Sender<Event>,
    camera: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            combat: broadcast::channel(capacity).0,
            animation: broadcast::channel(capacity).0,
            camera: broadcast::channel(capacity).0,
        }
    }

    fn channel(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Combat => &self.combat,
            Topic::Animation => &self.animation,
            Topic::Camera => &self.camera,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channel(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channel(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channel(topic).receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::{ChainId, ChainMode};

    fn chain_done() -> Event {
        Event::ChainCompleted(ChainCompleted {
            id: ChainId(1),
            mode: ChainMode::Sequence,
            success: true,
        })
    }

    #[test]
    fn test_subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut animation = bus.subscribe(Topic::Animation);
        let mut camera = bus.subscribe(Topic::Camera);

        bus.publish(chain_done());

        assert!(matches!(animation.try_recv(), Ok(Event::ChainCompleted(_))));
        assert!(camera.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(chain_done());
        assert_eq!(bus.subscriber_count(Topic::Animation), 0);
    }

    #[test]
    fn test_clones_share_channels() {
        let bus = EventBus::new();
        let clone = bus.clone();
        let receivers = bus.subscribe_multiple(&Topic::ALL);
        assert_eq!(receivers.len(), 3);
        assert_eq!(clone.subscriber_count(Topic::Combat), 1);
    }
}
