use super::{CombatEvent, CombatEventKind, EventHeader};

/// Stamps outgoing events with strictly increasing sequence numbers.
///
/// Timestamps are clamped so they never run backwards either, which keeps
/// `(timestamp, sequence)` consistent with emission order even if the caller's
/// clock jitters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSequencer {
    combat_id: String,
    next_sequence: u64,
    last_timestamp: u64,
}

impl EventSequencer {
    pub fn new(combat_id: impl Into<String>) -> Self {
        Self::resume(combat_id, 0, 0)
    }

    /// Continues a sequence after a snapshot restore.
    pub fn resume(combat_id: impl Into<String>, next_sequence: u64, last_timestamp: u64) -> Self {
        Self {
            combat_id: combat_id.into(),
            next_sequence,
            last_timestamp,
        }
    }

    pub fn combat_id(&self) -> &str {
        &self.combat_id
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    pub fn header(&mut self, now: u64, turn_number: u32) -> EventHeader {
        let timestamp = now.max(self.last_timestamp);
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        self.last_timestamp = timestamp;
        EventHeader {
            combat_id: self.combat_id.clone(),
            timestamp,
            turn_number,
            sequence,
        }
    }

    pub fn stamp(&mut self, now: u64, turn_number: u32, kind: CombatEventKind) -> CombatEvent {
        CombatEvent::new(self.header(now, turn_number), kind)
    }

    /// Keeps local numbering ahead of an externally produced event.
    pub fn observe(&mut self, header: &EventHeader) {
        self.next_sequence = self.next_sequence.max(header.sequence.saturating_add(1));
        self.last_timestamp = self.last_timestamp.max(header.timestamp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_strictly_increases() {
        let mut sequencer = EventSequencer::new("battle");
        let a = sequencer.header(100, 1);
        let b = sequencer.header(100, 1);
        let c = sequencer.header(90, 1);
        assert!(a.order_key() < b.order_key());
        assert!(b.order_key() < c.order_key());
        assert_eq!(c.timestamp, 100);
    }

    #[test]
    fn test_observe_moves_past_foreign_sequence() {
        let mut sequencer = EventSequencer::new("battle");
        sequencer.observe(&EventHeader {
            combat_id: "battle".into(),
            timestamp: 500,
            turn_number: 2,
            sequence: 41,
        });
        let next = sequencer.header(10, 2);
        assert_eq!(next.sequence, 42);
        assert_eq!(next.timestamp, 500);
    }
}
