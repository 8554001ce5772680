use std::collections::{BTreeMap, BTreeSet};

use battle_core::CombatEvent;
use tracing::{debug, warn};

use super::{Inbound, decode_event};
use crate::api::TransportError;

/// Reorders inbound events and drops repeats.
///
/// Events are buffered until [`EventInbox::drain`], which hands them out in
/// `(timestamp, sequence)` order. A sequence already buffered is a duplicate;
/// one at or below the last drained sequence is stale.
#[derive(Debug, Default)]
pub struct EventInbox {
    combat_id: Option<String>,
    pending: BTreeMap<(u64, u64), CombatEvent>,
    sequences: BTreeSet<u64>,
    delivered: Option<u64>,
}

impl EventInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inbox that rejects events of any other combat.
    pub fn for_combat(combat_id: impl Into<String>) -> Self {
        Self {
            combat_id: Some(combat_id.into()),
            ..Self::default()
        }
    }

    pub fn push(&mut self, event: CombatEvent) -> Result<(), TransportError> {
        if let Some(expected) = &self.combat_id
            && *expected != event.header.combat_id
        {
            return Err(TransportError::WrongCombat {
                expected: expected.clone(),
                found: event.header.combat_id.clone(),
            });
        }

        let sequence = event.sequence();
        if let Some(delivered) = self.delivered
            && sequence <= delivered
        {
            return Err(TransportError::Stale {
                sequence,
                delivered,
            });
        }
        if !self.sequences.insert(sequence) {
            return Err(TransportError::Duplicate(sequence));
        }

        self.pending.insert(event.header.order_key(), event);
        Ok(())
    }

    /// Decodes and buffers one raw message.
    ///
    /// Returns `Ok(false)` for a message of unknown type, which is skipped.
    /// Anything undeliverable is logged and returned as an error.
    pub fn receive(&mut self, raw: &str) -> Result<bool, TransportError> {
        let result = decode_event(raw).and_then(|inbound| match inbound {
            Inbound::Event(event) => self.push(event).map(|()| true),
            Inbound::Ignored {
                event_type,
                sequence,
            } => {
                debug!(event_type = %event_type, sequence, "ignoring unknown event type");
                Ok(false)
            }
        });
        if let Err(err) = &result {
            warn!(error = %err, "discarding inbound message");
        }
        result
    }

    /// Buffered events in total order.
    pub fn drain(&mut self) -> Vec<CombatEvent> {
        let events: Vec<CombatEvent> = std::mem::take(&mut self.pending).into_values().collect();
        if let Some(last) = events.iter().map(CombatEvent::sequence).max() {
            self.delivered = Some(self.delivered.map_or(last, |delivered| delivered.max(last)));
        }
        self.sequences.clear();
        events
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Highest sequence handed out by [`EventInbox::drain`].
    pub fn last_delivered(&self) -> Option<u64> {
        self.delivered
    }
}
