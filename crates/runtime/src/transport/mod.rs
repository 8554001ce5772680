//! JSON transport adapter.
//!
//! Inbound messages are flat combat event records:
//! `{"type", "combatId", "timestamp", "turnNumber", "sequence", ...payload}`.
//! The base fields are validated before the payload is decoded, so a message
//! of an unknown type can still be acknowledged and skipped.
mod inbox;

use battle_core::{CombatEvent, CombatEventKind, SubmittedAction};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::TransportError;

pub use inbox::EventInbox;

/// Result of decoding one inbound message.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Event(CombatEvent),
    /// Well-formed message of a type this build does not know.
    Ignored { event_type: String, sequence: u64 },
}

/// Outbound message carrying a unit's chosen action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
    pub combat_id: String,
    pub action: SubmittedAction,
}

pub fn decode_event(raw: &str) -> Result<Inbound, TransportError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| TransportError::Malformed(err.to_string()))?;
    let Value::Object(fields) = &value else {
        return Err(TransportError::Malformed("expected a JSON object".to_owned()));
    };

    let event_type = require_str(fields, "type")?.to_owned();
    require_str(fields, "combatId")?;
    require_u64(fields, "timestamp")?;
    let turn_number = require_u64(fields, "turnNumber")?;
    if u32::try_from(turn_number).is_err() {
        return Err(TransportError::InvalidField {
            field: "turnNumber",
            expected: "a 32-bit turn number",
        });
    }
    let sequence = require_u64(fields, "sequence")?;
    if sequence == u64::MAX {
        return Err(TransportError::InvalidField {
            field: "sequence",
            expected: "a sequence below u64::MAX",
        });
    }

    if !CombatEventKind::is_known_type(&event_type) {
        return Ok(Inbound::Ignored {
            event_type,
            sequence,
        });
    }

    serde_json::from_value(value)
        .map(Inbound::Event)
        .map_err(|err| TransportError::Malformed(format!("{event_type}: {err}")))
}

pub fn encode_event(event: &CombatEvent) -> Result<String, TransportError> {
    serde_json::to_string(event).map_err(|err| TransportError::Encode(err.to_string()))
}

pub fn encode_action(combat_id: &str, action: &SubmittedAction) -> Result<String, TransportError> {
    let message = ActionMessage {
        combat_id: combat_id.to_owned(),
        action: action.clone(),
    };
    serde_json::to_string(&message).map_err(|err| TransportError::Encode(err.to_string()))
}

fn require_str<'a>(fields: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, TransportError> {
    fields
        .get(field)
        .ok_or(TransportError::MissingField(field))?
        .as_str()
        .ok_or(TransportError::InvalidField {
            field,
            expected: "a string",
        })
}

fn require_u64(fields: &Map<String, Value>, field: &'static str) -> Result<u64, TransportError> {
    fields
        .get(field)
        .ok_or(TransportError::MissingField(field))?
        .as_u64()
        .ok_or(TransportError::InvalidField {
            field,
            expected: "an unsigned integer",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::{EventHeader, Position3D, UnitId};

    fn moved(sequence: u64) -> CombatEvent {
        CombatEvent::new(
            EventHeader {
                combat_id: "b1".into(),
                timestamp: 1_000,
                turn_number: 2,
                sequence,
            },
            CombatEventKind::UnitMoved {
                unit_id: UnitId::from("knight"),
                from: Position3D::new(1, 1, 0),
                to: Position3D::new(2, 1, 0),
                path: vec![Position3D::new(2, 1, 0)],
                movement_cost: 1,
            },
        )
    }

    #[test]
    fn test_encoded_event_decodes_to_itself() {
        let event = moved(7);
        let raw = encode_event(&event).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["type"], "unit_moved");
        assert_eq!(value["combatId"], "b1");
        assert_eq!(value["turnNumber"], 2);

        assert_eq!(decode_event(&raw).unwrap(), Inbound::Event(event));
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let raw = r#"{"type":"weather_report","combatId":"b1","timestamp":5,"turnNumber":1,"sequence":3,"rain":true}"#;
        assert_eq!(
            decode_event(raw).unwrap(),
            Inbound::Ignored {
                event_type: "weather_report".into(),
                sequence: 3
            }
        );
    }

    #[test]
    fn test_base_fields_are_validated() {
        assert!(matches!(decode_event("not json"), Err(TransportError::Malformed(_))));
        assert!(matches!(decode_event("[1, 2]"), Err(TransportError::Malformed(_))));
        assert_eq!(
            decode_event(r#"{"type":"unit_moved","timestamp":1,"turnNumber":1,"sequence":1}"#),
            Err(TransportError::MissingField("combatId"))
        );
        assert!(matches!(
            decode_event(r#"{"type":"unit_moved","combatId":"b1","timestamp":-4,"turnNumber":1,"sequence":1}"#),
            Err(TransportError::InvalidField { field: "timestamp", .. })
        ));
    }

    #[test]
    fn test_exhausted_sequence_is_rejected() {
        let raw = format!(
            r#"{{"type":"status_removed","combatId":"b1","timestamp":1,"turnNumber":1,"sequence":{}}}"#,
            u64::MAX
        );
        assert_eq!(
            decode_event(&raw),
            Err(TransportError::InvalidField {
                field: "sequence",
                expected: "a sequence below u64::MAX",
            })
        );

        let mut last = moved(u64::MAX - 1);
        last.header.timestamp = u64::MAX;
        let raw = encode_event(&last).unwrap();
        assert_eq!(decode_event(&raw).unwrap(), Inbound::Event(last));
    }

    #[test]
    fn test_known_type_with_bad_payload_is_malformed() {
        let raw = r#"{"type":"unit_moved","combatId":"b1","timestamp":1,"turnNumber":1,"sequence":1,"unitId":"x"}"#;
        assert!(matches!(decode_event(raw), Err(TransportError::Malformed(_))));
    }

    #[test]
    fn test_encode_action() {
        let action = SubmittedAction::attack("knight", Position3D::new(3, 3, 0));
        let raw = encode_action("b1", &action).unwrap();
        let message: ActionMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(message.combat_id, "b1");
        assert_eq!(message.action, action);
    }
}
