//! Control message vocabulary spoken on every control channel.
//!
//! Records are JSON objects with a `type` discriminator. Decoding happens
//! once at the channel boundary; everything past it works with
//! `ControlMessage`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

pub const IDENTITY: &str = "identity";
pub const TALK_START: &str = "talk-start";
pub const TALK_STOP: &str = "talk-stop";
pub const NAME_CHANGE: &str = "name-change";

const KNOWN_TYPES: [&str; 4] = [IDENTITY, TALK_START, TALK_STOP, NAME_CHANGE];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// Announce the sender's display name.
    Identity { name: String },
    TalkStart { name: String },
    TalkStop { name: String },
    #[serde(rename_all = "camelCase")]
    NameChange { old_name: String, new_name: String },
}

impl ControlMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::Identity { .. } => IDENTITY,
            ControlMessage::TalkStart { .. } => TALK_START,
            ControlMessage::TalkStop { .. } => TALK_STOP,
            ControlMessage::NameChange { .. } => NAME_CHANGE,
        }
    }
}

/// Outcome of decoding a well-formed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Message(ControlMessage),
    /// A record with a `type` this side does not speak; ignored.
    Unknown(String),
}

pub fn decode(record: &Value) -> Result<Decoded, ProtocolError> {
    let object = record.as_object().ok_or(ProtocolError::NotAnObject)?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;

    if !KNOWN_TYPES.contains(&kind) {
        return Ok(Decoded::Unknown(kind.to_string()));
    }

    serde_json::from_value(record.clone())
        .map(Decoded::Message)
        .map_err(|source| ProtocolError::InvalidFields {
            kind: kind.to_string(),
            source,
        })
}

pub fn encode(message: &ControlMessage) -> Result<Value, ProtocolError> {
    Ok(serde_json::to_value(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_wire_names() {
        let value = encode(&ControlMessage::NameChange {
            old_name: "Ana".into(),
            new_name: "Bea".into(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"type": "name-change", "oldName": "Ana", "newName": "Bea"})
        );

        let value = encode(&ControlMessage::TalkStart { name: "Ana".into() }).unwrap();
        assert_eq!(value, json!({"type": "talk-start", "name": "Ana"}));
    }

    #[test]
    fn decodes_identity() {
        let decoded = decode(&json!({"type": "identity", "name": "Carlos"})).unwrap();
        assert_eq!(
            decoded,
            Decoded::Message(ControlMessage::Identity {
                name: "Carlos".into()
            })
        );
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let decoded = decode(&json!({"type": "talk-stop", "name": "A", "ts": 12})).unwrap();
        assert_eq!(
            decoded,
            Decoded::Message(ControlMessage::TalkStop { name: "A".into() })
        );
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let decoded = decode(&json!({"type": "emoji", "glyph": ":)"})).unwrap();
        assert_eq!(decoded, Decoded::Unknown("emoji".into()));
    }

    #[test]
    fn malformed_records() {
        assert!(matches!(
            decode(&json!("talk-start")),
            Err(ProtocolError::NotAnObject)
        ));
        assert!(matches!(
            decode(&json!({"name": "A"})),
            Err(ProtocolError::MissingType)
        ));
        assert!(matches!(
            decode(&json!({"type": 7})),
            Err(ProtocolError::MissingType)
        ));

        let err = decode(&json!({"type": "name-change", "newName": "B"})).unwrap_err();
        match err {
            ProtocolError::InvalidFields { kind, .. } => assert_eq!(kind, "name-change"),
            other => panic!("unexpected error {other:?}"),
        }

        assert!(matches!(
            decode(&json!({"type": "identity", "name": 3})),
            Err(ProtocolError::InvalidFields { .. })
        ));
    }

    #[test]
    fn kind_matches_wire_tag() {
        let msg = ControlMessage::TalkStop { name: "x".into() };
        assert_eq!(encode(&msg).unwrap()["type"], msg.kind());
    }
}
