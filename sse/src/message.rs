use crate::error::Error;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Tag identifying a broadcast event on the wire (the JSON `type` field).
///
/// The poster events are named explicitly; any other tag a trigger caller
/// sends is carried through untouched as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    Connected,
    PosterLaunched,
    PosterReset,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Connected => "CONNECTED",
            EventType::PosterLaunched => "POSTER_LAUNCHED",
            EventType::PosterReset => "POSTER_RESET",
            EventType::Other(tag) => tag,
        }
    }
}

impl From<&str> for EventType {
    fn from(tag: &str) -> Self {
        match tag {
            "CONNECTED" => EventType::Connected,
            "POSTER_LAUNCHED" => EventType::PosterLaunched,
            "POSTER_RESET" => EventType::PosterReset,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single event pushed to every subscriber. Built, serialized once and
/// dropped per broadcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Message-specific fields, flattened next to `type`.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Message {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            fields: Map::new(),
        }
    }

    /// The handshake sent to a freshly opened stream so the client can learn
    /// its own connection id.
    pub fn connected(client_id: &str) -> Self {
        Self::new(EventType::Connected).with_field("clientId", Value::from(client_id))
    }

    /// Adds a message-specific field. `type` is reserved and ignored.
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        if key != "type" {
            self.fields.insert(key.to_string(), value);
        }
        self
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<EventType> for Message {
    fn from(event_type: EventType) -> Self {
        Message::new(event_type)
    }
}

/// Parses a trigger caller's event descriptor: a JSON object carrying at
/// least a non-blank string `type`. Every other field rides along.
impl TryFrom<Value> for Message {
    type Error = Error;

    fn try_from(descriptor: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = descriptor else {
            return Err(Error::malformed("event descriptor must be a JSON object"));
        };

        let tag = match fields.remove("type") {
            Some(Value::String(tag)) => tag,
            Some(_) => return Err(Error::malformed("`type` must be a string")),
            None => return Err(Error::malformed("missing `type` field")),
        };

        if tag.trim().is_empty() {
            return Err(Error::malformed("`type` must not be empty"));
        }

        Ok(Message {
            event_type: EventType::from(tag.as_str()),
            fields,
        })
    }
}
