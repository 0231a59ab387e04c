use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// One decoded inbound frame.
///
/// Servers in the wild send envelopes with a missing `type`, extra fields,
/// or content under either a `message` or a `content` key. Decoding keeps
/// everything: the kind and session id are lifted out, the rest of the
/// object stays available through the payload map.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Decode a JSON text frame.
    ///
    /// Fails only when the frame is not a JSON object. Unknown kinds and
    /// absent fields decode fine.
    pub fn decode(text: &str) -> Result<Envelope, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    /// Non-empty string payload field, if present.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The envelope's displayable content, checking `message` then `content`.
    pub fn message_text(&self) -> Option<&str> {
        self.text("message").or_else(|| self.text("content"))
    }

    /// Whether the envelope carries the given kind.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }
}
