use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Typed outbound envelopes.
///
/// The session identifier is not part of the variants. It is attached at
/// encode time by [`encode_with_session`], so callers build envelopes without
/// threading session state through every call site.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEnvelope {
    /// Plain user text.
    ChatMessage { message: String },

    /// User text with an attached image reference.
    ImageMessage {
        message: String,
        #[serde(rename = "imageUrl")]
        image_url: String,
    },

    /// Completed identification form.
    UserDetailsSubmit { data: Map<String, Value> },

    /// The user dismissed the identification form without submitting.
    UserDetailsCancelled,

    /// A boolean preference toggle.
    SetPreference { preference: String, enabled: bool },

    /// Periodic liveness signal.
    Heartbeat,
}

#[derive(Serialize)]
struct Tagged<'a> {
    #[serde(flatten)]
    body: &'a ClientEnvelope,
    #[serde(rename = "sessionId")]
    session_id: Option<&'a str>,
}

/// Encode an outbound envelope with the current session identifier attached.
///
/// Before the handshake completes the session id is `None` and serializes as
/// an explicit `"sessionId": null`, which servers treat as an anonymous frame.
pub fn encode_with_session(
    envelope: &ClientEnvelope,
    session_id: Option<&str>,
) -> Result<String, ProtocolError> {
    let tagged = Tagged {
        body: envelope,
        session_id,
    };
    serde_json::to_string(&tagged).map_err(|e| ProtocolError::Encode(e.to_string()))
}
