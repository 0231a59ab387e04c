use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::ConnectionStatus;
use crate::types::MessageKind;

/// Signals emitted by the transport and router toward the presentation layer.
///
/// The engine never touches a rendering surface directly. Everything the
/// surface needs to know arrives as one of these events on a single channel,
/// in the order the engine produced them.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum UiEvent {
    /// The session transport moved to a new lifecycle state.
    ConnectionStatusChanged { status: ConnectionStatus },

    /// A complete message should be added to the conversation.
    NewMessage {
        kind: MessageKind,
        content: String,
        id: String,
        /// Content is pre-rendered HTML and must not be escaped or revealed.
        is_html: bool,
        /// Show the full content immediately instead of revealing it.
        skip_reveal: bool,
    },

    /// A streaming message's accumulated content grew or finished.
    UpdateMessage {
        id: String,
        content: String,
        is_complete: bool,
        is_html: bool,
    },

    /// The backend asked for user identification details.
    ShowUserForm,

    /// A loading indicator should be shown while a reply is pending.
    ShowLoader,

    /// Any pending loading indicator should be dismissed.
    HideLoader,

    /// The backend started composing a response.
    ThinkingStarted,

    /// The backend finished composing and content follows.
    ThinkingComplete,
}

impl UiEvent {
    /// Stable snake_case name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            UiEvent::ConnectionStatusChanged { .. } => "connection_status_changed",
            UiEvent::NewMessage { .. } => "new_message",
            UiEvent::UpdateMessage { .. } => "update_message",
            UiEvent::ShowUserForm => "show_user_form",
            UiEvent::ShowLoader => "show_loader",
            UiEvent::HideLoader => "hide_loader",
            UiEvent::ThinkingStarted => "thinking_started",
            UiEvent::ThinkingComplete => "thinking_complete",
        }
    }
}

/// Generates a message identifier unique within a session.
///
/// Combines the current epoch milliseconds with a short random suffix so ids
/// sort roughly by creation time while staying collision-free under bursts.
pub fn message_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("message-{}-{}", millis, &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let event = UiEvent::ConnectionStatusChanged {
            status: ConnectionStatus::Connected,
        };
        assert_eq!(event.event_name(), "connection_status_changed");

        let event = UiEvent::NewMessage {
            kind: MessageKind::Assistant,
            content: "hello".to_string(),
            id: message_id(),
            is_html: false,
            skip_reveal: false,
        };
        assert_eq!(event.event_name(), "new_message");

        assert_eq!(UiEvent::ShowUserForm.event_name(), "show_user_form");
        assert_eq!(UiEvent::ShowLoader.event_name(), "show_loader");
        assert_eq!(UiEvent::HideLoader.event_name(), "hide_loader");
        assert_eq!(UiEvent::ThinkingStarted.event_name(), "thinking_started");
        assert_eq!(UiEvent::ThinkingComplete.event_name(), "thinking_complete");
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = UiEvent::UpdateMessage {
            id: "message-1-abc".to_string(),
            content: "partial text".to_string(),
            is_complete: false,
            is_html: false,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: UiEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_name(), "update_message");
    }

    #[test]
    fn test_message_id_format() {
        let id = message_id();
        assert!(id.starts_with("message-"));
        let parts: Vec<&str> = id.splitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 8);
    }

    #[test]
    fn test_message_id_uniqueness() {
        let a = message_id();
        let b = message_id();
        assert_ne!(a, b);
    }
}
