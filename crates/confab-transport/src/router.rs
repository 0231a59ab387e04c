use tracing::{debug, warn};

use confab_core::events::message_id;
use confab_core::{MessageKind, UiEvent};
use confab_protocol::Envelope;

/// Delay before the booking-link follow-up message, so the confirmation text
/// lands first.
pub const BOOKING_LINK_DELAY_MS: u64 = 100;

const USER_DETAILS_FUNCTION: &str = "displayUserDetailsForm";
const DEFAULT_BOOKING_MESSAGE: &str = "Your booking is confirmed.";
const BOOKING_LINK_TEXT: &str = "Access your booking";

/// What the transport should do with one routed envelope.
#[derive(Clone, Debug)]
pub enum RouterAction {
    Emit(UiEvent),
    EmitAfter { delay_ms: u64, event: UiEvent },
}

/// Dispatch table from envelope kind to UI events.
///
/// The router is pure state-plus-input: it never touches the socket or any
/// timer itself. The only state it keeps is the thinking flag, which makes
/// repeated thinking notifications idempotent.
#[derive(Debug, Default)]
pub struct MessageRouter {
    thinking: bool,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_thinking(&self) -> bool {
        self.thinking
    }

    /// Route one decoded envelope into zero or more actions.
    pub fn route(&mut self, envelope: &Envelope) -> Vec<RouterAction> {
        match envelope.kind.as_deref() {
            Some("thinking_started") | Some("thinking_start") => {
                if self.thinking {
                    return Vec::new();
                }
                self.thinking = true;
                vec![RouterAction::Emit(UiEvent::ThinkingStarted)]
            }
            Some("thinking_complete") => self.clear_thinking(),
            Some("error") => {
                // Raw backend errors are never user-facing.
                warn!("Server error: {:?}", envelope.message_text());
                Vec::new()
            }
            Some("identification_request") => {
                // Reserved for a specialized prompt flow; not rendered.
                debug!("Identification requested: {:?}", envelope.text("requestedInfo"));
                Vec::new()
            }
            Some("chat_response") | None => self.assistant_message(envelope),
            Some("function_call") | Some("function_result") => {
                if envelope.text("name") == Some(USER_DETAILS_FUNCTION) {
                    vec![RouterAction::Emit(UiEvent::ShowUserForm)]
                } else {
                    debug!("Unhandled function: {:?}", envelope.text("name"));
                    Vec::new()
                }
            }
            Some("user_details_form") => vec![RouterAction::Emit(UiEvent::ShowUserForm)],
            Some("booking_confirmed") => self.booking_confirmed(envelope),
            Some(other) => {
                debug!("Unhandled message kind: {}", other);
                Vec::new()
            }
        }
    }

    fn clear_thinking(&mut self) -> Vec<RouterAction> {
        if !self.thinking {
            return Vec::new();
        }
        self.thinking = false;
        vec![RouterAction::Emit(UiEvent::ThinkingComplete)]
    }

    fn assistant_message(&mut self, envelope: &Envelope) -> Vec<RouterAction> {
        // Contentless envelopes are ignored outright; thinking state must
        // survive so a later thinking_complete still clears the indicator.
        let Some(content) = envelope.message_text() else {
            warn!("Assistant message with no content received");
            return Vec::new();
        };

        let mut actions = self.clear_thinking();
        actions.push(RouterAction::Emit(UiEvent::HideLoader));
        actions.push(RouterAction::Emit(UiEvent::NewMessage {
            kind: MessageKind::Assistant,
            content: content.to_string(),
            id: message_id(),
            is_html: false,
            skip_reveal: false,
        }));
        actions
    }

    fn booking_confirmed(&mut self, envelope: &Envelope) -> Vec<RouterAction> {
        // Same sequencing as assistant_message: thinking clears, then the
        // loader, then content.
        let mut actions = self.clear_thinking();
        actions.push(RouterAction::Emit(UiEvent::HideLoader));

        let message = envelope
            .message_text()
            .unwrap_or(DEFAULT_BOOKING_MESSAGE)
            .to_string();
        // Confirmation text appears immediately, not revealed.
        actions.push(RouterAction::Emit(UiEvent::NewMessage {
            kind: MessageKind::Assistant,
            content: message,
            id: message_id(),
            is_html: false,
            skip_reveal: true,
        }));

        if let Some(link) = envelope.text("bookingLink") {
            actions.push(RouterAction::EmitAfter {
                delay_ms: BOOKING_LINK_DELAY_MS,
                event: UiEvent::NewMessage {
                    kind: MessageKind::Assistant,
                    content: format!(
                        "<a href=\"{}\" target=\"_blank\" class=\"booking-link\">{}</a>",
                        link, BOOKING_LINK_TEXT
                    ),
                    id: message_id(),
                    is_html: true,
                    skip_reveal: true,
                },
            });
        }
        actions
    }
}
