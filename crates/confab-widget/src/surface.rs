use confab_core::{ConnectionStatus, MessageKind};

/// Presentation callbacks the embedding host implements.
///
/// The engine calls these from its event pump, already ordered; the host
/// only has to draw. Hosts that want incremental reveal also implement
/// [`confab_reveal::RevealSurface`] on the same type.
pub trait ChatSurface: Send {
    /// Add a message to the conversation.
    ///
    /// When `will_reveal` is true the content arrives incrementally through
    /// the reveal surface and `content` is the full text for reference;
    /// otherwise the message should be shown at once. `is_html` content is
    /// pre-rendered and must be inserted as markup, not escaped text.
    fn render_message(
        &mut self,
        kind: MessageKind,
        content: &str,
        id: &str,
        will_reveal: bool,
        is_html: bool,
    );

    /// Replace the accumulated content of a streaming message.
    fn update_streaming_content(&mut self, id: &str, content: &str, is_complete: bool, is_html: bool);

    fn show_loading_indicator(&mut self);
    fn hide_loading_indicator(&mut self);

    /// Present the user-identification form.
    fn show_form_surface(&mut self);

    fn show_thinking_indicator(&mut self);
    fn hide_thinking_indicator(&mut self);

    /// The session moved to a new connection state.
    fn connection_status_changed(&mut self, status: ConnectionStatus);
}
