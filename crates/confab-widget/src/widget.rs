use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use confab_core::config::RevealConfig;
use confab_core::events::message_id;
use confab_core::{ConnectionStatus, MessageKind, Result, UiEvent, WidgetConfig};
use confab_reveal::{RevealRequest, RevealScheduler, RevealSurface};
use confab_transport::Transport;

use crate::coalescer::StreamCoalescer;
use crate::surface::ChatSurface;
use crate::voice::{NullVoice, VoiceModule};

const SIMULATED_RESPONSE_DELAY_MS: u64 = 1_000;
const CONNECTION_LOST_MESSAGE: &str = "Connection lost. Trying to reconnect...";

/// The embedding host's handle to one conversation.
///
/// Owns the transport (when a server is configured), the event pump, and an
/// optional voice module. All presentation flows through the surface passed
/// to [`Widget::init`]; the handle itself only enqueues work.
pub struct Widget {
    event_tx: mpsc::UnboundedSender<UiEvent>,
    transport: Option<Transport>,
    voice: Box<dyn VoiceModule>,
    pump: JoinHandle<()>,
}

impl Widget {
    /// Build the widget and start its background tasks.
    ///
    /// With `connection.server_url` set, a session transport is spawned and
    /// begins connecting immediately. Without one the widget runs in
    /// local-only mode and answers with simulated responses.
    pub fn init<S>(config: WidgetConfig, surface: Arc<Mutex<S>>) -> Result<Widget>
    where
        S: ChatSurface + RevealSurface + 'static,
    {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let transport = match config.connection.server_url {
            Some(_) => Some(Transport::connect(&config.connection, event_tx.clone())?),
            None => {
                info!("No server configured; running in local-only mode");
                None
            }
        };

        let chat_surface: Arc<Mutex<dyn ChatSurface>> = surface.clone();
        let reveal_surface: Arc<Mutex<dyn RevealSurface>> = surface;
        let pump = EventPump {
            surface: chat_surface,
            scheduler: RevealScheduler::new(reveal_surface),
            coalescer: StreamCoalescer::new(config.streaming.threshold),
            reveal: config.reveal.clone(),
            event_rx,
        };
        let pump = tokio::spawn(pump.run());

        Ok(Widget {
            event_tx,
            transport,
            voice: Box::new(NullVoice::new()),
            pump,
        })
    }

    /// Replace the inert default voice module.
    pub fn set_voice(&mut self, voice: Box<dyn VoiceModule>) {
        self.voice = voice;
    }

    /// Start a voice conversation. Transcribed user speech is echoed into
    /// the conversation like typed input.
    pub fn start_voice(&mut self) -> Result<()> {
        let events = self.event_tx.clone();
        self.voice.start_conversation(Box::new(move |text| {
            let _ = events.send(UiEvent::NewMessage {
                kind: MessageKind::User,
                content: text,
                id: message_id(),
                is_html: false,
                skip_reveal: true,
            });
        }))
    }

    pub fn end_voice(&mut self) {
        self.voice.end_conversation();
    }

    pub fn voice_active(&self) -> bool {
        self.voice.is_active()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.transport
            .as_ref()
            .map(Transport::status)
            .unwrap_or(ConnectionStatus::Disconnected)
    }

    /// Send a user chat message.
    ///
    /// The message is echoed into the conversation immediately and a loading
    /// indicator is shown. Empty input is ignored. When not connected, the
    /// send is rejected rather than queued.
    pub fn send_message(&self, text: &str) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        self.emit(UiEvent::NewMessage {
            kind: MessageKind::User,
            content: trimmed.to_string(),
            id: message_id(),
            is_html: false,
            skip_reveal: true,
        });
        self.emit(UiEvent::ShowLoader);

        match &self.transport {
            Some(transport) => {
                if let Err(e) = transport.send_message(trimmed) {
                    self.emit(UiEvent::HideLoader);
                    return Err(e.into());
                }
                Ok(())
            }
            None => {
                self.simulate_response(trimmed);
                Ok(())
            }
        }
    }

    pub fn send_image_message(&self, text: &str, image_url: &str) -> Result<()> {
        let trimmed = text.trim();
        self.emit(UiEvent::NewMessage {
            kind: MessageKind::User,
            content: trimmed.to_string(),
            id: message_id(),
            is_html: false,
            skip_reveal: true,
        });
        self.emit(UiEvent::ShowLoader);

        match &self.transport {
            Some(transport) => {
                if let Err(e) = transport.send_image_message(trimmed, image_url) {
                    self.emit(UiEvent::HideLoader);
                    return Err(e.into());
                }
                Ok(())
            }
            None => {
                self.simulate_response(trimmed);
                Ok(())
            }
        }
    }

    /// Submit the identification form.
    pub fn submit_user_details(
        &self,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        match &self.transport {
            Some(transport) => {
                transport.submit_user_details(data)?;
                Ok(())
            }
            None => {
                let name = data
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("there")
                    .to_string();
                self.emit(UiEvent::NewMessage {
                    kind: MessageKind::Assistant,
                    content: format!("Thank you, {}! Your details have been submitted.", name),
                    id: message_id(),
                    is_html: false,
                    skip_reveal: false,
                });
                Ok(())
            }
        }
    }

    /// Tell the backend the identification form was dismissed.
    pub fn cancel_user_details(&self) -> Result<()> {
        if let Some(transport) = &self.transport {
            transport.notify_form_cancelled()?;
        }
        Ok(())
    }

    pub fn set_preference(&self, preference: &str, enabled: bool) -> Result<()> {
        match &self.transport {
            Some(transport) => {
                transport.set_preference(preference, enabled)?;
                Ok(())
            }
            None => {
                debug!("No transport; preference {}={} not sent", preference, enabled);
                Ok(())
            }
        }
    }

    /// Feed one streaming partial into the coalescer.
    ///
    /// The wire protocol delivers only complete messages, so streamed content
    /// enters here from the host (local generation, SSE sidecar, and so on).
    pub fn update_streaming(&self, id: &str, content: &str, is_complete: bool, is_html: bool) {
        self.emit(UiEvent::UpdateMessage {
            id: id.to_string(),
            content: content.to_string(),
            is_complete,
            is_html,
        });
    }

    /// Add a complete assistant message produced outside the transport.
    pub fn present_assistant_message(&self, content: &str, skip_reveal: bool) {
        self.emit(UiEvent::NewMessage {
            kind: MessageKind::Assistant,
            content: content.to_string(),
            id: message_id(),
            is_html: false,
            skip_reveal,
        });
    }

    /// Tear the widget down: voice, transport, pump, and any running reveals.
    pub fn shutdown(mut self) {
        self.voice.end_conversation();
        if let Some(transport) = &self.transport {
            transport.disconnect();
        }
        // Dropping the pump future drops the scheduler, which cancels jobs.
        self.pump.abort();
    }

    fn emit(&self, event: UiEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("Event pump is gone; dropping event");
        }
    }

    fn simulate_response(&self, message: &str) {
        let events = self.event_tx.clone();
        let wants_form = message.to_lowercase().contains("form");
        let reply = format!(
            "I received your message: \"{}\". This is a simulated response.",
            message
        );
        tokio::spawn(async move {
            sleep(Duration::from_millis(SIMULATED_RESPONSE_DELAY_MS)).await;
            let _ = events.send(UiEvent::HideLoader);
            if wants_form {
                let _ = events.send(UiEvent::ShowUserForm);
            } else {
                let _ = events.send(UiEvent::NewMessage {
                    kind: MessageKind::Assistant,
                    content: reply,
                    id: message_id(),
                    is_html: false,
                    skip_reveal: false,
                });
            }
        });
    }
}

struct EventPump {
    surface: Arc<Mutex<dyn ChatSurface>>,
    scheduler: RevealScheduler,
    coalescer: StreamCoalescer,
    reveal: RevealConfig,
    event_rx: mpsc::UnboundedReceiver<UiEvent>,
}

impl EventPump {
    async fn run(mut self) {
        while let Some(event) = self.event_rx.recv().await {
            self.handle(event);
        }
        debug!("Event pump finished");
    }

    fn handle(&mut self, event: UiEvent) {
        let Ok(mut surface) = self.surface.lock() else {
            warn!("Surface lock poisoned; dropping {}", event.event_name());
            return;
        };
        match event {
            UiEvent::ConnectionStatusChanged { status } => {
                surface.connection_status_changed(status);
                // A failed first connect goes connecting -> error without
                // ever reaching disconnected, so both statuses get the
                // notice.
                if matches!(
                    status,
                    ConnectionStatus::Disconnected | ConnectionStatus::Error
                ) {
                    surface.render_message(
                        MessageKind::System,
                        CONNECTION_LOST_MESSAGE,
                        &message_id(),
                        false,
                        false,
                    );
                }
            }
            UiEvent::NewMessage {
                kind,
                content,
                id,
                is_html,
                skip_reveal,
            } => {
                let will_reveal = kind == MessageKind::Assistant && !skip_reveal && !is_html;
                surface.render_message(kind, &content, &id, will_reveal, is_html);
                if will_reveal {
                    drop(surface);
                    self.scheduler.start(
                        RevealRequest {
                            target: id,
                            text: content,
                            speed: self.reveal.speed,
                            speed_multiplier: self.reveal.speed_multiplier,
                            rich_text: self.reveal.enable_markdown,
                        },
                        None,
                    );
                }
            }
            UiEvent::UpdateMessage {
                id,
                content,
                is_complete,
                is_html,
            } => {
                if self.coalescer.should_render(&id, &content, is_complete) {
                    surface.update_streaming_content(&id, &content, is_complete, is_html);
                }
            }
            UiEvent::ShowUserForm => surface.show_form_surface(),
            UiEvent::ShowLoader => surface.show_loading_indicator(),
            UiEvent::HideLoader => surface.hide_loading_indicator(),
            UiEvent::ThinkingStarted => surface.show_thinking_indicator(),
            UiEvent::ThinkingComplete => surface.hide_thinking_indicator(),
            // `UiEvent` is `#[non_exhaustive]`; all current variants are
            // handled above.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::SpeedPreset;

    // ---- mock surface ----

    #[derive(Default)]
    struct MockSurface {
        messages: Vec<(MessageKind, String, String, bool, bool)>,
        updates: Vec<(String, String, bool)>,
        loader_shown: usize,
        loader_hidden: usize,
        forms_shown: usize,
        thinking_shown: usize,
        thinking_hidden: usize,
        statuses: Vec<ConnectionStatus>,
        appended: std::collections::HashMap<String, String>,
        mounted: std::collections::HashMap<String, (String, usize)>,
    }

    impl ChatSurface for MockSurface {
        fn render_message(
            &mut self,
            kind: MessageKind,
            content: &str,
            id: &str,
            will_reveal: bool,
            is_html: bool,
        ) {
            self.messages.push((
                kind,
                content.to_string(),
                id.to_string(),
                will_reveal,
                is_html,
            ));
        }

        fn update_streaming_content(
            &mut self,
            id: &str,
            content: &str,
            is_complete: bool,
            _is_html: bool,
        ) {
            self.updates
                .push((id.to_string(), content.to_string(), is_complete));
        }

        fn show_loading_indicator(&mut self) {
            self.loader_shown += 1;
        }

        fn hide_loading_indicator(&mut self) {
            self.loader_hidden += 1;
        }

        fn show_form_surface(&mut self) {
            self.forms_shown += 1;
        }

        fn show_thinking_indicator(&mut self) {
            self.thinking_shown += 1;
        }

        fn hide_thinking_indicator(&mut self) {
            self.thinking_hidden += 1;
        }

        fn connection_status_changed(&mut self, status: ConnectionStatus) {
            self.statuses.push(status);
        }
    }

    impl RevealSurface for MockSurface {
        fn append_plain(&mut self, target: &str, text: &str) {
            self.appended
                .entry(target.to_string())
                .or_default()
                .push_str(text);
        }

        fn show_typing_marker(&mut self, _target: &str, _visible: bool) {}

        fn mount_rich(&mut self, target: &str, html: &str, unit_count: usize) {
            self.mounted
                .insert(target.to_string(), (html.to_string(), unit_count));
        }

        fn reveal_rich_units(&mut self, _target: &str, _visible_upto: usize) {}
    }

    fn local_config(markdown: bool) -> WidgetConfig {
        let mut config = WidgetConfig::default();
        config.reveal.speed = SpeedPreset::UltraFast;
        config.reveal.enable_markdown = markdown;
        config
    }

    fn setup(markdown: bool) -> (Widget, Arc<Mutex<MockSurface>>) {
        let surface = Arc::new(Mutex::new(MockSurface::default()));
        let widget = Widget::init(local_config(markdown), surface.clone()).unwrap();
        (widget, surface)
    }

    // ---- local mode ----

    #[tokio::test(start_paused = true)]
    async fn test_send_message_echoes_user_and_simulates_reply() {
        let (widget, surface) = setup(false);
        widget.send_message("hello engine").unwrap();

        sleep(Duration::from_secs(5)).await;

        let s = surface.lock().unwrap();
        let (kind, content, _, will_reveal, _) = &s.messages[0];
        assert_eq!(*kind, MessageKind::User);
        assert_eq!(content, "hello engine");
        assert!(!will_reveal);

        let (kind, content, id, will_reveal, _) = &s.messages[1];
        assert_eq!(*kind, MessageKind::Assistant);
        assert_eq!(
            content,
            "I received your message: \"hello engine\". This is a simulated response."
        );
        assert!(will_reveal);
        assert_eq!(s.appended.get(id), Some(content));

        assert_eq!(s.loader_shown, 1);
        assert_eq!(s.loader_hidden, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_reply_waits_a_second() {
        let (widget, surface) = setup(false);
        widget.send_message("hi").unwrap();

        sleep(Duration::from_millis(500)).await;
        assert_eq!(surface.lock().unwrap().messages.len(), 1);

        sleep(Duration::from_millis(600)).await;
        assert_eq!(surface.lock().unwrap().messages.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_form_keyword_shows_form() {
        let (widget, surface) = setup(false);
        widget.send_message("I need the Form please").unwrap();

        sleep(Duration::from_secs(2)).await;

        let s = surface.lock().unwrap();
        assert_eq!(s.forms_shown, 1);
        // Only the user echo; no simulated text reply.
        assert_eq!(s.messages.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_and_whitespace_messages_ignored() {
        let (widget, surface) = setup(false);
        widget.send_message("").unwrap();
        widget.send_message("   \n\t").unwrap();

        sleep(Duration::from_secs(2)).await;
        assert!(surface.lock().unwrap().messages.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_markdown_reply_mounts_rich_content() {
        let (widget, surface) = setup(true);
        widget.send_message("hello").unwrap();

        sleep(Duration::from_secs(5)).await;

        let s = surface.lock().unwrap();
        let (_, _, id, _, _) = &s.messages[1];
        let (html, units) = s.mounted.get(id).expect("rich content mounted");
        assert!(html.contains("reveal-unit"));
        assert!(*units > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_user_details_local_ack() {
        let (widget, surface) = setup(false);
        let mut data = serde_json::Map::new();
        data.insert("name".to_string(), serde_json::Value::from("Ada"));
        widget.submit_user_details(data).unwrap();

        sleep(Duration::from_secs(2)).await;

        let s = surface.lock().unwrap();
        let (kind, content, ..) = &s.messages[0];
        assert_eq!(*kind, MessageKind::Assistant);
        assert_eq!(content, "Thank you, Ada! Your details have been submitted.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_reveal_message_renders_at_once() {
        let (widget, surface) = setup(false);
        widget.present_assistant_message("instant text", true);

        sleep(Duration::from_secs(2)).await;

        let s = surface.lock().unwrap();
        let (kind, content, _, will_reveal, _) = &s.messages[0];
        assert_eq!(*kind, MessageKind::Assistant);
        assert_eq!(content, "instant text");
        assert!(!will_reveal);
        assert!(s.appended.is_empty());
    }

    // ---- streaming ----

    #[tokio::test(start_paused = true)]
    async fn test_streaming_updates_are_coalesced() {
        let (widget, surface) = setup(false);
        widget.update_streaming("m1", "h", false, false);
        widget.update_streaming("m1", "hel", false, false);
        widget.update_streaming("m1", "hello wor", false, false);
        widget.update_streaming("m1", &"x".repeat(30), false, false);
        widget.update_streaming("m1", "final text", true, false);

        sleep(Duration::from_secs(1)).await;

        let s = surface.lock().unwrap();
        let rendered: Vec<&str> = s.updates.iter().map(|(_, c, _)| c.as_str()).collect();
        // First partial, the >15-char jump, and the completion.
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[0], "h");
        assert_eq!(rendered[2], "final text");
        assert!(s.updates[2].2);
    }

    // ---- connection notices ----

    #[tokio::test]
    async fn test_failed_initial_connection_shows_system_notice() {
        let surface = Arc::new(Mutex::new(MockSurface::default()));
        let mut config = local_config(false);
        // Nothing listens on the discard port; the first connect is refused.
        config.connection.server_url = Some("ws://127.0.0.1:1".to_string());
        let widget = Widget::init(config, surface.clone()).unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            {
                let s = surface.lock().unwrap();
                if s.messages.iter().any(|(kind, content, ..)| {
                    *kind == MessageKind::System && content == CONNECTION_LOST_MESSAGE
                }) {
                    assert!(s.statuses.contains(&ConnectionStatus::Error));
                    break;
                }
            }
            assert!(
                std::time::Instant::now() < deadline,
                "no connection notice rendered"
            );
            sleep(Duration::from_millis(20)).await;
        }
        widget.shutdown();
    }

    // ---- misc ----

    #[tokio::test(start_paused = true)]
    async fn test_local_mode_status_is_disconnected() {
        let (widget, _surface) = setup(false);
        assert_eq!(widget.connection_status(), ConnectionStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_module_swap() {
        let (mut widget, _surface) = setup(false);
        assert!(!widget.voice_active());
        widget.start_voice().unwrap();
        assert!(widget.voice_active());
        widget.end_voice();
        assert!(!widget.voice_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_voice_transcripts_become_user_messages() {
        struct EchoVoice;
        impl VoiceModule for EchoVoice {
            fn start_conversation(
                &mut self,
                transcripts: crate::voice::TranscriptSink,
            ) -> Result<()> {
                transcripts("spoken hello".to_string());
                Ok(())
            }
            fn end_conversation(&mut self) {}
            fn set_volume(&mut self, _volume: f64) {}
            fn is_active(&self) -> bool {
                true
            }
        }

        let (mut widget, surface) = setup(false);
        widget.set_voice(Box::new(EchoVoice));
        widget.start_voice().unwrap();

        sleep(Duration::from_millis(100)).await;

        let s = surface.lock().unwrap();
        let (kind, content, _, _, _) = &s.messages[0];
        assert_eq!(*kind, MessageKind::User);
        assert_eq!(content, "spoken hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_preference_without_transport_is_ok() {
        let (widget, _surface) = setup(false);
        widget.set_preference("audio_enabled", true).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_pump() {
        let (widget, surface) = setup(false);
        widget.send_message("hello").unwrap();
        // Shut down before the simulated reply lands.
        sleep(Duration::from_millis(100)).await;
        widget.shutdown();

        sleep(Duration::from_secs(5)).await;
        // Only the user echo made it through.
        assert_eq!(surface.lock().unwrap().messages.len(), 1);
    }
}
