use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Duration, Instant};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use confab_core::config::ConnectionConfig;
use confab_core::{ConnectionStatus, UiEvent};
use confab_protocol::{encode_with_session, ClientEnvelope, Envelope};

use crate::error::TransportError;
use crate::router::{MessageRouter, RouterAction};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Command {
    Send(ClientEnvelope),
    Disconnect,
}

/// Handle to one WebSocket session.
///
/// The session runs in a background task. Sends are rejected, never queued,
/// while the session is not in the connected state. After an abnormal close
/// the task waits the configured fixed delay and reconnects; a clean close
/// or an explicit [`Transport::disconnect`] ends the task.
pub struct Transport {
    cmd_tx: mpsc::UnboundedSender<Command>,
    status_rx: watch::Receiver<ConnectionStatus>,
    task: JoinHandle<()>,
}

impl Transport {
    /// Spawn the session task and begin connecting.
    ///
    /// UI events (status changes and routed messages) are delivered on
    /// `events` in the order the session produced them.
    pub fn connect(
        config: &ConnectionConfig,
        events: mpsc::UnboundedSender<UiEvent>,
    ) -> Result<Transport, TransportError> {
        let url = config
            .server_url
            .clone()
            .ok_or_else(|| TransportError::ConnectFailed("no server url configured".to_string()))?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);

        let session = SessionTask {
            url,
            heartbeat_interval: Duration::from_millis(config.heartbeat_interval_ms),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            cmd_rx,
            status_tx,
            events,
            router: MessageRouter::new(),
            session_id: None,
        };
        let task = tokio::spawn(session.run());

        Ok(Transport {
            cmd_tx,
            status_rx,
            task,
        })
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    pub fn send_message(&self, message: impl Into<String>) -> Result<(), TransportError> {
        self.send(ClientEnvelope::ChatMessage {
            message: message.into(),
        })
    }

    pub fn send_image_message(
        &self,
        message: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Result<(), TransportError> {
        self.send(ClientEnvelope::ImageMessage {
            message: message.into(),
            image_url: image_url.into(),
        })
    }

    pub fn submit_user_details(
        &self,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), TransportError> {
        self.send(ClientEnvelope::UserDetailsSubmit { data })
    }

    pub fn notify_form_cancelled(&self) -> Result<(), TransportError> {
        self.send(ClientEnvelope::UserDetailsCancelled)
    }

    pub fn set_preference(
        &self,
        preference: impl Into<String>,
        enabled: bool,
    ) -> Result<(), TransportError> {
        self.send(ClientEnvelope::SetPreference {
            preference: preference.into(),
            enabled,
        })
    }

    /// Close the session. The socket is closed cleanly and the task ends
    /// without reconnecting.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect);
    }

    /// Wait for the session task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }

    fn send(&self, envelope: ClientEnvelope) -> Result<(), TransportError> {
        if !self.status().is_connected() {
            warn!("Not connected; dropping outbound envelope");
            return Err(TransportError::NotConnected);
        }
        self.cmd_tx
            .send(Command::Send(envelope))
            .map_err(|_| TransportError::TaskGone)
    }
}

enum Outcome {
    /// Caller asked to disconnect, or the handle was dropped.
    Explicit,
    /// Peer closed with a normal close code.
    Clean,
    /// Peer went away without a normal close.
    Abnormal,
    /// The socket reported an error.
    Errored,
}

struct SessionTask {
    url: String,
    heartbeat_interval: Duration,
    reconnect_delay: Duration,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    status_tx: watch::Sender<ConnectionStatus>,
    events: mpsc::UnboundedSender<UiEvent>,
    router: MessageRouter,
    session_id: Option<String>,
}

impl SessionTask {
    async fn run(mut self) {
        loop {
            self.transition(ConnectionStatus::Connecting);
            match connect_async(self.url.as_str()).await {
                Ok((ws, _)) => match self.drive(ws).await {
                    Outcome::Explicit | Outcome::Clean => {
                        self.transition(ConnectionStatus::Disconnected);
                        return;
                    }
                    Outcome::Abnormal | Outcome::Errored => {
                        self.transition(ConnectionStatus::Disconnected);
                        if !self.reconnect_wait().await {
                            return;
                        }
                    }
                },
                Err(e) => {
                    error!("Connection to {} failed: {}", self.url, e);
                    self.transition(ConnectionStatus::Error);
                    if !self.reconnect_wait().await {
                        self.transition(ConnectionStatus::Disconnected);
                        return;
                    }
                }
            }
        }
    }

    /// Pump one open socket until it closes or the caller disconnects.
    async fn drive(&mut self, ws: WsStream) -> Outcome {
        self.transition(ConnectionStatus::Connected);
        let (mut sink, mut stream) = ws.split();

        // First heartbeat fires one full interval after connecting.
        let mut heartbeat = interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.handle_frame(&text),
                    Some(Ok(Message::Close(frame))) => {
                        let clean = frame
                            .as_ref()
                            .map(|f| f.code == CloseCode::Normal)
                            .unwrap_or(false);
                        debug!("Socket closed (clean: {})", clean);
                        return if clean { Outcome::Clean } else { Outcome::Abnormal };
                    }
                    // Ping/pong are answered by the library; binary frames
                    // are not part of the protocol.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Socket error: {}", e);
                        self.transition(ConnectionStatus::Error);
                        return Outcome::Errored;
                    }
                    None => {
                        debug!("Socket stream ended without a close frame");
                        return Outcome::Abnormal;
                    }
                },
                _ = heartbeat.tick() => {
                    self.send_envelope(&mut sink, &ClientEnvelope::Heartbeat).await;
                }
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(envelope)) => {
                        self.send_envelope(&mut sink, &envelope).await;
                    }
                    Some(Command::Disconnect) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return Outcome::Explicit;
                    }
                }
            }
        }
    }

    async fn send_envelope(
        &mut self,
        sink: &mut SplitSink<WsStream, Message>,
        envelope: &ClientEnvelope,
    ) {
        match encode_with_session(envelope, self.session_id.as_deref()) {
            Ok(text) => {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    warn!("Failed to send envelope: {}", e);
                }
            }
            Err(e) => warn!("Failed to encode envelope: {}", e),
        }
    }

    fn handle_frame(&mut self, text: &str) {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping malformed frame: {}", e);
                return;
            }
        };

        // Handshake artifact: capture the session id, never route it.
        if envelope.is_kind("connection_established") {
            self.session_id = envelope.session_id.clone();
            info!("Session established: {:?}", self.session_id);
            return;
        }

        for action in self.router.route(&envelope) {
            match action {
                RouterAction::Emit(event) => {
                    let _ = self.events.send(event);
                }
                RouterAction::EmitAfter { delay_ms, event } => {
                    let events = self.events.clone();
                    tokio::spawn(async move {
                        sleep(Duration::from_millis(delay_ms)).await;
                        let _ = events.send(event);
                    });
                }
            }
        }
    }

    /// Wait out the fixed reconnect delay. Returns false if the caller
    /// disconnected (or dropped the handle) while waiting.
    async fn reconnect_wait(&mut self) -> bool {
        info!("Reconnecting in {:?}", self.reconnect_delay);
        let wait = sleep(self.reconnect_delay);
        tokio::pin!(wait);
        loop {
            tokio::select! {
                _ = &mut wait => return true,
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(Command::Send(_)) => {
                        warn!("Not connected; dropping outbound envelope");
                    }
                    Some(Command::Disconnect) | None => return false,
                }
            }
        }
    }

    fn transition(&mut self, next: ConnectionStatus) {
        let current = *self.status_tx.borrow();
        if current == next {
            return;
        }
        if !current.can_transition_to(&next) {
            debug!("Ignoring invalid transition {} -> {}", current, next);
            return;
        }
        info!("Connection status: {}", next);
        let _ = self.status_tx.send(next);
        let _ = self
            .events
            .send(UiEvent::ConnectionStatusChanged { status: next });
    }
}
