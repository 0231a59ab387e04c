use thiserror::Error;

use confab_core::ConfabError;
use confab_protocol::ProtocolError;

/// Errors produced by the session transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A send was attempted while the session is not connected. Sends are
    /// rejected, never queued.
    #[error("Not connected; message dropped")]
    NotConnected,

    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Transport task is no longer running")]
    TaskGone,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<TransportError> for ConfabError {
    fn from(err: TransportError) -> Self {
        ConfabError::Transport(err.to_string())
    }
}
