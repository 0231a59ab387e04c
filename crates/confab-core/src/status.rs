//! Connection-status state machine for the session transport.
//!
//! Enforces the allowed lifecycle transitions:
//! disconnected -> connecting -> connected -> disconnected/error,
//! with error able to re-enter connecting (reconnect) or settle into
//! disconnected once the underlying socket reports its close.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one logical session connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// No socket open. Initial state, and the resting state after any close.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The socket is open and envelopes may be sent.
    Connected,
    /// The socket reported a failure. A close normally follows.
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error => write!(f, "error"),
        }
    }
}

impl ConnectionStatus {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &ConnectionStatus) -> bool {
        matches!(
            (self, target),
            (ConnectionStatus::Disconnected, ConnectionStatus::Connecting)
                | (ConnectionStatus::Connecting, ConnectionStatus::Connected)
                | (ConnectionStatus::Connecting, ConnectionStatus::Error)
                | (ConnectionStatus::Connecting, ConnectionStatus::Disconnected)
                | (ConnectionStatus::Connected, ConnectionStatus::Disconnected)
                | (ConnectionStatus::Connected, ConnectionStatus::Error)
                | (ConnectionStatus::Error, ConnectionStatus::Connecting)
                | (ConnectionStatus::Error, ConnectionStatus::Disconnected)
        )
    }

    /// Returns whether outbound sends are permitted in this state.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}
