//! Session transport and message routing.
//!
//! [`Transport`] owns one WebSocket session: connect, heartbeat, the single
//! fixed-delay reconnect after an abnormal close, and the outbound send
//! surface. Inbound envelopes flow through [`MessageRouter`], which turns
//! them into [`confab_core::UiEvent`]s for the presentation layer.

pub mod error;
pub mod router;
pub mod session;

pub use error::TransportError;
pub use router::{MessageRouter, RouterAction};
pub use session::Transport;
