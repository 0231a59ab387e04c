//! Shared types for the Confab conversational-widget engine.
//!
//! Leaf crate holding the configuration surface, the top-level error type,
//! the connection-status state machine, and the typed signal enum exchanged
//! between the session transport and the presentation layer.

pub mod config;
pub mod error;
pub mod events;
pub mod status;
pub mod types;

pub use config::WidgetConfig;
pub use error::{ConfabError, Result};
pub use events::UiEvent;
pub use status::ConnectionStatus;
pub use types::{MessageKind, SpeedPreset};
