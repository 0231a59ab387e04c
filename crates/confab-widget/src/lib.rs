//! Embedding surface for the Confab engine.
//!
//! [`Widget`] wires the pieces together: the session transport feeds routed
//! events into a pump task, which coalesces streaming updates, schedules
//! incremental reveals, and calls back into the host through [`ChatSurface`].
//! Without a configured server the widget answers with simulated responses,
//! which keeps host integration testable offline.

pub mod coalescer;
pub mod surface;
pub mod voice;
pub mod widget;

pub use coalescer::StreamCoalescer;
pub use surface::ChatSurface;
pub use voice::{NullVoice, TranscriptSink, VoiceModule};
pub use widget::Widget;
