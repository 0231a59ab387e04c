//! Incremental reveal of assistant messages.
//!
//! Plain text is appended a few word tokens at a time with a delay between
//! ticks. Markdown is rendered in full first, with every word and block
//! annotated as a numbered reveal unit, then a growing prefix of units is
//! made visible. Each presentation target runs at most one job; starting a
//! new job on a target cancels the previous one.

pub mod plain;
pub mod rich;
pub mod scheduler;
pub mod speed;
pub mod token;

pub use rich::RichContent;
pub use scheduler::{RevealRequest, RevealScheduler, RevealSurface};
pub use speed::{RevealTuning, LARGE_CONTENT_THRESHOLD};
