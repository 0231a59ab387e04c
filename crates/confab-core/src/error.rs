use thiserror::Error;

/// Top-level error type for the Confab engine.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for ConfabError`
/// so that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfabError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Reveal error: {0}")]
    Reveal(String),

    #[error("Voice error: {0}")]
    Voice(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfabError {
    fn from(err: toml::de::Error) -> Self {
        ConfabError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfabError {
    fn from(err: toml::ser::Error) -> Self {
        ConfabError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ConfabError {
    fn from(err: serde_json::Error) -> Self {
        ConfabError::Serialization(err.to_string())
    }
}

/// Convenience result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ConfabError>;
