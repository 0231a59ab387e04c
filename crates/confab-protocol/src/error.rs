use thiserror::Error;

use confab_core::ConfabError;

/// Errors produced while encoding or decoding wire envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Failed to decode envelope: {0}")]
    Decode(String),

    #[error("Failed to encode envelope: {0}")]
    Encode(String),
}

impl From<ProtocolError> for ConfabError {
    fn from(err: ProtocolError) -> Self {
        ConfabError::Protocol(err.to_string())
    }
}
