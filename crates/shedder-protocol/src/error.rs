//! Error types for the protocol layer.

use crate::ErrorKind;

/// Errors raised while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A value could not be serialized.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Bytes did not decode into the expected type: malformed JSON,
    /// missing fields, or an unknown `type` tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded but breaks a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "json")]
            Self::Encode(_) => ErrorKind::Internal,
            #[cfg(feature = "json")]
            Self::Decode(_) => ErrorKind::InvalidAction,
            Self::InvalidMessage(_) => ErrorKind::InvalidAction,
        }
    }
}
