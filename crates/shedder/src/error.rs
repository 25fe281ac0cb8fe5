//! Unified error type for Shedder.

use shedder_protocol::{ErrorKind, PlayerId, ProtocolError};
use shedder_registry::RegistryError;

/// Top-level error for the server and its connections.
///
/// The `#[from]` attributes let `?` lift sub-crate errors into this one.
/// Engine and hub failures reach the facade already wrapped in
/// [`RegistryError`].
#[derive(Debug, thiserror::Error)]
pub enum ShedderError {
    /// Binding or accepting a TCP connection failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The WebSocket handshake or a frame failed.
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The connection tried to act or look as a player it never
    /// created or joined.
    #[error("player {0} does not belong to this connection")]
    NotYourPlayer(PlayerId),
}

impl ShedderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::WebSocket(_) => ErrorKind::Internal,
            Self::Protocol(e) => e.kind(),
            Self::Registry(e) => e.kind(),
            Self::NotYourPlayer(_) => ErrorKind::InvalidAction,
        }
    }
}
