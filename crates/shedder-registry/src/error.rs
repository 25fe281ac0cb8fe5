//! Error types for the registry layer.

use std::time::Duration;

use shedder_engine::EngineError;
use shedder_hub::HubError;
use shedder_protocol::{ErrorKind, PlayerId, ProtocolError, SessionId};

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A session with this id is already registered.
    #[error("session {0} already exists")]
    AlreadyExists(SessionId),

    /// The session does not exist (or has already been torn down).
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// A player audience named someone outside the session.
    #[error("player {1} is not in session {0}")]
    PlayerNotFound(SessionId, PlayerId),

    /// The action queue stayed full for the whole submission timeout.
    #[error("session {0} did not accept the action within {1:?}")]
    ActionTimeout(SessionId, Duration),

    /// The session's runner has stopped taking actions.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),

    /// The turn engine rejected the request.
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists(_) => ErrorKind::Conflict,
            Self::NotFound(_) | Self::PlayerNotFound(..) => ErrorKind::NotFound,
            Self::ActionTimeout(..) => ErrorKind::ActionTimeout,
            Self::Unavailable(_) => ErrorKind::SessionTerminated,
            Self::Engine(e) => e.kind(),
            Self::Hub(e) => e.kind(),
            Self::Protocol(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use shedder_protocol::SessionState;

    use super::*;

    #[test]
    fn test_kind_passes_through_engine_errors() {
        let err = RegistryError::from(EngineError::NotYourTurn(PlayerId::new("b")));
        assert_eq!(err.kind(), ErrorKind::IllegalMove);
        let err = RegistryError::from(EngineError::SessionTerminated(SessionState::Cancelled));
        assert_eq!(err.kind(), ErrorKind::SessionTerminated);
    }

    #[test]
    fn test_kind_registry_variants() {
        let id = SessionId::new("s");
        assert_eq!(RegistryError::AlreadyExists(id.clone()).kind(), ErrorKind::Conflict);
        assert_eq!(RegistryError::NotFound(id.clone()).kind(), ErrorKind::NotFound);
        assert_eq!(
            RegistryError::ActionTimeout(id, Duration::from_secs(1)).kind(),
            ErrorKind::ActionTimeout
        );
    }

    #[test]
    fn test_display_is_transparent_for_engine() {
        let err = RegistryError::from(EngineError::DeckExhausted);
        assert_eq!(err.to_string(), "no cards left to draw");
    }
}
