//! Error types for the turn engine.

use shedder_cards::{Card, Color};
use shedder_protocol::{ErrorKind, PlayerId, SessionState};

/// Everything a session can refuse to do.
///
/// A returned error always means the session is unchanged: the engine
/// validates fully before it mutates anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The acting player is not part of this session.
    #[error("player {0} is not in this session")]
    UnknownPlayer(PlayerId),

    /// A player with this id has already joined.
    #[error("player {0} already joined")]
    DuplicatePlayer(PlayerId),

    /// Joining or starting after the session left `WaitingForPlayers`.
    #[error("session has already started")]
    SessionAlreadyStarted,

    #[error("not enough players: have {have}, need {need}")]
    NotEnoughPlayers { have: usize, need: usize },

    #[error("session is full ({max} players)")]
    SessionFull { max: usize },

    /// An action from someone other than the active player.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("{0} is not in the player's hand")]
    CardNotInHand(Card),

    /// The card matches neither the active color nor the top value.
    #[error("{card} cannot be played on {top} (active color {active_color})")]
    IllegalMove {
        card: Card,
        top: Card,
        active_color: Color,
    },

    /// Structurally wrong action, e.g. `play_card` without a card.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// A turn action before the session started.
    #[error("session has not started")]
    NotStarted,

    #[error("session is {0}")]
    SessionTerminated(SessionState),

    /// Neither the draw pile nor the recycled discards hold enough cards.
    #[error("no cards left to draw")]
    DeckExhausted,

    /// Internal state is inconsistent. Fatal for this session only.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownPlayer(_) | Self::InvalidAction(_) | Self::NotStarted => {
                ErrorKind::InvalidAction
            }
            Self::DuplicatePlayer(_)
            | Self::SessionAlreadyStarted
            | Self::NotEnoughPlayers { .. }
            | Self::SessionFull { .. } => ErrorKind::Conflict,
            Self::NotYourTurn(_) | Self::CardNotInHand(_) | Self::IllegalMove { .. } => {
                ErrorKind::IllegalMove
            }
            Self::SessionTerminated(_) => ErrorKind::SessionTerminated,
            Self::DeckExhausted => ErrorKind::DeckExhausted,
            Self::InvariantViolation(_) => ErrorKind::Internal,
        }
    }

    /// Returns `true` if the session cannot safely continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}
