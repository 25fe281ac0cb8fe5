//! Wire types: session state, actions, snapshot views, and the
//! client/server message enums.
//!
//! Everything here is plain serializable data. Session rules live in
//! `shedder-engine`; this crate only fixes the shapes that travel
//! between the engine, the broadcast hub, and clients.

use std::fmt;

use serde::{Deserialize, Serialize};
use shedder_cards::{Card, Color};

use crate::{PlayerId, SessionId};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle state of a session.
///
/// ```text
/// WaitingForPlayers → InProgress → Completed
///         │                 │
///         └────────→ Cancelled ←┘
/// ```
///
/// `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    WaitingForPlayers,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionState {
    /// Returns `true` if the session still accepts new players.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::WaitingForPlayers)
    }

    /// Returns `true` for `Completed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns `true` if moving from `self` to `target` is a legal edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::WaitingForPlayers, Self::InProgress)
                | (Self::WaitingForPlayers, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Cancelled)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Completed => write!(f, "Completed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Turn rotation direction. Toggled by `Reverse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// +1: towards higher player indices.
    #[default]
    Forward,
    /// -1: towards lower player indices.
    Backward,
}

impl Direction {
    /// `+1` or `-1`.
    pub fn sign(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// The three things a player can do on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PlayCard,
    DrawCard,
    EndTurn,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayCard => write!(f, "play_card"),
            Self::DrawCard => write!(f, "draw_card"),
            Self::EndTurn => write!(f, "end_turn"),
        }
    }
}

/// A player's request to change a session.
///
/// JSON shape: `{"type": "play_card", "player_id": "...", "card": {...},
/// "chosen_color": "Red"}`. `card` is only meaningful for `play_card`;
/// `chosen_color` only when the played card is wild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub player_id: PlayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_color: Option<Color>,
}

impl Action {
    /// Play a non-wild card.
    pub fn play(player_id: PlayerId, card: Card) -> Self {
        Self {
            kind: ActionKind::PlayCard,
            player_id,
            card: Some(card),
            chosen_color: None,
        }
    }

    /// Play a wild card and name the next active color.
    pub fn play_wild(player_id: PlayerId, card: Card, color: Color) -> Self {
        Self {
            kind: ActionKind::PlayCard,
            player_id,
            card: Some(card),
            chosen_color: Some(color),
        }
    }

    pub fn draw(player_id: PlayerId) -> Self {
        Self {
            kind: ActionKind::DrawCard,
            player_id,
            card: None,
            chosen_color: None,
        }
    }

    pub fn end_turn(player_id: PlayerId) -> Self {
        Self {
            kind: ActionKind::EndTurn,
            player_id,
            card: None,
            chosen_color: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Views (snapshot encoding)
// ---------------------------------------------------------------------------

/// One player as seen by a particular viewer.
///
/// `hand` is `Some` only for the viewer's own entry; everyone else is
/// reduced to `card_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub card_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
    pub in_game: bool,
}

/// A session snapshot tailored to one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub state: SessionState,
    pub players: Vec<PlayerView>,
    pub discard_top: Card,
    /// Color the next card must match (differs from `discard_top.color`
    /// after a wild card).
    pub active_color: Color,
    pub active_player: Option<PlayerId>,
    pub direction: Direction,
    pub draw_pile_size: usize,
    pub winner: Option<PlayerId>,
    /// Number of actions applied so far.
    pub version: u64,
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Coarse error taxonomy shared by every layer.
///
/// Each crate's error enum maps onto one of these via `kind()`, which is
/// what clients receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Session or player absent.
    NotFound,
    /// Duplicate id, already started, not enough players, full.
    Conflict,
    /// Rule violation: wrong color/value, not the player's turn.
    IllegalMove,
    /// Malformed or unknown action.
    InvalidAction,
    /// Action after `Completed`/`Cancelled`.
    SessionTerminated,
    /// No card left to draw.
    DeckExhausted,
    /// Submission could not be enqueued in time.
    ActionTimeout,
    /// A bounded queue refused the message.
    Backpressure,
    /// Broken invariant or codec failure.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Client / server messages
// ---------------------------------------------------------------------------

/// Messages a client sends to the front end.
///
/// Internally tagged: `{"type": "JoinSession", "session_id": "...", "name": "Bob"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Create a session with the sender as its first player.
    CreateSession { name: String },

    /// Join a session that has not started yet.
    JoinSession { session_id: SessionId, name: String },

    /// Start a session.
    StartSession { session_id: SessionId },

    /// Receive snapshots for a session. With `player_id` the snapshots
    /// reveal that player's hand; without it the connection spectates.
    Subscribe {
        session_id: SessionId,
        #[serde(default)]
        player_id: Option<PlayerId>,
    },

    /// Stop receiving snapshots for a session.
    Unsubscribe { session_id: SessionId },

    /// Submit a turn action.
    Act { session_id: SessionId, action: Action },
}

/// Messages the front end sends to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    SessionCreated { session_id: SessionId, player_id: PlayerId },
    Joined { session_id: SessionId, player_id: PlayerId },
    Started { session_id: SessionId },
    Subscribed { session_id: SessionId },
    Unsubscribed { session_id: SessionId },
    /// The action was applied as number `seq` in the session's history.
    ActionApplied { session_id: SessionId, seq: u64 },
    Snapshot { view: SessionView },
    Error { kind: ErrorKind, message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use shedder_cards::Value;

    use super::*;

    // =====================================================================
    // SessionState
    // =====================================================================

    #[test]
    fn test_session_state_legal_edges() {
        use SessionState::*;
        assert!(WaitingForPlayers.can_transition_to(InProgress));
        assert!(WaitingForPlayers.can_transition_to(Cancelled));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));
    }

    #[test]
    fn test_session_state_illegal_edges() {
        use SessionState::*;
        assert!(!WaitingForPlayers.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(WaitingForPlayers));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_session_state_terminal() {
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Cancelled.is_terminal());
        assert!(!SessionState::InProgress.is_terminal());
        assert!(!SessionState::WaitingForPlayers.is_terminal());
    }

    #[test]
    fn test_session_state_serializes_snake_case() {
        let json = serde_json::to_string(&SessionState::WaitingForPlayers).unwrap();
        assert_eq!(json, "\"waiting_for_players\"");
    }

    // =====================================================================
    // Direction
    // =====================================================================

    #[test]
    fn test_direction_reversed_twice_restores() {
        let d = Direction::Forward;
        assert_eq!(d.reversed(), Direction::Backward);
        assert_eq!(d.reversed().reversed(), d);
        assert_eq!(Direction::Backward.sign(), -1);
    }

    // =====================================================================
    // Action
    // =====================================================================

    #[test]
    fn test_action_json_format() {
        let action = Action::play(PlayerId::new("p1"), Card::new(Color::Red, Value::Two));
        let json: serde_json::Value = serde_json::to_value(&action).unwrap();

        assert_eq!(json["type"], "play_card");
        assert_eq!(json["player_id"], "p1");
        assert_eq!(json["card"]["color"], "Red");
        assert!(json.get("chosen_color").is_none());
    }

    #[test]
    fn test_action_draw_without_card_field() {
        let json = r#"{"type": "draw_card", "player_id": "p2"}"#;
        let action: Action = serde_json::from_str(json).unwrap();
        assert_eq!(action, Action::draw(PlayerId::new("p2")));
    }

    #[test]
    fn test_action_unknown_type_fails_to_decode() {
        let json = r#"{"type": "steal_card", "player_id": "p2"}"#;
        let result: Result<Action, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    // =====================================================================
    // Messages
    // =====================================================================

    #[test]
    fn test_client_message_subscribe_without_player() {
        let json = r#"{"type": "Subscribe", "session_id": "s1"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                session_id: SessionId::new("s1"),
                player_id: None,
            }
        );
    }

    #[test]
    fn test_server_message_error_json_format() {
        let msg = ServerMessage::Error {
            kind: ErrorKind::IllegalMove,
            message: "not your turn".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "Error");
        assert_eq!(json["kind"], "IllegalMove");
        assert_eq!(json["message"], "not your turn");
    }

    #[test]
    fn test_player_view_omits_hidden_hand() {
        let view = PlayerView {
            id: PlayerId::new("p1"),
            name: "Ann".into(),
            card_count: 3,
            hand: None,
            in_game: true,
        };
        let json: serde_json::Value = serde_json::to_value(&view).unwrap();
        assert!(json.get("hand").is_none());
        assert_eq!(json["card_count"], 3);
    }
}
