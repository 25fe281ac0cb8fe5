//! The session aggregate: players, piles, turn order and lifecycle.

use rand::SeedableRng;
use rand::rngs::StdRng;
use shedder_cards::{Card, Color, Deck};
use shedder_protocol::{Direction, PlayerId, PlayerView, SessionId, SessionState, SessionView};
use tracing::{debug, info};

use crate::audit::AuditLog;
use crate::config::EngineConfig;
use crate::error::EngineError;

/// A participant and their hand.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Deck,
    /// Cleared when the session reaches a terminal state.
    pub in_game: bool,
}

/// A single game instance.
///
/// All mutation goes through `&mut self`; the runner that owns a session
/// is the only writer, so the methods here never lock. Every operation
/// validates completely before touching state, so an `Err` leaves the
/// session exactly as it was.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) players: Vec<Player>,
    pub(crate) discard_top: Card,
    pub(crate) active_color: Color,
    pub(crate) discard_pile: Vec<Card>,
    pub(crate) draw_pile: Deck,
    pub(crate) state: SessionState,
    pub(crate) active_index: usize,
    pub(crate) direction: Direction,
    pub(crate) winner: Option<PlayerId>,
    pub(crate) history: AuditLog,
    pub(crate) config: EngineConfig,
    pub(crate) rng: StdRng,
}

impl Session {
    /// Creates a session with a freshly generated and shuffled deck.
    ///
    /// The deck follows `config.composition`; shuffling uses `config.seed`
    /// when set.
    pub fn new(id: SessionId, config: EngineConfig) -> Result<Self, EngineError> {
        let config = config.validated();
        let mut rng = seeded_rng(config.seed);
        let deck = shedder_cards::shuffle_with(&config.composition.build(), &mut rng);
        Self::from_parts(id, config, deck, rng)
    }

    /// Creates a session from a deck in the given order (top first).
    ///
    /// Nothing is shuffled here, which makes dealing fully predictable.
    pub fn with_deck(
        id: SessionId,
        config: EngineConfig,
        deck: Deck,
    ) -> Result<Self, EngineError> {
        let config = config.validated();
        let rng = seeded_rng(config.seed);
        Self::from_parts(id, config, deck, rng)
    }

    fn from_parts(
        id: SessionId,
        config: EngineConfig,
        deck: Deck,
        rng: StdRng,
    ) -> Result<Self, EngineError> {
        let mut draw_pile = Deck::pile_from(deck);

        // The first card flipped must not be wild; wilds go to the bottom.
        let mut buried = Vec::new();
        let top = loop {
            match draw_pile.draw() {
                Some(card) if card.is_wild() => buried.push(card),
                Some(card) => break card,
                None => return Err(EngineError::DeckExhausted),
            }
        };
        draw_pile.extend(buried);

        debug!(session_id = %id, top = %top, draw_pile = draw_pile.len(), "session created");

        Ok(Self {
            id,
            players: Vec::new(),
            discard_top: top,
            active_color: top.color,
            discard_pile: Vec::new(),
            draw_pile,
            state: SessionState::WaitingForPlayers,
            active_index: 0,
            direction: Direction::Forward,
            winner: None,
            history: AuditLog::default(),
            config,
            rng,
        })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Adds a player and deals them `hand_size` cards from the draw pile.
    ///
    /// # Errors
    ///
    /// - [`EngineError::DuplicatePlayer`] if `id` already joined.
    /// - [`EngineError::SessionAlreadyStarted`] outside `WaitingForPlayers`.
    /// - [`EngineError::SessionFull`] at `max_players`.
    /// - [`EngineError::DeckExhausted`] if the draw pile cannot deal a hand.
    pub fn add_player(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
    ) -> Result<(), EngineError> {
        if self.player_index(&id).is_some() {
            return Err(EngineError::DuplicatePlayer(id));
        }
        if !self.state.is_joinable() {
            return Err(EngineError::SessionAlreadyStarted);
        }
        if self.players.len() >= self.config.max_players {
            return Err(EngineError::SessionFull {
                max: self.config.max_players,
            });
        }
        if self.draw_pile.len() < self.config.hand_size {
            return Err(EngineError::DeckExhausted);
        }

        let hand = Deck::hand_from(self.draw_pile.draw_many(self.config.hand_size));
        info!(
            session_id = %self.id,
            player_id = %id,
            players = self.players.len() + 1,
            "player joined"
        );
        self.players.push(Player {
            id,
            name: name.into(),
            hand,
            in_game: true,
        });
        Ok(())
    }

    /// Moves `WaitingForPlayers → InProgress`. The first player to join
    /// takes the first turn.
    pub fn start(&mut self) -> Result<(), EngineError> {
        match self.state {
            SessionState::WaitingForPlayers => {}
            state if state.is_terminal() => return Err(EngineError::SessionTerminated(state)),
            _ => return Err(EngineError::SessionAlreadyStarted),
        }
        if self.players.len() < self.config.min_players {
            return Err(EngineError::NotEnoughPlayers {
                have: self.players.len(),
                need: self.config.min_players,
            });
        }

        self.state = SessionState::InProgress;
        self.active_index = 0;
        self.direction = Direction::Forward;
        info!(session_id = %self.id, players = self.players.len(), "session started");
        Ok(())
    }

    /// Moves any non-terminal session to `Cancelled`.
    ///
    /// Returns `false` if the session had already ended.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.finish(SessionState::Cancelled);
        info!(session_id = %self.id, "session cancelled");
        true
    }

    pub(crate) fn finish(&mut self, state: SessionState) {
        debug_assert!(self.state.can_transition_to(state));
        self.state = state;
        for player in &mut self.players {
            player.in_game = false;
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn contains_player(&self, id: &PlayerId) -> bool {
        self.player_index(id).is_some()
    }

    pub fn discard_top(&self) -> Card {
        self.discard_top
    }

    pub fn active_color(&self) -> Color {
        self.active_color
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    /// Applied actions, oldest first.
    pub fn history(&self) -> &AuditLog {
        &self.history
    }

    /// Number of actions applied so far.
    pub fn version(&self) -> u64 {
        self.history.len() as u64
    }

    /// The player whose turn it is. `None` unless `InProgress`.
    pub fn active_player(&self) -> Option<&Player> {
        if self.state != SessionState::InProgress {
            return None;
        }
        self.players.get(self.active_index)
    }

    /// Total cards across all piles and hands.
    pub fn card_count(&self) -> usize {
        1 + self.discard_pile.len()
            + self.draw_pile.len()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    pub(crate) fn player_index(&self, id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| &p.id == id)
    }

    /// A snapshot for `viewer`.
    ///
    /// The viewer's own hand is included in full; every other player
    /// (and every player, for spectators) is reduced to a card count.
    pub fn view(&self, viewer: Option<&PlayerId>) -> SessionView {
        let players = self
            .players
            .iter()
            .map(|p| PlayerView {
                id: p.id.clone(),
                name: p.name.clone(),
                card_count: p.hand.len(),
                hand: (Some(&p.id) == viewer).then(|| p.hand.to_vec()),
                in_game: p.in_game,
            })
            .collect();

        SessionView {
            session_id: self.id.clone(),
            state: self.state,
            players,
            discard_top: self.discard_top,
            active_color: self.active_color,
            active_player: self.active_player().map(|p| p.id.clone()),
            direction: self.direction,
            draw_pile_size: self.draw_pile.len(),
            winner: self.winner.clone(),
            version: self.version(),
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
