//! Applying player actions to a running session.

use shedder_cards::{Card, Color, Deck};
use shedder_protocol::{Action, ActionKind, PlayerId, SessionState};
use tracing::{debug, info};

use crate::error::EngineError;
use crate::rules::{self, Effect};
use crate::audit::AuditEntry;
use crate::session::Session;

/// What an accepted action did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A card left the player's hand and became the top card.
    Played { card: Card, effect: Effect },
    /// The player drew `card`.
    Drew { card: Card },
    /// The turn moved to `next`.
    TurnPassed { next: PlayerId },
    /// The player ended their turn with an empty hand.
    Won { winner: PlayerId },
}

/// An accepted action and its position in the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub seq: u64,
    pub outcome: Outcome,
}

impl Session {
    /// Validates and applies one action from the active player.
    ///
    /// Checks run in this order: the session must be `InProgress`, the
    /// actor must be a player, and it must be their turn. On any error
    /// nothing changes and no audit entry is written.
    pub fn apply(&mut self, action: &Action) -> Result<Applied, EngineError> {
        match self.state {
            SessionState::InProgress => {}
            SessionState::WaitingForPlayers => return Err(EngineError::NotStarted),
            state => return Err(EngineError::SessionTerminated(state)),
        }

        let index = self
            .player_index(&action.player_id)
            .ok_or_else(|| EngineError::UnknownPlayer(action.player_id.clone()))?;
        if index != self.checked_active_index()? {
            return Err(EngineError::NotYourTurn(action.player_id.clone()));
        }

        let outcome = match action.kind {
            ActionKind::PlayCard => {
                let card = action.card.ok_or_else(|| {
                    EngineError::InvalidAction("play_card requires a card".into())
                })?;
                self.play_card(index, card, action.chosen_color)?
            }
            ActionKind::DrawCard => self.draw_card(index)?,
            ActionKind::EndTurn => self.end_turn(index),
        };

        let seq = self.history.len() as u64 + 1;
        self.history.push(AuditEntry {
            seq,
            player_id: action.player_id.clone(),
            kind: action.kind,
            card: match outcome {
                Outcome::Played { card, .. } => Some(card),
                _ => None,
            },
        });
        debug!(
            session_id = %self.id,
            player_id = %action.player_id,
            seq,
            kind = %action.kind,
            "action applied"
        );
        Ok(Applied { seq, outcome })
    }

    fn play_card(
        &mut self,
        index: usize,
        card: Card,
        chosen_color: Option<Color>,
    ) -> Result<Outcome, EngineError> {
        if !self.players[index].hand.contains(&card) {
            return Err(EngineError::CardNotInHand(card));
        }
        let next_color = if card.is_wild() {
            match chosen_color {
                Some(color) if !color.is_wild() => color,
                _ => {
                    return Err(EngineError::InvalidAction(
                        "a wild card requires a chosen color".into(),
                    ));
                }
            }
        } else {
            card.color
        };
        if !rules::is_playable(&card, &self.discard_top, self.active_color) {
            return Err(EngineError::IllegalMove {
                card,
                top: self.discard_top,
                active_color: self.active_color,
            });
        }

        let effect = Effect::of(&card, self.config.draw_four_penalty);
        // The current top joins the discard pile once this play commits.
        let recyclable = if self.config.recycle_discards {
            self.discard_pile.len() + 1
        } else {
            0
        };
        if effect.penalty() > self.draw_pile.len() + recyclable {
            return Err(EngineError::DeckExhausted);
        }

        // Validation done; commit.
        let player = &mut self.players[index];
        player.hand.remove_one(&card);
        let hand_emptied = player.hand.is_empty();
        let previous = std::mem::replace(&mut self.discard_top, card);
        self.discard_pile.push(previous);
        self.active_color = next_color;

        match effect {
            Effect::Reverse => self.direction = self.direction.reversed(),
            Effect::DrawAndSkip { count } => {
                let victim = self.step_from(index, 1);
                self.deal_to(victim, count);
            }
            Effect::None | Effect::Skip | Effect::ChooseColor => {}
        }
        // A player who just emptied their hand keeps the turn so their
        // `EndTurn` can claim the win.
        if effect.skips_next() && !hand_emptied {
            self.active_index = self.step_from(index, 2);
        }

        Ok(Outcome::Played { card, effect })
    }

    fn draw_card(&mut self, index: usize) -> Result<Outcome, EngineError> {
        self.refill_draw_pile();
        let card = self.draw_pile.draw().ok_or(EngineError::DeckExhausted)?;
        self.players[index].hand.push(card);
        Ok(Outcome::Drew { card })
    }

    fn end_turn(&mut self, index: usize) -> Outcome {
        if self.players[index].hand.is_empty() {
            let winner = self.players[index].id.clone();
            self.winner = Some(winner.clone());
            self.finish(SessionState::Completed);
            info!(session_id = %self.id, winner = %winner, "session completed");
            return Outcome::Won { winner };
        }
        self.active_index = self.step_from(index, 1);
        Outcome::TurnPassed {
            next: self.players[self.active_index].id.clone(),
        }
    }

    /// Index `steps` seats away from `index` in the current direction.
    fn step_from(&self, index: usize, steps: usize) -> usize {
        let n = self.players.len() as isize;
        let offset = self.direction.sign() * steps as isize;
        (index as isize + offset).rem_euclid(n) as usize
    }

    fn checked_active_index(&self) -> Result<usize, EngineError> {
        if self.active_index < self.players.len() {
            Ok(self.active_index)
        } else {
            Err(EngineError::InvariantViolation(format!(
                "active index {} out of range for {} players",
                self.active_index,
                self.players.len()
            )))
        }
    }

    /// Moves up to `count` cards from the draw pile into a hand.
    fn deal_to(&mut self, index: usize, count: usize) {
        for _ in 0..count {
            self.refill_draw_pile();
            match self.draw_pile.draw() {
                Some(card) => self.players[index].hand.push(card),
                None => break,
            }
        }
    }

    /// Shuffles the discard pile back in when the draw pile is empty.
    fn refill_draw_pile(&mut self) {
        if !self.draw_pile.is_empty()
            || !self.config.recycle_discards
            || self.discard_pile.is_empty()
        {
            return;
        }
        let mut pile = Deck::pile_from(self.discard_pile.drain(..));
        pile.shuffle_with(&mut self.rng);
        debug!(session_id = %self.id, cards = pile.len(), "recycled discard pile");
        self.draw_pile = pile;
    }
}

#[cfg(test)]
mod tests {
    use shedder_cards::Value;
    use shedder_protocol::{Direction, SessionId};

    use super::*;
    use crate::config::EngineConfig;

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s)
    }

    fn c(color: Color, value: Value) -> Card {
        Card::new(color, value)
    }

    /// Builds a started session with explicit hands.
    ///
    /// `top` is flipped first, then each hand is dealt in order, and
    /// `rest` stays in the draw pile.
    fn rigged(top: Card, hands: &[&[Card]], rest: &[Card]) -> Session {
        let hand_size = hands[0].len();
        let mut cards = vec![top];
        for hand in hands {
            assert_eq!(hand.len(), hand_size);
            cards.extend_from_slice(hand);
        }
        cards.extend_from_slice(rest);
        let config = EngineConfig {
            hand_size,
            seed: Some(1),
            ..EngineConfig::default()
        };
        let mut session =
            Session::with_deck(SessionId::new("t"), config, Deck::pile_from(cards)).unwrap();
        for (i, _) in hands.iter().enumerate() {
            let id = ["a", "b", "c", "d"][i];
            session.add_player(pid(id), id.to_uppercase()).unwrap();
        }
        session.start().unwrap();
        session
    }

    fn active(session: &Session) -> PlayerId {
        session.active_player().unwrap().id.clone()
    }

    // =======================================================================
    // guards
    // =======================================================================

    #[test]
    fn test_apply_before_start_not_started() {
        let mut session = Session::new(SessionId::new("s"), EngineConfig::default()).unwrap();
        session.add_player(pid("a"), "A").unwrap();
        let err = session.apply(&Action::draw(pid("a"))).unwrap_err();
        assert_eq!(err, EngineError::NotStarted);
    }

    #[test]
    fn test_apply_unknown_player_rejected() {
        let mut session = rigged(c(Color::Red, Value::One), &[&[], &[]], &[]);
        let err = session.apply(&Action::draw(pid("zed"))).unwrap_err();
        assert_eq!(err, EngineError::UnknownPlayer(pid("zed")));
    }

    #[test]
    fn test_apply_not_your_turn() {
        let mut session = rigged(
            c(Color::Red, Value::One),
            &[&[c(Color::Red, Value::Two)], &[c(Color::Red, Value::Three)]],
            &[],
        );
        let err = session
            .apply(&Action::play(pid("b"), c(Color::Red, Value::Three)))
            .unwrap_err();
        assert_eq!(err, EngineError::NotYourTurn(pid("b")));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_play_without_card_invalid() {
        let mut session = rigged(c(Color::Red, Value::One), &[&[], &[]], &[]);
        let mut action = Action::draw(pid("a"));
        action.kind = ActionKind::PlayCard;
        let err = session.apply(&action).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction(_)));
    }

    #[test]
    fn test_play_card_not_in_hand() {
        let mut session = rigged(
            c(Color::Red, Value::One),
            &[&[c(Color::Red, Value::Two)], &[c(Color::Red, Value::Three)]],
            &[],
        );
        let err = session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::Nine)))
            .unwrap_err();
        assert_eq!(err, EngineError::CardNotInHand(c(Color::Red, Value::Nine)));
    }

    #[test]
    fn test_play_wild_without_color_invalid() {
        let mut session = rigged(
            c(Color::Red, Value::One),
            &[&[Card::wild()], &[c(Color::Red, Value::Three)]],
            &[],
        );
        let err = session.apply(&Action::play(pid("a"), Card::wild())).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction(_)));
        let err = session
            .apply(&Action::play_wild(pid("a"), Card::wild(), Color::Wild))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAction(_)));
    }

    // =======================================================================
    // play_card
    // =======================================================================

    #[test]
    fn test_illegal_play_leaves_state_unchanged() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[c(Color::Blue, Value::Six), c(Color::Red, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
            ],
            &[c(Color::Yellow, Value::Seven)],
        );
        let before = session.view(Some(&pid("a")));

        let err = session
            .apply(&Action::play(pid("a"), c(Color::Blue, Value::Six)))
            .unwrap_err();
        assert!(matches!(err, EngineError::IllegalMove { .. }));
        assert_eq!(session.view(Some(&pid("a"))), before);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_play_matching_color_replaces_top() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[c(Color::Red, Value::Nine), c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
            ],
            &[],
        );
        let applied = session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::Nine)))
            .unwrap();
        assert_eq!(applied.seq, 1);
        assert_eq!(session.discard_top(), c(Color::Red, Value::Nine));
        assert_eq!(session.discard_pile(), &[c(Color::Red, Value::Five)]);
        assert_eq!(session.player(&pid("a")).unwrap().hand.len(), 1);
        // Turn only moves on end_turn.
        assert_eq!(active(&session), pid("a"));
    }

    #[test]
    fn test_play_matching_value_changes_color() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[c(Color::Blue, Value::Five), c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
            ],
            &[],
        );
        session
            .apply(&Action::play(pid("a"), c(Color::Blue, Value::Five)))
            .unwrap();
        assert_eq!(session.active_color(), Color::Blue);
    }

    #[test]
    fn test_play_wild_sets_chosen_color() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[Card::wild(), c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
            ],
            &[],
        );
        session
            .apply(&Action::play_wild(pid("a"), Card::wild(), Color::Green))
            .unwrap();
        assert_eq!(session.discard_top(), Card::wild());
        assert_eq!(session.active_color(), Color::Green);
    }

    #[test]
    fn test_skip_passes_over_next_player() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[c(Color::Red, Value::Skip), c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
                &[c(Color::Yellow, Value::Two), c(Color::Yellow, Value::Three)],
            ],
            &[],
        );
        session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::Skip)))
            .unwrap();
        assert_eq!(active(&session), pid("c"));
    }

    #[test]
    fn test_reverse_flips_direction() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[c(Color::Red, Value::Reverse), c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
                &[c(Color::Yellow, Value::Two), c(Color::Yellow, Value::Three)],
            ],
            &[],
        );
        session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::Reverse)))
            .unwrap();
        assert_eq!(session.direction(), Direction::Backward);
        session.apply(&Action::end_turn(pid("a"))).unwrap();
        assert_eq!(active(&session), pid("c"));
    }

    #[test]
    fn test_draw_two_penalizes_and_skips_next() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[c(Color::Red, Value::DrawTwo), c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
                &[c(Color::Yellow, Value::Two), c(Color::Yellow, Value::Three)],
            ],
            &[c(Color::Blue, Value::Seven), c(Color::Blue, Value::Eight)],
        );
        session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::DrawTwo)))
            .unwrap();
        assert_eq!(session.player(&pid("b")).unwrap().hand.len(), 4);
        assert_eq!(session.draw_pile_len(), 0);
        assert_eq!(active(&session), pid("c"));
    }

    #[test]
    fn test_wild_draw_four_uses_configured_penalty() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[Card::wild_draw_four(), c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
            ],
            &[
                c(Color::Blue, Value::Six),
                c(Color::Blue, Value::Seven),
                c(Color::Blue, Value::Eight),
                c(Color::Blue, Value::Nine),
            ],
        );
        let applied = session
            .apply(&Action::play_wild(pid("a"), Card::wild_draw_four(), Color::Yellow))
            .unwrap();
        assert_eq!(
            applied.outcome,
            Outcome::Played {
                card: Card::wild_draw_four(),
                effect: Effect::DrawAndSkip { count: 4 }
            }
        );
        assert_eq!(session.player(&pid("b")).unwrap().hand.len(), 6);
        assert_eq!(session.active_color(), Color::Yellow);
        // Two players: skipping the next player returns to the actor.
        assert_eq!(active(&session), pid("a"));
    }

    #[test]
    fn test_penalty_beyond_available_cards_rejected() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[c(Color::Red, Value::DrawTwo), c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
            ],
            &[],
        );
        session.config.recycle_discards = false;
        let err = session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::DrawTwo)))
            .unwrap_err();
        assert_eq!(err, EngineError::DeckExhausted);
        assert_eq!(session.discard_top(), c(Color::Red, Value::Five));
        assert_eq!(session.player(&pid("a")).unwrap().hand.len(), 2);
    }

    #[test]
    fn test_skip_as_last_card_keeps_turn() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[&[c(Color::Red, Value::Skip)], &[c(Color::Green, Value::Two)]],
            &[],
        );
        session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::Skip)))
            .unwrap();
        assert_eq!(active(&session), pid("a"));
        let applied = session.apply(&Action::end_turn(pid("a"))).unwrap();
        assert_eq!(applied.outcome, Outcome::Won { winner: pid("a") });
    }

    // =======================================================================
    // draw_card
    // =======================================================================

    #[test]
    fn test_draw_card_moves_top_of_pile_to_hand() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[&[c(Color::Blue, Value::One)], &[c(Color::Green, Value::Two)]],
            &[c(Color::Yellow, Value::Seven)],
        );
        let applied = session.apply(&Action::draw(pid("a"))).unwrap();
        assert_eq!(
            applied.outcome,
            Outcome::Drew {
                card: c(Color::Yellow, Value::Seven)
            }
        );
        assert_eq!(session.player(&pid("a")).unwrap().hand.len(), 2);
        assert_eq!(session.draw_pile_len(), 0);
    }

    #[test]
    fn test_draw_card_recycles_discards() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[c(Color::Red, Value::Six), c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two), c(Color::Green, Value::Three)],
            ],
            &[],
        );
        session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::Six)))
            .unwrap();
        let applied = session.apply(&Action::draw(pid("a"))).unwrap();
        assert_eq!(
            applied.outcome,
            Outcome::Drew {
                card: c(Color::Red, Value::Five)
            }
        );
        assert!(session.discard_pile().is_empty());
        assert_eq!(session.card_count(), 5);
    }

    #[test]
    fn test_draw_card_exhausted() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[&[c(Color::Blue, Value::One)], &[c(Color::Green, Value::Two)]],
            &[],
        );
        let err = session.apply(&Action::draw(pid("a"))).unwrap_err();
        assert_eq!(err, EngineError::DeckExhausted);
        assert!(session.history().is_empty());
    }

    // =======================================================================
    // end_turn
    // =======================================================================

    #[test]
    fn test_end_turn_steps_once_and_wraps() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[
                &[c(Color::Blue, Value::One)],
                &[c(Color::Green, Value::Two)],
                &[c(Color::Yellow, Value::Two)],
            ],
            &[],
        );
        for expected in ["b", "c", "a"] {
            let current = active(&session);
            let applied = session.apply(&Action::end_turn(current)).unwrap();
            assert_eq!(applied.outcome, Outcome::TurnPassed { next: pid(expected) });
        }
        assert_eq!(session.version(), 3);
    }

    #[test]
    fn test_end_turn_with_empty_hand_wins() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[&[c(Color::Red, Value::Six)], &[c(Color::Green, Value::Two)]],
            &[],
        );
        session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::Six)))
            .unwrap();
        session.apply(&Action::end_turn(pid("a"))).unwrap();

        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.winner(), Some(&pid("a")));
        assert!(session.active_player().is_none());

        let err = session.apply(&Action::draw(pid("b"))).unwrap_err();
        assert_eq!(err, EngineError::SessionTerminated(SessionState::Completed));
    }

    #[test]
    fn test_history_records_played_cards() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[&[c(Color::Red, Value::Six)], &[c(Color::Green, Value::Two)]],
            &[],
        );
        session
            .apply(&Action::play(pid("a"), c(Color::Red, Value::Six)))
            .unwrap();
        let entry = session.history().get(0).unwrap();
        assert_eq!(entry.seq, 1);
        assert_eq!(entry.kind, ActionKind::PlayCard);
        assert_eq!(entry.card, Some(c(Color::Red, Value::Six)));
    }

    #[test]
    fn test_corrupted_active_index_is_invariant_violation() {
        let mut session = rigged(
            c(Color::Red, Value::Five),
            &[&[c(Color::Blue, Value::One)], &[c(Color::Green, Value::Two)]],
            &[],
        );
        session.active_index = 7;
        let err = session.apply(&Action::draw(pid("a"))).unwrap_err();
        assert!(err.is_fatal());
    }
}
