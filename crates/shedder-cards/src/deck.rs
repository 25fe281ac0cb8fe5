//! Ordered card containers: player hands and shared piles.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::Card;

/// An ordered sequence of cards.
///
/// Draws always come off the front; discards and refills go on the back.
/// `is_player_deck` distinguishes a hand from a shared pile, which only
/// matters to consumers deciding what to reveal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Deck {
    cards: VecDeque<Card>,
    is_player_deck: bool,
}

impl Deck {
    /// An empty shared pile.
    pub fn pile() -> Self {
        Self {
            cards: VecDeque::new(),
            is_player_deck: false,
        }
    }

    /// An empty player hand.
    pub fn hand() -> Self {
        Self {
            cards: VecDeque::new(),
            is_player_deck: true,
        }
    }

    /// A shared pile holding `cards` in the given order.
    pub fn pile_from(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
            is_player_deck: false,
        }
    }

    /// A player hand holding `cards` in the given order.
    pub fn hand_from(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
            is_player_deck: true,
        }
    }

    pub fn is_player_deck(&self) -> bool {
        self.is_player_deck
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Removes and returns the front card.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    /// Removes up to `n` cards from the front.
    pub fn draw_many(&mut self, n: usize) -> Vec<Card> {
        let n = n.min(self.cards.len());
        self.cards.drain(..n).collect()
    }

    /// Appends a card to the back.
    pub fn push(&mut self, card: Card) {
        self.cards.push_back(card);
    }

    /// Appends every card from `cards` to the back, preserving order.
    pub fn extend(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    /// Returns `true` if at least one card equal to `card` is present.
    pub fn contains(&self, card: &Card) -> bool {
        self.cards.contains(card)
    }

    /// Removes exactly one card equal to `card` (the first one found).
    ///
    /// Returns `None`, leaving the deck untouched, when no such card exists.
    pub fn remove_one(&mut self, card: &Card) -> Option<Card> {
        let index = self.cards.iter().position(|c| c == card)?;
        self.cards.remove(index)
    }

    /// The card that the next [`draw`](Self::draw) would return.
    pub fn peek(&self) -> Option<&Card> {
        self.cards.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Copies the cards into a `Vec`, front first.
    pub fn to_vec(&self) -> Vec<Card> {
        self.cards.iter().copied().collect()
    }

    /// Shuffles the deck in place with the given RNG.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.make_contiguous().shuffle(rng);
    }
}

impl IntoIterator for Deck {
    type Item = Card;
    type IntoIter = std::collections::vec_deque::IntoIter<Card>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.into_iter()
    }
}
