//! Deck composition rules and the shuffle collaborator.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Card, Color, Deck, Value};

/// How many copies of each card a freshly generated deck holds.
///
/// The standard 108-card deck has, per suited color, one `Zero` and two
/// of every other value, plus four of each wild card. Older deployments
/// used one of everything and a single wild of each kind; that variant is
/// kept as [`DeckComposition::single`] so both can be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckComposition {
    /// Copies of `Zero` per suited color.
    pub zeros_per_color: usize,
    /// Copies of `One..Nine`, `Skip`, `Reverse`, `DrawTwo` per suited color.
    pub copies_per_color: usize,
    /// Copies of `WildCard`.
    pub wild_cards: usize,
    /// Copies of `WildDrawFour`.
    pub wild_draw_fours: usize,
}

impl DeckComposition {
    /// The standard 108-card composition.
    pub const fn standard() -> Self {
        Self {
            zeros_per_color: 1,
            copies_per_color: 2,
            wild_cards: 4,
            wild_draw_fours: 4,
        }
    }

    /// One of every suited card and a single wild of each kind (54 cards).
    pub const fn single() -> Self {
        Self {
            zeros_per_color: 1,
            copies_per_color: 1,
            wild_cards: 1,
            wild_draw_fours: 1,
        }
    }

    /// Total number of cards this composition produces.
    pub fn total(&self) -> usize {
        let per_color = self.zeros_per_color + 12 * self.copies_per_color;
        Color::SUITED.len() * per_color + self.wild_cards + self.wild_draw_fours
    }

    /// Builds an unshuffled deck: suited cards color by color, then wilds.
    pub fn build(&self) -> Deck {
        let mut cards = Vec::with_capacity(self.total());
        for color in Color::SUITED {
            for value in Value::NUMBERS.into_iter().chain(Value::ACTIONS) {
                let copies = if value == Value::Zero {
                    self.zeros_per_color
                } else {
                    self.copies_per_color
                };
                cards.extend(std::iter::repeat_n(Card::new(color, value), copies));
            }
        }
        cards.extend(std::iter::repeat_n(Card::wild(), self.wild_cards));
        cards.extend(std::iter::repeat_n(
            Card::wild_draw_four(),
            self.wild_draw_fours,
        ));
        Deck::pile_from(cards)
    }
}

impl Default for DeckComposition {
    fn default() -> Self {
        Self::standard()
    }
}

/// Generates the standard 108-card deck, unshuffled.
pub fn generate_full_deck() -> Deck {
    DeckComposition::standard().build()
}

/// Returns a uniformly shuffled copy of `deck` using the thread RNG.
pub fn shuffle(deck: &Deck) -> Deck {
    shuffle_with(deck, &mut rand::rng())
}

/// Returns a uniformly shuffled copy of `deck` using `rng`.
pub fn shuffle_with<R: Rng + ?Sized>(deck: &Deck, rng: &mut R) -> Deck {
    let mut shuffled = deck.clone();
    shuffled.shuffle_with(rng);
    shuffled
}
