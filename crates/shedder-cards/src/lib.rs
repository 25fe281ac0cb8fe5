//! Card model for Shedder.
//!
//! Pure data: [`Card`] identity, the [`Deck`] container used for both
//! hands and shared piles, and [`DeckComposition`] for generating full
//! decks. Shuffling is provided by [`shuffle`] / [`shuffle_with`].

mod card;
mod composition;
mod deck;

pub use card::{Card, Color, Value};
pub use composition::{DeckComposition, generate_full_deck, shuffle, shuffle_with};
pub use deck::Deck;
