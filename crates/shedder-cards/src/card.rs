//! Card identity: a color and a face value.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// The color of a card.
///
/// `Wild` is the color printed on wild cards. It never becomes the
/// active color of a session: playing a wild card always comes with a
/// concrete color choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Wild,
}

impl Color {
    /// The four colors a numbered or action card can have.
    pub const SUITED: [Color; 4] =
        [Color::Red, Color::Blue, Color::Green, Color::Yellow];

    /// Returns `true` for [`Color::Wild`].
    pub fn is_wild(self) -> bool {
        matches!(self, Self::Wild)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "Red"),
            Self::Blue => write!(f, "Blue"),
            Self::Green => write!(f, "Green"),
            Self::Yellow => write!(f, "Yellow"),
            Self::Wild => write!(f, "Wild"),
        }
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// The face value of a card.
///
/// Multi-word values serialize with spaces (`"Draw Two"`), which is the
/// format existing clients already parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Skip,
    Reverse,
    #[serde(rename = "Draw Two")]
    DrawTwo,
    #[serde(rename = "Wild Card")]
    WildCard,
    #[serde(rename = "Wild Draw Four")]
    WildDrawFour,
}

impl Value {
    /// Numbered values in ascending order.
    pub const NUMBERS: [Value; 10] = [
        Value::Zero,
        Value::One,
        Value::Two,
        Value::Three,
        Value::Four,
        Value::Five,
        Value::Six,
        Value::Seven,
        Value::Eight,
        Value::Nine,
    ];

    /// Action values printed on suited cards.
    pub const ACTIONS: [Value; 3] = [Value::Skip, Value::Reverse, Value::DrawTwo];

    /// Returns `true` for the two wild values.
    pub fn is_wild(self) -> bool {
        matches!(self, Self::WildCard | Self::WildDrawFour)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zero => "Zero",
            Self::One => "One",
            Self::Two => "Two",
            Self::Three => "Three",
            Self::Four => "Four",
            Self::Five => "Five",
            Self::Six => "Six",
            Self::Seven => "Seven",
            Self::Eight => "Eight",
            Self::Nine => "Nine",
            Self::Skip => "Skip",
            Self::Reverse => "Reverse",
            Self::DrawTwo => "Draw Two",
            Self::WildCard => "Wild Card",
            Self::WildDrawFour => "Wild Draw Four",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Card
// ---------------------------------------------------------------------------

/// A single card. Two cards are equal when color and value match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub color: Color,
    pub value: Value,
}

impl Card {
    pub const fn new(color: Color, value: Value) -> Self {
        Self { color, value }
    }

    /// A wild card (`Wild` color, `WildCard` value).
    pub const fn wild() -> Self {
        Self::new(Color::Wild, Value::WildCard)
    }

    /// A wild draw four (`Wild` color, `WildDrawFour` value).
    pub const fn wild_draw_four() -> Self {
        Self::new(Color::Wild, Value::WildDrawFour)
    }

    /// Returns `true` if either the color or the value marks this card wild.
    pub fn is_wild(&self) -> bool {
        self.color.is_wild() || self.value.is_wild()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.color.is_wild() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} {}", self.color, self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_equality_by_color_and_value() {
        let a = Card::new(Color::Red, Value::Five);
        let b = Card::new(Color::Red, Value::Five);
        let c = Card::new(Color::Blue, Value::Five);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_card_is_wild() {
        assert!(Card::wild().is_wild());
        assert!(Card::wild_draw_four().is_wild());
        assert!(!Card::new(Color::Green, Value::Skip).is_wild());
    }

    #[test]
    fn test_value_serializes_with_spaces() {
        let json = serde_json::to_string(&Value::DrawTwo).unwrap();
        assert_eq!(json, "\"Draw Two\"");
        let json = serde_json::to_string(&Value::WildDrawFour).unwrap();
        assert_eq!(json, "\"Wild Draw Four\"");
    }

    #[test]
    fn test_card_json_shape() {
        let card = Card::new(Color::Yellow, Value::Reverse);
        let json: serde_json::Value = serde_json::to_value(card).unwrap();
        assert_eq!(json["color"], "Yellow");
        assert_eq!(json["value"], "Reverse");
    }

    #[test]
    fn test_value_rejects_unknown_name() {
        let result: Result<Value, _> = serde_json::from_str("\"Draw Nine\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card::new(Color::Red, Value::Seven).to_string(), "Red Seven");
        assert_eq!(Card::wild().to_string(), "Wild Card");
    }
}
