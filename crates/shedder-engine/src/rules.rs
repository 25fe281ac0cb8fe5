//! Card legality and special-card effects.

use shedder_cards::{Card, Color, Value};

/// Returns `true` if `card` may be played on `top`.
///
/// A card is playable when its color equals the active color, its value
/// equals the top card's value, or it is wild. `active_color` is the top
/// card's color unless a wild card named a different one.
pub fn is_playable(card: &Card, top: &Card, active_color: Color) -> bool {
    card.is_wild() || card.color == active_color || card.value == top.value
}

/// What playing a card does beyond replacing the top card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Numbered cards.
    None,
    /// The next player in rotation loses their turn.
    Skip,
    /// Rotation direction flips.
    Reverse,
    /// The next player draws `count` cards and loses their turn.
    DrawAndSkip { count: usize },
    /// `WildCard`: only the color choice.
    ChooseColor,
}

impl Effect {
    /// The effect of `card`. `draw_four_penalty` sizes `WildDrawFour`.
    pub fn of(card: &Card, draw_four_penalty: usize) -> Self {
        match card.value {
            Value::Skip => Self::Skip,
            Value::Reverse => Self::Reverse,
            Value::DrawTwo => Self::DrawAndSkip { count: 2 },
            Value::WildCard => Self::ChooseColor,
            Value::WildDrawFour => Self::DrawAndSkip {
                count: draw_four_penalty,
            },
            _ => Self::None,
        }
    }

    /// Cards the next player must draw, if any.
    pub fn penalty(&self) -> usize {
        match self {
            Self::DrawAndSkip { count } => *count,
            _ => 0,
        }
    }

    /// Returns `true` if the effect passes the turn past the next player.
    pub fn skips_next(&self) -> bool {
        matches!(self, Self::Skip | Self::DrawAndSkip { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(color: Color, value: Value) -> Card {
        Card::new(color, value)
    }

    #[test]
    fn test_is_playable_same_color() {
        let top = card(Color::Red, Value::Five);
        assert!(is_playable(&card(Color::Red, Value::Nine), &top, Color::Red));
    }

    #[test]
    fn test_is_playable_same_value() {
        let top = card(Color::Red, Value::Five);
        assert!(is_playable(&card(Color::Blue, Value::Five), &top, Color::Red));
    }

    #[test]
    fn test_is_playable_wild_always() {
        let top = card(Color::Red, Value::Five);
        assert!(is_playable(&Card::wild(), &top, Color::Red));
        assert!(is_playable(&Card::wild_draw_four(), &top, Color::Red));
    }

    #[test]
    fn test_is_playable_mismatch_rejected() {
        let top = card(Color::Red, Value::Five);
        assert!(!is_playable(&card(Color::Blue, Value::Six), &top, Color::Red));
    }

    #[test]
    fn test_is_playable_uses_active_color_after_wild() {
        // Top is a wild card; the player who played it chose Green.
        let top = Card::wild();
        assert!(is_playable(&card(Color::Green, Value::Two), &top, Color::Green));
        assert!(!is_playable(&card(Color::Red, Value::Two), &top, Color::Green));
    }

    #[test]
    fn test_effect_of_each_value() {
        assert_eq!(Effect::of(&card(Color::Red, Value::Three), 4), Effect::None);
        assert_eq!(Effect::of(&card(Color::Red, Value::Skip), 4), Effect::Skip);
        assert_eq!(Effect::of(&card(Color::Red, Value::Reverse), 4), Effect::Reverse);
        assert_eq!(
            Effect::of(&card(Color::Red, Value::DrawTwo), 4),
            Effect::DrawAndSkip { count: 2 }
        );
        assert_eq!(Effect::of(&Card::wild(), 4), Effect::ChooseColor);
        assert_eq!(
            Effect::of(&Card::wild_draw_four(), 4),
            Effect::DrawAndSkip { count: 4 }
        );
    }

    #[test]
    fn test_penalty_and_skip_flags() {
        assert_eq!(Effect::DrawAndSkip { count: 2 }.penalty(), 2);
        assert_eq!(Effect::Skip.penalty(), 0);
        assert!(Effect::Skip.skips_next());
        assert!(!Effect::Reverse.skips_next());
    }
}
