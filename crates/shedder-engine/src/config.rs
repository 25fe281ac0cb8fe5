//! Engine configuration.

use serde::{Deserialize, Serialize};
use shedder_cards::DeckComposition;
use tracing::warn;

/// Rules and limits for a session.
///
/// Deployments tweak these through `RegistryConfig::engine`; tests
/// usually set `seed` so that dealing is reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum players required to start. Never below 2.
    pub min_players: usize,

    /// Maximum players allowed to join.
    pub max_players: usize,

    /// Cards dealt to each player when they join.
    pub hand_size: usize,

    /// Card multiplicities for the generated deck.
    pub composition: DeckComposition,

    /// When the draw pile runs dry, shuffle the discard pile (everything
    /// under the top card) back in. When `false`, draws fail with
    /// `DeckExhausted` instead.
    pub recycle_discards: bool,

    /// Cards the next player draws after a `WildDrawFour`.
    pub draw_four_penalty: usize,

    /// Seed for shuffling. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 10,
            hand_size: 5,
            composition: DeckComposition::standard(),
            recycle_discards: true,
            draw_four_penalty: 4,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// The smallest `min_players` a session may be configured with.
    pub const MIN_PLAYERS_FLOOR: usize = 2;

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// - `min_players` raised to [`Self::MIN_PLAYERS_FLOOR`].
    /// - `max_players` raised to `min_players`.
    pub fn validated(mut self) -> Self {
        if self.min_players < Self::MIN_PLAYERS_FLOOR {
            warn!(
                min_players = self.min_players,
                floor = Self::MIN_PLAYERS_FLOOR,
                "min_players below floor, clamping"
            );
            self.min_players = Self::MIN_PLAYERS_FLOOR;
        }
        if self.max_players < self.min_players {
            warn!(
                max_players = self.max_players,
                min_players = self.min_players,
                "max_players below min_players, clamping"
            );
            self.max_players = self.min_players;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.hand_size, 5);
        assert_eq!(config.draw_four_penalty, 4);
        assert!(config.recycle_discards);
        assert_eq!(config.composition.total(), 108);
    }

    #[test]
    fn test_validated_clamps_min_and_max() {
        let config = EngineConfig {
            min_players: 1,
            max_players: 0,
            ..EngineConfig::default()
        }
        .validated();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 2);
    }
}
