//! Game configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. The defaults reproduce the classic 10x10 RPG map and the 20x20
//! Snake board.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::{Direction, Position};

/// Top-level configuration for both engines.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// Seed for all randomness. `None` seeds from the operating system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// RPG settings.
    pub rpg: RpgConfig,
    /// Snake settings.
    pub snake: SnakeConfig,
}

impl GameConfig {
    /// Read, parse and validate a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check that both games are playable with these values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rpg.validate()?;
        self.snake.validate()
    }
}

/// How enemies, the shop and the inn are placed on the RPG map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorldLayout {
    /// Fixed cells.
    Fixed {
        /// Shop cell, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shop: Option<Position>,
        /// Inn cell, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inn: Option<Position>,
        /// Enemy cells.
        #[serde(default)]
        enemies: Vec<Position>,
    },
    /// Every remaining cell independently becomes an enemy with
    /// `enemy_chance`.
    Scattered {
        /// Probability in `[0, 1]` that a cell holds an enemy.
        enemy_chance: f64,
        /// Shop cell, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        shop: Option<Position>,
        /// Inn cell, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inn: Option<Position>,
    },
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self::Fixed {
            shop: Some(Position::new(0, 0)),
            inn: Some(Position::new(9, 9)),
            enemies: vec![
                Position::new(2, 2),
                Position::new(7, 3),
                Position::new(4, 7),
                Position::new(8, 8),
            ],
        }
    }
}

/// RPG settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpgConfig {
    /// Side length of the square map.
    pub grid_side: i32,
    /// Where the player starts and respawns after defeat.
    pub start: Position,
    /// Interval between path-following steps.
    pub path_step_ms: u64,
    /// Delay before the enemy answers an attack or defend.
    pub enemy_turn_ms: u64,
    /// Delay before a defeated enemy's tile refills.
    pub respawn_ms: u64,
    /// Gold carried by every encountered enemy.
    pub encounter_gold: u32,
    /// Store key for the persisted character.
    pub save_key: String,
    /// Map layout.
    pub layout: WorldLayout,
}

impl Default for RpgConfig {
    fn default() -> Self {
        Self {
            grid_side: 10,
            start: Position::new(5, 5),
            path_step_ms: 200,
            enemy_turn_ms: 1000,
            respawn_ms: 5000,
            encounter_gold: 20,
            save_key: "rpg-player-progress".to_string(),
            layout: WorldLayout::default(),
        }
    }
}

impl RpgConfig {
    /// Path-following step interval.
    #[must_use]
    pub const fn path_step(&self) -> Duration {
        Duration::from_millis(self.path_step_ms)
    }

    /// Enemy turn delay.
    #[must_use]
    pub const fn enemy_turn(&self) -> Duration {
        Duration::from_millis(self.enemy_turn_ms)
    }

    /// Respawn delay.
    #[must_use]
    pub const fn respawn(&self) -> Duration {
        Duration::from_millis(self.respawn_ms)
    }

    /// Check that the RPG is playable with these values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let side = self.grid_side;
        if !(1..=256).contains(&side) {
            return Err(invalid(format!("rpg.grid_side {side} must be in 1..=256")));
        }
        if !self.start.in_bounds(side) {
            return Err(invalid(format!("rpg.start {} is off the map", self.start)));
        }
        if self.path_step_ms == 0 {
            return Err(invalid("rpg.path_step_ms must be positive"));
        }
        if self.enemy_turn_ms == 0 {
            return Err(invalid("rpg.enemy_turn_ms must be positive"));
        }
        if self.respawn_ms == 0 {
            return Err(invalid("rpg.respawn_ms must be positive"));
        }
        if self.save_key.is_empty() {
            return Err(invalid("rpg.save_key must not be empty"));
        }
        let (shop, inn, enemies) = match &self.layout {
            WorldLayout::Fixed { shop, inn, enemies } => (shop, inn, enemies.as_slice()),
            WorldLayout::Scattered {
                enemy_chance,
                shop,
                inn,
            } => {
                if !(0.0..=1.0).contains(enemy_chance) {
                    return Err(invalid(format!(
                        "rpg.layout.enemy_chance {enemy_chance} must be in [0, 1]"
                    )));
                }
                (shop, inn, [].as_slice())
            }
        };
        for pos in shop.iter().chain(inn.iter()).chain(enemies) {
            if !pos.in_bounds(side) {
                return Err(invalid(format!("rpg.layout cell {pos} is off the map")));
            }
        }
        Ok(())
    }
}

/// Snake settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnakeConfig {
    /// Side length of the toroidal board.
    pub board_side: i32,
    /// Interval between frames.
    pub frame_ms: u64,
    /// Initial head cell.
    pub start: Position,
    /// Initial food cell.
    pub food: Position,
    /// Initial heading.
    pub direction: Direction,
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self {
            board_side: 20,
            frame_ms: 200,
            start: Position::new(10, 10),
            food: Position::new(15, 15),
            direction: Direction::Up,
        }
    }
}

impl SnakeConfig {
    /// Frame interval.
    #[must_use]
    pub const fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    /// Check that Snake is playable with these values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let side = self.board_side;
        if !(2..=256).contains(&side) {
            return Err(invalid(format!("snake.board_side {side} must be in 2..=256")));
        }
        if self.frame_ms == 0 {
            return Err(invalid("snake.frame_ms must be positive"));
        }
        if !self.start.in_bounds(side) || !self.food.in_bounds(side) {
            return Err(invalid("snake.start and snake.food must be on the board"));
        }
        if self.start == self.food {
            return Err(invalid("snake.food must not start under the snake"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = GameConfig::from_toml("seed = 9\n[snake]\nframe_ms = 100\n").unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.snake.frame_ms, 100);
        assert_eq!(config.snake.board_side, 20);
        assert_eq!(config.rpg, RpgConfig::default());
    }

    #[test]
    fn test_scattered_layout() {
        let config = GameConfig::from_toml(
            "[rpg.layout]\nkind = \"scattered\"\nenemy_chance = 0.1\nshop = [0, 0]\n",
        )
        .unwrap();
        assert_eq!(
            config.rpg.layout,
            WorldLayout::Scattered {
                enemy_chance: 0.1,
                shop: Some(Position::new(0, 0)),
                inn: None,
            }
        );
    }

    #[test]
    fn test_rejects_bad_chance() {
        let err = GameConfig::from_toml("[rpg.layout]\nkind = \"scattered\"\nenemy_chance = 1.5\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_enemy_turn() {
        let err = GameConfig::from_toml("[rpg]\nenemy_turn_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("rpg.enemy_turn_ms"));
    }

    #[test]
    fn test_rejects_zero_respawn() {
        let err = GameConfig::from_toml("[rpg]\nrespawn_ms = 0\n").unwrap_err();
        assert!(err.to_string().contains("rpg.respawn_ms"));
    }

    #[test]
    fn test_rejects_oversized_board() {
        let snake = SnakeConfig {
            board_side: 50_000,
            ..SnakeConfig::default()
        };
        assert!(matches!(snake.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_off_map_enemy() {
        let err = GameConfig::from_toml("[rpg.layout]\nkind = \"fixed\"\nenemies = [[10, 0]]\n")
            .unwrap_err();
        assert!(err.to_string().contains("off the map"));
    }

    #[test]
    fn test_rejects_unknown_field() {
        assert!(matches!(
            GameConfig::from_toml("[snake]\nspeed = 3\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_default_toml_roundtrip() {
        let text = GameConfig::default().to_toml().unwrap();
        let parsed = GameConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, GameConfig::default());
    }
}
