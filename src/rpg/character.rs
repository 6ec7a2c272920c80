//! Player and enemy characters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rpg::progression::XP_PER_LEVEL;

/// Stats shared by the player and enemies.
///
/// Unsigned fields keep gold and xp non-negative; every mutator clamps hp
/// into `[0, max_hp]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Display name.
    pub name: String,
    /// Current hit points.
    pub hp: u32,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Attack stat; upper bound of the random part of a strike.
    pub attack: u32,
    /// Gold carried.
    pub gold: u32,
    /// Level, starting at 1.
    pub level: u32,
    /// Experience towards the next level.
    pub xp: u32,
}

/// Why a persisted character could not be restored.
#[derive(Debug, Error)]
pub enum CharacterDecodeError {
    /// The stored text is not a character record.
    #[error("malformed character record: {0}")]
    Json(#[from] serde_json::Error),
    /// The record parsed but breaks a character invariant.
    #[error("inconsistent character record: {0}")]
    Inconsistent(&'static str),
}

impl Character {
    /// The default starting player.
    #[must_use]
    pub fn hero() -> Self {
        Self {
            name: "Hero".to_string(),
            hp: 100,
            max_hp: 100,
            attack: 20,
            gold: 0,
            level: 1,
            xp: 0,
        }
    }

    /// A fresh enemy carrying `gold`.
    #[must_use]
    pub fn goblin(gold: u32) -> Self {
        Self {
            name: "Goblin".to_string(),
            hp: 50,
            max_hp: 50,
            attack: 15,
            gold,
            level: 1,
            xp: 0,
        }
    }

    /// Whether hp has reached zero.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.hp == 0
    }

    /// Remove hp, stopping at zero. Returns `true` if this defeated the
    /// character.
    pub fn take_damage(&mut self, damage: u32) -> bool {
        self.hp = self.hp.saturating_sub(damage);
        self.is_defeated()
    }

    /// Restore hp, stopping at `max_hp`.
    pub fn heal(&mut self, amount: u32) {
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
    }

    /// Restore hp to `max_hp`.
    pub fn heal_fully(&mut self) {
        self.hp = self.max_hp;
    }

    /// Add gold.
    pub fn earn(&mut self, gold: u32) {
        self.gold = self.gold.saturating_add(gold);
    }

    /// Pay `cost` if affordable. Returns `false` and leaves gold untouched
    /// otherwise.
    pub fn spend(&mut self, cost: u32) -> bool {
        match self.gold.checked_sub(cost) {
            Some(rest) => {
                self.gold = rest;
                true
            }
            None => false,
        }
    }

    /// Check the invariants a restored record must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`CharacterDecodeError::Inconsistent`] naming the broken rule.
    pub fn validate(&self) -> Result<(), CharacterDecodeError> {
        if self.level == 0 {
            return Err(CharacterDecodeError::Inconsistent("level must be at least 1"));
        }
        if self.level.checked_mul(XP_PER_LEVEL).is_none() {
            return Err(CharacterDecodeError::Inconsistent("level is past the experience curve"));
        }
        if self.hp > self.max_hp {
            return Err(CharacterDecodeError::Inconsistent("hp exceeds maxHp"));
        }
        Ok(())
    }

    /// Serialize for the persistence store.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse and validate a persisted record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is not valid JSON for a character or
    /// breaks an invariant.
    pub fn decode(raw: &str) -> Result<Self, CharacterDecodeError> {
        let character: Self = serde_json::from_str(raw)?;
        character.validate()?;
        Ok(character)
    }
}

impl Default for Character {
    fn default() -> Self {
        Self::hero()
    }
}
