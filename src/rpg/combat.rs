//! Combat resolution between the player and a single enemy.
//!
//! A strike is split into a roll ([`player_damage`], [`enemy_damage`]) and
//! its application ([`Encounter::strike`], [`retaliate`]), so the session
//! can roll now and apply later, and tests can apply exact damage.

use crate::dice::Dice;
use crate::grid::Position;
use crate::rpg::Character;

/// Flat damage added to every player strike.
pub const PLAYER_BASE_DAMAGE: u32 = 10;
/// Flat damage added to every enemy strike.
pub const ENEMY_BASE_DAMAGE: u32 = 5;
/// Experience awarded for a kill.
pub const KILL_XP: u32 = 20;

/// Identifies one encounter so delayed enemy turns can tell whether the
/// fight they belong to is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncounterId(pub u64);

/// What the player did before the enemy's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    /// The player attacked; the enemy hits at full strength.
    Attacking,
    /// The player defended; the enemy's damage is halved.
    Defending,
}

/// Loot for a kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reward {
    /// Gold taken from the enemy.
    pub gold: u32,
    /// Experience gained.
    pub xp: u32,
}

/// Result of a player strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strike {
    /// The enemy survived.
    Hit {
        /// Damage dealt.
        damage: u32,
        /// Enemy hp left.
        enemy_hp: u32,
    },
    /// The enemy's hp reached zero.
    Kill {
        /// Damage dealt.
        damage: u32,
        /// Loot for the kill.
        reward: Reward,
    },
}

/// Result of an enemy strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retaliation {
    /// The player survived.
    Hit {
        /// Damage taken.
        damage: u32,
        /// Player hp left.
        player_hp: u32,
    },
    /// The player's hp reached zero.
    Defeated {
        /// Damage taken.
        damage: u32,
    },
}

/// A running fight against one enemy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encounter {
    /// Identity of this fight.
    pub id: EncounterId,
    /// The enemy.
    pub enemy: Character,
    /// The tile the enemy came from.
    pub origin: Position,
}

impl Encounter {
    /// Start a fight.
    #[must_use]
    pub const fn new(id: EncounterId, enemy: Character, origin: Position) -> Self {
        Self { id, enemy, origin }
    }

    /// Apply `damage` to the enemy, floored at zero.
    pub fn strike(&mut self, damage: u32) -> Strike {
        if self.enemy.take_damage(damage) {
            Strike::Kill {
                damage,
                reward: Reward {
                    gold: self.enemy.gold,
                    xp: KILL_XP,
                },
            }
        } else {
            Strike::Hit {
                damage,
                enemy_hp: self.enemy.hp,
            }
        }
    }
}

/// Roll a player strike: uniform in `[10, attack + 9]`.
pub fn player_damage(dice: &mut impl Dice, attack: u32) -> u32 {
    dice.roll(attack) + PLAYER_BASE_DAMAGE
}

/// Roll an enemy strike: uniform in `[5, attack + 4]`, halved (rounding
/// down) against a defending player.
pub fn enemy_damage(dice: &mut impl Dice, attack: u32, stance: Stance) -> u32 {
    let damage = dice.roll(attack) + ENEMY_BASE_DAMAGE;
    match stance {
        Stance::Attacking => damage,
        Stance::Defending => damage / 2,
    }
}

/// Apply an enemy strike to the player, floored at zero.
pub fn retaliate(player: &mut Character, damage: u32) -> Retaliation {
    if player.take_damage(damage) {
        Retaliation::Defeated { damage }
    } else {
        Retaliation::Hit {
            damage,
            player_hp: player.hp,
        }
    }
}
