//! Turn-based exploration and combat RPG.
//!
//! - Static tile grid with enemies, a shop and an inn ([`GridWorld`])
//! - Experience curve and stat growth ([`apply_xp`])
//! - Damage exchange between the player and an enemy ([`Encounter`])
//! - The World/Combat/Shop/Inn state machine tying it together
//!   ([`RpgSession`])

mod character;
mod combat;
mod progression;
mod session;
mod world;

pub use character::{Character, CharacterDecodeError};
pub use combat::{
    Encounter, EncounterId, Retaliation, Reward, Stance, Strike, enemy_damage, player_damage,
    retaliate, ENEMY_BASE_DAMAGE, KILL_XP, PLAYER_BASE_DAMAGE,
};
pub use progression::{apply_xp, xp_to_next_level, Progress};
pub use session::{
    next_step_toward, Mode, Outcome, RpgCommand, RpgSession, RpgSnapshot, RpgStats, POTION_COST,
    POTION_HEAL, REST_COST, SWORD_ATTACK, SWORD_COST,
};
pub use world::{GridWorld, Tile};
