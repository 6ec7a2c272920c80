//! Experience curve and stat growth.

use crate::rpg::Character;

/// Experience needed per level: level `n` needs `n * XP_PER_LEVEL`.
pub(crate) const XP_PER_LEVEL: u32 = 100;
/// Max hp gained per level.
const MAX_HP_PER_LEVEL: u32 = 10;
/// Attack gained per level.
const ATTACK_PER_LEVEL: u32 = 2;
/// Hp restored per level, clamped to the new max.
const LEVEL_UP_HEAL: u32 = 10;

/// Experience required to leave `level`.
#[must_use]
pub const fn xp_to_next_level(level: u32) -> u32 {
    level.saturating_mul(XP_PER_LEVEL)
}

/// Result of [`apply_xp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// The character after experience and any level-ups.
    pub character: Character,
    /// Number of levels gained.
    pub levels_gained: u32,
}

impl Progress {
    /// Whether at least one level was gained.
    #[must_use]
    pub const fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Add experience and apply every level-up it pays for.
///
/// The threshold is re-checked after each level, so one large gain can
/// raise several levels, each at its own (growing) cost.
#[must_use]
pub fn apply_xp(character: &Character, xp_gained: u32) -> Progress {
    let mut next = character.clone();
    next.level = next.level.max(1);
    next.xp = next.xp.saturating_add(xp_gained);

    let mut levels_gained = 0;
    loop {
        let threshold = xp_to_next_level(next.level);
        if next.xp < threshold {
            break;
        }
        let Some(level) = next.level.checked_add(1) else {
            break;
        };
        next.xp -= threshold;
        next.level = level;
        next.max_hp = next.max_hp.saturating_add(MAX_HP_PER_LEVEL);
        next.attack = next.attack.saturating_add(ATTACK_PER_LEVEL);
        next.heal(LEVEL_UP_HEAL);
        levels_gained += 1;
    }

    Progress {
        character: next,
        levels_gained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_grows_with_level() {
        assert_eq!(xp_to_next_level(1), 100);
        assert_eq!(xp_to_next_level(2), 200);
        assert_eq!(xp_to_next_level(7), 700);
    }

    #[test]
    fn test_below_threshold_unchanged() {
        let hero = Character::hero();
        let progress = apply_xp(&hero, 20);
        assert!(!progress.leveled_up());
        assert_eq!(progress.character.level, 1);
        assert_eq!(progress.character.xp, 20);
        assert_eq!(progress.character.max_hp, 100);
    }

    #[test]
    fn test_rechecks_threshold_after_each_level() {
        // 250 xp at level 1: pay 100 to reach level 2, then 150 < 200 stops.
        let hero = Character::hero();
        let progress = apply_xp(&hero, 250);
        assert_eq!(progress.levels_gained, 1);
        assert_eq!(progress.character.level, 2);
        assert_eq!(progress.character.xp, 150);
    }

    #[test]
    fn test_multi_level_gain() {
        // 100 + 200 + 300 = 600 buys three levels with 5 left over.
        let hero = Character::hero();
        let progress = apply_xp(&hero, 605);
        assert_eq!(progress.levels_gained, 3);
        assert_eq!(progress.character.level, 4);
        assert_eq!(progress.character.xp, 5);
        assert_eq!(progress.character.max_hp, 130);
        assert_eq!(progress.character.attack, 26);
    }

    #[test]
    fn test_level_up_heal_clamped() {
        let mut hero = Character::hero();
        hero.hp = 95;
        hero.xp = 90;
        let progress = apply_xp(&hero, 20);
        assert_eq!(progress.character.max_hp, 110);
        assert_eq!(progress.character.hp, 105);

        let mut full = Character::hero();
        full.xp = 90;
        let progress = apply_xp(&full, 20);
        assert_eq!(progress.character.hp, 110);
    }

    #[test]
    fn test_top_level_stops_instead_of_overflowing() {
        let mut capped = Character::hero();
        capped.level = u32::MAX;
        capped.xp = u32::MAX;
        let progress = apply_xp(&capped, 0);
        assert!(!progress.leveled_up());
        assert_eq!(progress.character.level, u32::MAX);
    }

    #[test]
    fn test_idempotent_below_threshold() {
        let hero = Character::hero();
        let once = apply_xp(&hero, 50).character;
        let twice = apply_xp(&once, 0).character;
        assert_eq!(once, twice);
    }
}
