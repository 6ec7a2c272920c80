//! Session invariants - sanity checks that detect engine bugs.
//!
//! Every reachable state of a correctly implemented session satisfies
//! these. The soak runner calls them after each step; tests use the
//! `assert_*` variants.

use std::collections::HashSet;

use crate::dice::Dice;
use crate::rpg::{xp_to_next_level, Character, Mode, RpgSession, Tile};
use crate::snake::SnakeSession;

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn check_character(who: &str, c: &Character, violations: &mut Vec<InvariantViolation>) {
    if c.hp > c.max_hp {
        violations.push(InvariantViolation::new(format!(
            "{who} hp {} exceeds max {}",
            c.hp, c.max_hp
        )));
    }
    if c.level == 0 {
        violations.push(InvariantViolation::new(format!("{who} level is 0")));
    }
}

/// Check every RPG invariant.
///
/// Returns the violations found, or an empty list if all hold.
#[must_use]
pub fn check_rpg<D: Dice>(session: &RpgSession<D>) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let player = session.player();
    let world = session.world();
    let pos = session.position();

    check_character("player", player, &mut violations);
    if player.xp >= xp_to_next_level(player.level) {
        violations.push(InvariantViolation::new(format!(
            "player xp {} not below level {} threshold {}",
            player.xp,
            player.level,
            xp_to_next_level(player.level)
        )));
    }

    if !world.in_bounds(pos) {
        violations.push(InvariantViolation::new(format!(
            "player at {pos} is off the {}x{} map",
            world.side(),
            world.side()
        )));
    }

    let mode = session.mode();
    match (mode, session.enemy()) {
        (Mode::Combat, None) => {
            violations.push(InvariantViolation::new("combat without an enemy"));
        }
        (Mode::Combat, Some(enemy)) => {
            check_character("enemy", enemy, &mut violations);
            if enemy.is_defeated() {
                violations.push(InvariantViolation::new("combat against a defeated enemy"));
            }
        }
        (_, Some(_)) => {
            violations.push(InvariantViolation::new(format!(
                "enemy present outside combat ({mode:?})"
            )));
        }
        (_, None) => {}
    }

    let expected = match mode {
        Mode::Shop => Some(Tile::Shop),
        Mode::Inn => Some(Tile::Inn),
        Mode::Combat => Some(Tile::Enemy),
        Mode::World => None,
    };
    if let Some(expected) = expected {
        let actual = world.get(pos);
        if actual != Some(expected) {
            violations.push(InvariantViolation::new(format!(
                "{mode:?} at {pos} but the tile is {actual:?}"
            )));
        }
    }

    if mode != Mode::World && session.destination().is_some() {
        violations.push(InvariantViolation::new(format!(
            "travel destination kept in {mode:?}"
        )));
    }

    violations
}

/// Check every Snake invariant.
///
/// Returns the violations found, or an empty list if all hold.
#[must_use]
pub fn check_snake<D: Dice>(session: &SnakeSession<D>) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let side = session.config().board_side;

    if session.is_empty() {
        violations.push(InvariantViolation::new("snake body is empty"));
    }

    let mut seen = HashSet::with_capacity(session.len());
    for segment in session.body() {
        if !segment.in_bounds(side) {
            violations.push(InvariantViolation::new(format!(
                "segment {segment} is off the board"
            )));
        }
        if !seen.insert(segment) {
            violations.push(InvariantViolation::new(format!(
                "segment {segment} appears twice"
            )));
        }
    }

    // The food stays under the head on the frame that fills the board.
    if session.is_alive() && seen.contains(&session.food()) {
        violations.push(InvariantViolation::new(format!(
            "food {} is on the body",
            session.food()
        )));
    }
    if !session.food().in_bounds(side) {
        violations.push(InvariantViolation::new(format!(
            "food {} is off the board",
            session.food()
        )));
    }

    if session.is_running() && !session.is_alive() {
        violations.push(InvariantViolation::new("running after game over"));
    }

    violations
}

#[cfg(debug_assertions)]
fn fail(kind: &str, violations: &[InvariantViolation]) {
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("{kind} invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// Assert all RPG invariants hold.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with every violated invariant listed.
#[cfg(debug_assertions)]
pub fn assert_rpg<D: Dice>(session: &RpgSession<D>) {
    fail("RPG", &check_rpg(session));
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_rpg<D: Dice>(_session: &RpgSession<D>) {}

/// Assert all Snake invariants hold.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with every violated invariant listed.
#[cfg(debug_assertions)]
pub fn assert_snake<D: Dice>(session: &SnakeSession<D>) {
    fail("Snake", &check_snake(session));
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_snake<D: Dice>(_session: &SnakeSession<D>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RpgConfig, SnakeConfig};
    use crate::grid::Direction;
    use std::time::Duration;

    #[test]
    fn test_fresh_sessions_are_valid() {
        let rpg = RpgSession::seeded(RpgConfig::default(), 1).unwrap();
        assert!(check_rpg(&rpg).is_empty());
        let snake = SnakeSession::seeded(SnakeConfig::default(), 1).unwrap();
        assert!(check_snake(&snake).is_empty());
    }

    #[test]
    fn test_rpg_valid_through_combat() {
        let mut rpg = RpgSession::seeded(RpgConfig::default(), 7).unwrap();
        // (5, 5) -> (2, 2) walks onto the default enemy.
        for dir in [Direction::Left, Direction::Left, Direction::Left, Direction::Up] {
            rpg.move_player(dir).unwrap();
            assert_rpg(&rpg);
        }
        rpg.move_player(Direction::Up).unwrap();
        rpg.move_player(Direction::Up).unwrap();
        assert_eq!(rpg.mode(), Mode::Combat);
        assert!(check_rpg(&rpg).is_empty());

        while rpg.mode() == Mode::Combat {
            rpg.attack().unwrap();
            rpg.advance(Duration::from_millis(1000)).unwrap();
            assert_rpg(&rpg);
        }
    }

    #[test]
    fn test_snake_valid_while_running() {
        let mut snake = SnakeSession::seeded(SnakeConfig::default(), 3).unwrap();
        snake.start();
        for step in 0..100 {
            if step % 7 == 0 {
                snake.set_direction(Direction::Left);
            } else if step % 7 == 3 {
                snake.set_direction(Direction::Up);
            }
            snake.advance(Duration::from_millis(200));
            assert_snake(&snake);
        }
    }

    #[test]
    fn test_violation_display() {
        let v = InvariantViolation::new("food (1, 1) is on the body");
        assert_eq!(v.to_string(), "Invariant violation: food (1, 1) is on the body");
    }

    #[test]
    #[should_panic(expected = "RPG invariant violations")]
    #[cfg(debug_assertions)]
    fn test_fail_panics_with_listing() {
        fail("RPG", &[InvariantViolation::new("combat without an enemy")]);
    }
}
