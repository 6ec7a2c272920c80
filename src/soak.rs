//! Headless soak runner.
//!
//! Drives many seeded sessions of both games with random input in
//! parallel and checks every invariant after each step. Each session is a
//! pure function of its seed, so a reported failure can be replayed by
//! running that seed alone.

use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::{RpgConfig, SnakeConfig};
use crate::dice::{Dice, SeededDice};
use crate::grid::{Direction, Position};
use crate::invariants::{check_rpg, check_snake};
use crate::rpg::{Mode, RpgCommand, RpgSession};
use crate::snake::SnakeSession;

/// Violations kept verbatim in a report; the rest are only counted.
pub const MAX_RECORDED_VIOLATIONS: usize = 32;

/// Salt separating the input stream from the session's own dice.
const INPUT_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Soak run parameters.
#[derive(Debug, Clone)]
pub struct SoakConfig {
    /// Number of seeds; each runs one RPG and one Snake session.
    pub sessions: u64,
    /// Inputs per session.
    pub steps: u32,
    /// Seed of the first session; session `i` uses `seed + i`.
    pub seed: u64,
    /// RPG settings.
    pub rpg: RpgConfig,
    /// Snake settings.
    pub snake: SnakeConfig,
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            sessions: 100,
            steps: 500,
            seed: 0,
            rpg: RpgConfig::default(),
            snake: SnakeConfig::default(),
        }
    }
}

/// One invariant failure, with the seed that reproduces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SoakViolation {
    /// Session seed.
    pub seed: u64,
    /// `"rpg"` or `"snake"`.
    pub game: &'static str,
    /// Input index at which the check failed.
    pub step: u32,
    /// What was violated.
    pub message: String,
}

/// Aggregated results, merged across worker threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SoakStats {
    /// Seeds completed.
    pub sessions: u64,
    /// RPG inputs applied.
    pub rpg_steps: u64,
    /// Fights started.
    pub encounters: u64,
    /// Enemies defeated.
    pub kills: u64,
    /// Player defeats.
    pub defeats: u64,
    /// Levels gained.
    pub level_ups: u64,
    /// Highest level reached by any session.
    pub max_level: u32,
    /// Snake runs played to game over or step limit.
    pub snake_runs: u64,
    /// Snake frames that moved the snake.
    pub snake_frames: u64,
    /// Best Snake score.
    pub best_score: u32,
    /// Total invariant failures.
    pub violation_count: u64,
    /// The first [`MAX_RECORDED_VIOLATIONS`] failures.
    pub violations: Vec<SoakViolation>,
}

impl SoakStats {
    /// Whether every check passed.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.violation_count == 0
    }

    fn record(&mut self, violation: SoakViolation) {
        tracing::warn!(
            seed = violation.seed,
            game = violation.game,
            step = violation.step,
            "{}",
            violation.message
        );
        self.violation_count += 1;
        if self.violations.len() < MAX_RECORDED_VIOLATIONS {
            self.violations.push(violation);
        }
    }

    /// Fold another worker's results into this one.
    pub fn merge(&mut self, other: &Self) {
        self.sessions += other.sessions;
        self.rpg_steps += other.rpg_steps;
        self.encounters += other.encounters;
        self.kills += other.kills;
        self.defeats += other.defeats;
        self.level_ups += other.level_ups;
        self.max_level = self.max_level.max(other.max_level);
        self.snake_runs += other.snake_runs;
        self.snake_frames += other.snake_frames;
        self.best_score = self.best_score.max(other.best_score);
        self.violation_count += other.violation_count;
        let room = MAX_RECORDED_VIOLATIONS.saturating_sub(self.violations.len());
        self.violations
            .extend(other.violations.iter().take(room).cloned());
    }
}

fn random_direction(input: &mut impl Dice) -> Direction {
    Direction::ALL[input.roll(4) as usize]
}

fn random_position(input: &mut impl Dice, side: i32) -> Position {
    let side_u = side.unsigned_abs();
    // Both rolls are below side <= 256.
    #[allow(clippy::cast_possible_wrap)]
    let (x, y) = (input.roll(side_u) as i32, input.roll(side_u) as i32);
    Position::new(x, y)
}

/// Pick an input, biased towards actions available in the current mode.
fn random_command(input: &mut impl Dice, mode: Mode, side: i32) -> RpgCommand {
    if input.chance(0.1) {
        // Any command at all, to exercise the ignored paths.
        return match input.roll(10) {
            0 => RpgCommand::Move(random_direction(input)),
            1 => RpgCommand::Travel(random_position(input, side)),
            2 => RpgCommand::Attack,
            3 => RpgCommand::Defend,
            4 => RpgCommand::Flee,
            5 => RpgCommand::BuyPotion,
            6 => RpgCommand::BuySword,
            7 => RpgCommand::LeaveShop,
            8 => RpgCommand::Rest,
            _ => RpgCommand::LeaveInn,
        };
    }
    match mode {
        Mode::World if input.chance(0.2) => RpgCommand::Travel(random_position(input, side)),
        Mode::World => RpgCommand::Move(random_direction(input)),
        Mode::Combat => match input.roll(10) {
            0..=6 => RpgCommand::Attack,
            7 | 8 => RpgCommand::Defend,
            _ => RpgCommand::Flee,
        },
        Mode::Shop => match input.roll(3) {
            0 => RpgCommand::BuyPotion,
            1 => RpgCommand::BuySword,
            _ => RpgCommand::LeaveShop,
        },
        Mode::Inn => match input.roll(2) {
            0 => RpgCommand::Rest,
            _ => RpgCommand::LeaveInn,
        },
    }
}

/// Drive one RPG session with random input.
pub fn soak_rpg(seed: u64, steps: u32, config: &RpgConfig, stats: &mut SoakStats) {
    let mut session = match RpgSession::seeded(config.clone(), seed) {
        Ok(session) => session,
        Err(e) => {
            stats.record(SoakViolation {
                seed,
                game: "rpg",
                step: 0,
                message: format!("session failed to start: {e}"),
            });
            return;
        }
    };
    let mut input = SeededDice::new(seed ^ INPUT_SALT);
    let side = config.grid_side;

    for step in 0..steps {
        let command = random_command(&mut input, session.mode(), side);
        let mut result = session.dispatch(command).map(|_| ());
        if result.is_ok() {
            let elapsed = Duration::from_millis(u64::from(input.roll(1500)));
            result = session.advance(elapsed);
        }
        if result.is_ok() && input.roll(500) == 0 {
            result = session.regenerate_world();
        }
        if let Err(e) = result {
            stats.record(SoakViolation {
                seed,
                game: "rpg",
                step,
                message: format!("{command:?} failed: {e}"),
            });
        }
        for violation in check_rpg(&session) {
            stats.record(SoakViolation {
                seed,
                game: "rpg",
                step,
                message: violation.message,
            });
        }
    }

    let run = session.stats();
    stats.rpg_steps += u64::from(steps);
    stats.encounters += run.encounters;
    stats.kills += run.kills;
    stats.defeats += run.defeats;
    stats.level_ups += run.level_ups;
    stats.max_level = stats.max_level.max(session.player().level);
}

/// Drive one Snake session with random input, restarting after each game
/// over.
pub fn soak_snake(seed: u64, steps: u32, config: &SnakeConfig, stats: &mut SoakStats) {
    let mut session = match SnakeSession::seeded(*config, seed) {
        Ok(session) => session,
        Err(e) => {
            stats.record(SoakViolation {
                seed,
                game: "snake",
                step: 0,
                message: format!("session failed to start: {e}"),
            });
            return;
        }
    };
    let mut input = SeededDice::new(seed ^ INPUT_SALT);
    let frame = config.frame();

    session.start();
    stats.snake_runs += 1;
    for step in 0..steps {
        if !session.is_alive() {
            stats.best_score = stats.best_score.max(session.score());
            session.start();
            stats.snake_runs += 1;
        } else if input.chance(0.25) {
            session.set_direction(random_direction(&mut input));
        }
        session.advance(frame);
        for violation in check_snake(&session) {
            stats.record(SoakViolation {
                seed,
                game: "snake",
                step,
                message: violation.message,
            });
        }
    }
    stats.best_score = stats.best_score.max(session.score());
    stats.snake_frames += session.frames();
}

/// Run every seed in parallel.
///
/// `on_session` is called once per finished seed, from worker threads.
#[must_use]
pub fn run_soak(config: &SoakConfig, on_session: impl Fn() + Sync) -> SoakStats {
    (0..config.sessions)
        .into_par_iter()
        .fold(SoakStats::default, |mut local, i| {
            let seed = config.seed.wrapping_add(i);
            soak_rpg(seed, config.steps, &config.rpg, &mut local);
            soak_snake(seed, config.steps, &config.snake, &mut local);
            local.sessions += 1;
            on_session();
            local
        })
        .reduce(SoakStats::default, |mut a, b| {
            a.merge(&b);
            a
        })
}
