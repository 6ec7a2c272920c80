//! Toroidal Snake.
//!
//! The board wraps on both axes. A repeating frame task is armed when the
//! session is built; frames that fall while the game is stopped or over do
//! nothing, so [`SnakeSession::stop`] never has to touch the scheduler.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::SnakeConfig;
use crate::dice::{Dice, SeededDice};
use crate::error::GameError;
use crate::grid::{Direction, Position};
use crate::notify::{Notification, Notifier};
use crate::scheduler::{TaskId, TickScheduler};

/// Points per food eaten.
pub const FOOD_SCORE: u32 = 10;

/// Random food draws before falling back to a scan of free cells.
const FOOD_ATTEMPTS: usize = 64;

/// What a single frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Not running, or already over.
    Idle,
    /// The snake moved one cell.
    Moved,
    /// The snake moved onto the food and grew.
    Ate,
    /// The head hit the body; the run is over.
    Collided,
    /// The snake fills the board; the run is over.
    BoardFull,
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnakeSnapshot {
    /// Body cells, head first.
    pub body: Vec<Position>,
    /// Food cell.
    pub food: Position,
    /// Current heading.
    pub direction: Direction,
    /// Points scored this run.
    pub score: u32,
    /// False once the run has ended.
    pub alive: bool,
    /// Whether frames currently advance the snake.
    pub running: bool,
    /// Side length of the board.
    pub board_side: i32,
    /// Virtual time in milliseconds.
    pub clock_ms: u128,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SnakeTask {
    Frame,
}

/// One Snake game.
pub struct SnakeSession<D = SeededDice> {
    config: SnakeConfig,
    body: VecDeque<Position>,
    food: Position,
    direction: Direction,
    score: u32,
    alive: bool,
    running: bool,
    scheduler: TickScheduler<SnakeTask>,
    frame_task: TaskId,
    frames: u64,
    dice: D,
    notifier: Notifier,
}

impl<D> fmt::Debug for SnakeSession<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnakeSession")
            .field("len", &self.body.len())
            .field("head", &self.body.front())
            .field("food", &self.food)
            .field("direction", &self.direction)
            .field("score", &self.score)
            .field("alive", &self.alive)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl SnakeSession<SeededDice> {
    /// A session with seeded dice and no host sink.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if `config` fails validation.
    pub fn seeded(config: SnakeConfig, seed: u64) -> Result<Self, GameError> {
        Self::new(config, SeededDice::new(seed), Notifier::detached())
    }
}

impl<D: Dice> SnakeSession<D> {
    /// Build a stopped session in its initial state and arm the frame task.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: SnakeConfig, dice: D, notifier: Notifier) -> Result<Self, GameError> {
        config.validate()?;

        let mut scheduler = TickScheduler::new();
        let frame_task = scheduler.schedule_every(config.frame(), SnakeTask::Frame);

        Ok(Self {
            body: VecDeque::from([config.start]),
            food: config.food,
            direction: config.direction,
            score: 0,
            alive: true,
            running: false,
            scheduler,
            frame_task,
            frames: 0,
            dice,
            notifier,
            config,
        })
    }

    /// Body cells, head first.
    pub fn body(&self) -> impl ExactSizeIterator<Item = Position> + '_ {
        self.body.iter().copied()
    }

    /// Head cell.
    #[must_use]
    pub fn head(&self) -> Position {
        self.body.front().copied().unwrap_or(self.config.start)
    }

    /// Number of body cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Always false; the body is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Food cell.
    #[must_use]
    pub const fn food(&self) -> Position {
        self.food
    }

    /// Current heading.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Points this run.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// False once the run has ended.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether frames advance the snake.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &SnakeConfig {
        &self.config
    }

    /// Frames that moved the snake since construction.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Virtual time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Whether the repeating frame task is armed.
    #[must_use]
    pub fn frame_armed(&self) -> bool {
        self.scheduler.is_pending(self.frame_task)
    }

    /// Owned view for rendering or serialization.
    #[must_use]
    pub fn snapshot(&self) -> SnakeSnapshot {
        SnakeSnapshot {
            body: self.body.iter().copied().collect(),
            food: self.food,
            direction: self.direction,
            score: self.score,
            alive: self.alive,
            running: self.running,
            board_side: self.config.board_side,
            clock_ms: self.scheduler.now().as_millis(),
        }
    }

    /// Reset to the configured start and begin running.
    pub fn start(&mut self) {
        self.body = VecDeque::from([self.config.start]);
        self.food = self.config.food;
        self.direction = self.config.direction;
        self.score = 0;
        self.alive = true;
        self.running = true;
        tracing::info!("snake run started");
    }

    /// Pause. State is kept and the next frames are no-ops.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Tell the host to close the game view.
    pub fn close(&mut self) {
        self.running = false;
        tracing::info!(score = self.score, "snake session closed");
        self.notifier.emit(&Notification::close_webview());
    }

    /// Turn the snake.
    ///
    /// Only perpendicular turns apply; a direction on the current axis
    /// (the same one or its reverse) is ignored, as is any input while the
    /// game is not running. Returns whether the heading changed.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if !self.running || !self.alive || self.direction.shares_axis(direction) {
            return false;
        }
        self.direction = direction;
        true
    }

    /// Let `elapsed` of virtual time pass, running every due frame.
    pub fn advance(&mut self, elapsed: Duration) {
        let until = self.scheduler.now() + elapsed;
        while let Some(SnakeTask::Frame) = self.scheduler.poll(until) {
            self.tick();
        }
        self.scheduler.settle(until);
    }

    /// Advance the snake one cell.
    pub fn tick(&mut self) -> Frame {
        if !self.running || !self.alive {
            return Frame::Idle;
        }
        let side = self.config.board_side;
        let next = self.direction.step(self.head()).wrapped(side);

        if self.body.contains(&next) {
            self.game_over("collision");
            return Frame::Collided;
        }

        self.frames += 1;
        self.body.push_front(next);
        if next != self.food {
            self.body.pop_back();
            return Frame::Moved;
        }

        self.score += FOOD_SCORE;
        match self.place_food() {
            Some(food) => {
                self.food = food;
                Frame::Ate
            }
            None => {
                self.game_over("board full");
                Frame::BoardFull
            }
        }
    }

    fn game_over(&mut self, cause: &str) {
        self.alive = false;
        self.running = false;
        tracing::info!(score = self.score, cause, "snake run over");
        self.notifier
            .emit(&Notification::snake_game_over(self.score));
    }

    /// Pick a free cell uniformly: random draws first, then a scan.
    fn place_food(&mut self) -> Option<Position> {
        let side = self.config.board_side;
        let cells = u32::try_from(side.checked_mul(side)?).ok()?;
        let free = usize::try_from(cells).ok()?.checked_sub(self.body.len())?;
        if free == 0 {
            return None;
        }

        for _ in 0..FOOD_ATTEMPTS {
            let pos = cell(self.dice.roll(cells), side);
            if !self.body.contains(&pos) {
                return Some(pos);
            }
        }

        let nth = usize::try_from(self.dice.roll(u32::try_from(free).ok()?)).ok()?;
        (0..cells)
            .map(|idx| cell(idx, side))
            .filter(|pos| !self.body.contains(pos))
            .nth(nth)
    }
}

/// Row-major cell index to position. `side` is at most 256 so the casts
/// are lossless.
#[allow(clippy::cast_possible_wrap)]
fn cell(idx: u32, side: i32) -> Position {
    let idx = idx as i32;
    Position::new(idx % side, idx / side)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use std::sync::mpsc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn running(rolls: &[u32]) -> SnakeSession<ScriptedDice> {
        let mut s = SnakeSession::new(
            SnakeConfig::default(),
            ScriptedDice::new(rolls.iter().copied()),
            Notifier::detached(),
        )
        .unwrap();
        s.start();
        s
    }

    #[test]
    fn test_initial_state() {
        let s = SnakeSession::seeded(SnakeConfig::default(), 1).unwrap();
        assert_eq!(s.body().collect::<Vec<_>>(), vec![Position::new(10, 10)]);
        assert_eq!(s.food(), Position::new(15, 15));
        assert_eq!(s.direction(), Direction::Up);
        assert!(s.is_alive());
        assert!(!s.is_running());
        assert!(s.frame_armed());
    }

    #[test]
    fn test_tick_moves_up() {
        let mut s = running(&[]);
        assert_eq!(s.tick(), Frame::Moved);
        assert_eq!(s.body().collect::<Vec<_>>(), vec![Position::new(10, 9)]);
        assert!(s.is_alive());
    }

    #[test]
    fn test_stopped_tick_is_noop() {
        let mut s = SnakeSession::seeded(SnakeConfig::default(), 1).unwrap();
        assert_eq!(s.tick(), Frame::Idle);
        assert_eq!(s.head(), Position::new(10, 10));
    }

    #[test]
    fn test_wraps_both_axes() {
        let config = SnakeConfig {
            start: Position::new(0, 0),
            ..SnakeConfig::default()
        };
        let mut s = SnakeSession::seeded(config, 1).unwrap();
        s.start();
        s.tick();
        assert_eq!(s.head(), Position::new(0, 19));
        s.set_direction(Direction::Left);
        s.tick();
        assert_eq!(s.head(), Position::new(19, 19));
    }

    #[test]
    fn test_reversal_ignored() {
        let mut s = running(&[]);
        assert!(!s.set_direction(Direction::Down));
        assert!(!s.set_direction(Direction::Up));
        assert_eq!(s.direction(), Direction::Up);
        assert!(s.set_direction(Direction::Left));
        assert_eq!(s.direction(), Direction::Left);
    }

    #[test]
    fn test_input_ignored_when_stopped() {
        let mut s = running(&[]);
        s.stop();
        assert!(!s.set_direction(Direction::Left));
        assert_eq!(s.direction(), Direction::Up);
    }

    #[test]
    fn test_eating_grows_and_scores() {
        let config = SnakeConfig {
            food: Position::new(10, 9),
            ..SnakeConfig::default()
        };
        // Roll 0 places the next food at (0, 0).
        let mut s = SnakeSession::new(config, ScriptedDice::new([0]), Notifier::detached()).unwrap();
        s.start();
        assert_eq!(s.tick(), Frame::Ate);
        assert_eq!(s.score(), 10);
        assert_eq!(
            s.body().collect::<Vec<_>>(),
            vec![Position::new(10, 9), Position::new(10, 10)]
        );
        assert_eq!(s.food(), Position::new(0, 0));
    }

    #[test]
    fn test_food_retries_occupied_cells() {
        let config = SnakeConfig {
            food: Position::new(10, 9),
            ..SnakeConfig::default()
        };
        // 210 is (10, 10), under the tail; 209 is (9, 10).
        let mut s =
            SnakeSession::new(config, ScriptedDice::new([210, 209]), Notifier::detached())
                .unwrap();
        s.start();
        s.tick();
        assert_eq!(s.food(), Position::new(9, 10));
    }

    #[test]
    fn test_collision_ends_run_and_notifies() {
        let (tx, rx) = mpsc::channel();
        let config = SnakeConfig {
            food: Position::new(10, 9),
            ..SnakeConfig::default()
        };
        let mut s = SnakeSession::new(config, ScriptedDice::new([0]), Notifier::new(tx)).unwrap();
        s.start();
        s.tick();
        s.body = VecDeque::from([
            Position::new(10, 9),
            Position::new(10, 10),
            Position::new(9, 10),
            Position::new(9, 9),
        ]);
        s.set_direction(Direction::Left);
        let before: Vec<_> = s.body().collect();

        assert_eq!(s.tick(), Frame::Collided);
        assert!(!s.is_alive());
        assert!(!s.is_running());
        assert_eq!(s.body().collect::<Vec<_>>(), before);
        assert_eq!(
            rx.try_recv().unwrap(),
            r#"{"event":"snake_game_over","data":{"score":10}}"#
        );
    }

    #[test]
    fn test_tail_cell_counts_as_collision() {
        let mut s = running(&[]);
        s.body = VecDeque::from([
            Position::new(10, 10),
            Position::new(11, 10),
            Position::new(11, 9),
            Position::new(10, 9),
        ]);
        assert_eq!(s.tick(), Frame::Collided);
    }

    #[test]
    fn test_board_full_ends_run() {
        let config = SnakeConfig {
            board_side: 2,
            start: Position::new(0, 0),
            food: Position::new(0, 1),
            ..SnakeConfig::default()
        };
        let mut s = SnakeSession::new(config, ScriptedDice::new([0]), Notifier::detached()).unwrap();
        s.start();
        s.body = VecDeque::from([Position::new(0, 0), Position::new(1, 0), Position::new(1, 1)]);
        assert_eq!(s.tick(), Frame::BoardFull);
        assert_eq!(s.len(), 4);
        assert!(!s.is_alive());
    }

    #[test]
    fn test_frames_follow_clock() {
        let mut s = running(&[]);
        s.advance(ms(199));
        assert_eq!(s.head(), Position::new(10, 10));
        s.advance(ms(1));
        assert_eq!(s.head(), Position::new(10, 9));
        s.advance(ms(1000));
        assert_eq!(s.head(), Position::new(10, 4));
        assert_eq!(s.frames(), 6);
    }

    #[test]
    fn test_stop_keeps_frame_armed() {
        let mut s = running(&[]);
        s.advance(ms(200));
        s.stop();
        s.advance(ms(1000));
        assert_eq!(s.head(), Position::new(10, 9));
        assert!(s.frame_armed());
    }

    #[test]
    fn test_start_resets() {
        let mut s = running(&[]);
        s.advance(ms(600));
        s.score = 40;
        s.start();
        assert_eq!(s.head(), Position::new(10, 10));
        assert_eq!(s.len(), 1);
        assert_eq!(s.score(), 0);
        assert!(s.is_running());
    }

    #[test]
    fn test_rejects_off_board_food() {
        let config = SnakeConfig {
            food: Position::new(20, 0),
            ..SnakeConfig::default()
        };
        assert!(SnakeSession::seeded(config, 0).is_err());
    }

    #[test]
    fn test_rejects_board_too_large_to_index() {
        let config = SnakeConfig {
            board_side: 50_000,
            start: Position::new(0, 1),
            food: Position::new(0, 0),
            ..SnakeConfig::default()
        };
        assert!(matches!(
            SnakeSession::seeded(config, 0),
            Err(GameError::InvalidConfig(_))
        ));
    }
}
