// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Arcade: deterministic engines for a grid RPG and a toroidal Snake.
//!
//! Both engines are plain state machines driven by commands and elapsed
//! virtual time. Anything that happens later (path-following steps, enemy
//! turns, respawns, Snake frames) goes through a [`TickScheduler`], and all
//! randomness goes through an injected [`Dice`], so a session is a pure
//! function of its seed and its input.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │   Host shell (TUI, soak runner, tests)        │
//! ├──────────────────────┬────────────────────────┤
//! │   RpgSession         │   SnakeSession         │
//! │   world · combat ·   │   body · food ·        │
//! │   progression        │   wrap                 │
//! ├──────────────────────┴────────────────────────┤
//! │   TickScheduler · Dice · Notifier · Store     │
//! └───────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dice;
pub mod error;
pub mod grid;
pub mod invariants;
pub mod notify;
pub mod rpg;
pub mod scheduler;
pub mod snake;
pub mod soak;
pub mod store;

pub use config::{GameConfig, RpgConfig, SnakeConfig, WorldLayout};
pub use dice::{Dice, ScriptedDice, SeededDice};
pub use error::{ConfigError, GameError, SinkError, StoreError};
pub use grid::{Direction, Position};
pub use notify::{Notification, NotificationSink, Notifier};
pub use rpg::{Character, GridWorld, Mode, Outcome, RpgCommand, RpgSession, RpgSnapshot, Tile};
pub use scheduler::{TaskId, TickScheduler};
pub use snake::{Frame, SnakeSession, SnakeSnapshot};
pub use store::{DirStore, KeyValueStore, MemoryStore};
