//! The RPG state machine.
//!
//! One [`RpgSession`] owns the map, the player, the current encounter and a
//! [`TickScheduler`] for everything that happens later: path-following
//! steps, delayed enemy turns and enemy respawns. Hosts drive it with
//! commands ([`RpgSession::dispatch`]) and elapsed time
//! ([`RpgSession::advance`]), and render from [`RpgSession::snapshot`].

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::RpgConfig;
use crate::dice::{Dice, SeededDice};
use crate::error::GameError;
use crate::grid::{Direction, Position};
use crate::notify::{Notification, Notifier};
use crate::rpg::combat::{self, Encounter, EncounterId, Retaliation, Reward, Stance, Strike};
use crate::rpg::{apply_xp, xp_to_next_level, Character, GridWorld, Tile};
use crate::scheduler::{TaskId, TickScheduler};
use crate::store::{KeyValueStore, MemoryStore};

/// Price of a potion.
pub const POTION_COST: u32 = 10;
/// Hp restored by a potion.
pub const POTION_HEAL: u32 = 50;
/// Price of a sword.
pub const SWORD_COST: u32 = 50;
/// Attack added by a sword.
pub const SWORD_ATTACK: u32 = 5;
/// Price of a night at the inn.
pub const REST_COST: u32 = 20;

const MSG_WELCOME: &str = "Welcome to the RPG world!";
const MSG_WELCOME_BACK: &str = "Progress loaded! Welcome back to the RPG world!";
const MSG_MOVE: &str = "You move through the world.";
const MSG_SHOP: &str = "Welcome to the shop!";
const MSG_INN: &str = "Welcome to the inn!";
const MSG_NO_GOLD: &str = "Not enough gold!";

/// Which screen the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Walking the map.
    #[default]
    World,
    /// Fighting an enemy.
    Combat,
    /// Inside the shop.
    Shop,
    /// Inside the inn.
    Inn,
}

/// Player input, one variant per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpgCommand {
    /// Step one cell (World).
    Move(Direction),
    /// Walk to a cell one step per tick (World).
    Travel(Position),
    /// Strike the enemy (Combat).
    Attack,
    /// Brace for the enemy's strike (Combat).
    Defend,
    /// Leave the fight (Combat).
    Flee,
    /// Buy a healing potion (Shop).
    BuyPotion,
    /// Buy a sword (Shop).
    BuySword,
    /// Leave the shop (Shop).
    LeaveShop,
    /// Rest at the inn (Inn).
    Rest,
    /// Leave the inn (Inn).
    LeaveInn,
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// State changed.
    Applied,
    /// A valid action the player cannot afford; only the message changed.
    Rejected,
    /// Not available in the current mode, or nothing to do.
    Ignored,
}

/// Counters for a session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RpgStats {
    /// Cells walked, manually or by path-following.
    pub steps: u64,
    /// Fights started.
    pub encounters: u64,
    /// Enemies defeated.
    pub kills: u64,
    /// Times the player was defeated.
    pub defeats: u64,
    /// Levels gained.
    pub level_ups: u64,
    /// Fights fled.
    pub flights: u64,
}

/// Read-only view of a session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpgSnapshot {
    /// Current mode.
    pub mode: Mode,
    /// Player cell.
    pub position: Position,
    /// Pending path-following destination.
    pub destination: Option<Position>,
    /// The player.
    pub player: Character,
    /// Experience needed for the next level.
    pub xp_to_next_level: u32,
    /// The enemy being fought.
    pub enemy: Option<Character>,
    /// Where that enemy came from.
    pub enemy_position: Option<Position>,
    /// Latest status message.
    pub message: String,
    /// Tiles, top row first.
    pub grid: Vec<Vec<Tile>>,
    /// Virtual time in milliseconds.
    pub clock_ms: u128,
}

/// Deferred work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RpgTask {
    /// Take one path-following step.
    PathStep,
    /// The enemy of one particular encounter strikes back.
    EnemyTurn {
        encounter: EncounterId,
        stance: Stance,
    },
    /// Refill a cleared enemy tile, if the map is still the same one.
    Respawn { at: Position, epoch: u64 },
}

/// One RPG game.
pub struct RpgSession<D = SeededDice> {
    config: RpgConfig,
    world: GridWorld,
    /// Bumped whenever the map is rebuilt; respawns from older maps lapse.
    epoch: u64,
    player: Character,
    position: Position,
    mode: Mode,
    encounter: Option<Encounter>,
    next_encounter: u64,
    destination: Option<Position>,
    path_task: Option<TaskId>,
    message: String,
    scheduler: TickScheduler<RpgTask>,
    dice: D,
    notifier: Notifier,
    store: Box<dyn KeyValueStore>,
    stats: RpgStats,
}

impl<D> fmt::Debug for RpgSession<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpgSession")
            .field("mode", &self.mode)
            .field("position", &self.position)
            .field("player", &self.player)
            .field("encounter", &self.encounter)
            .field("destination", &self.destination)
            .field("now", &self.scheduler.now())
            .finish_non_exhaustive()
    }
}

impl RpgSession<SeededDice> {
    /// A session with seeded dice, an in-memory store and no host sink.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if `config` fails validation.
    pub fn seeded(config: RpgConfig, seed: u64) -> Result<Self, GameError> {
        Self::new(config, SeededDice::new(seed), MemoryStore::new(), Notifier::detached())
    }
}

impl<D: Dice> RpgSession<D> {
    /// Start a session.
    ///
    /// The player is restored from `store` under the configured key; a
    /// missing or malformed record falls back to the default hero.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if `config` fails validation.
    pub fn new(
        config: RpgConfig,
        mut dice: D,
        store: impl KeyValueStore + 'static,
        notifier: Notifier,
    ) -> Result<Self, GameError> {
        config.validate()?;
        let world = GridWorld::from_layout(config.grid_side, &config.layout, &mut dice)?;
        let restored = restore_player(&store, &config.save_key);
        let message = if restored.is_some() {
            MSG_WELCOME_BACK
        } else {
            MSG_WELCOME
        };

        Ok(Self {
            position: config.start.clamped(config.grid_side),
            world,
            epoch: 0,
            player: restored.unwrap_or_default(),
            mode: Mode::World,
            encounter: None,
            next_encounter: 0,
            destination: None,
            path_task: None,
            message: message.to_string(),
            scheduler: TickScheduler::new(),
            dice,
            notifier,
            store: Box::new(store),
            stats: RpgStats::default(),
            config,
        })
    }

    // ------------------------------------------------------------------
    // Projection
    // ------------------------------------------------------------------

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// The player.
    #[must_use]
    pub const fn player(&self) -> &Character {
        &self.player
    }

    /// Player cell.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// The enemy being fought, if any.
    #[must_use]
    pub fn enemy(&self) -> Option<&Character> {
        self.encounter.as_ref().map(|e| &e.enemy)
    }

    /// Where the current enemy came from.
    #[must_use]
    pub fn enemy_position(&self) -> Option<Position> {
        self.encounter.as_ref().map(|e| e.origin)
    }

    /// Pending path-following destination.
    #[must_use]
    pub const fn destination(&self) -> Option<Position> {
        self.destination
    }

    /// Latest status message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The map.
    #[must_use]
    pub const fn world(&self) -> &GridWorld {
        &self.world
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &RpgConfig {
        &self.config
    }

    /// Lifetime counters.
    #[must_use]
    pub const fn stats(&self) -> RpgStats {
        self.stats
    }

    /// Virtual time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// Number of scheduled tasks waiting to run.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// Whether a path-following step is scheduled.
    #[must_use]
    pub fn is_traveling(&self) -> bool {
        self.path_task
            .is_some_and(|id| self.scheduler.is_pending(id))
    }

    /// Owned view for rendering or serialization.
    #[must_use]
    pub fn snapshot(&self) -> RpgSnapshot {
        RpgSnapshot {
            mode: self.mode,
            position: self.position,
            destination: self.destination,
            player: self.player.clone(),
            xp_to_next_level: xp_to_next_level(self.player.level),
            enemy: self.enemy().cloned(),
            enemy_position: self.enemy_position(),
            message: self.message.clone(),
            grid: self.world.rows(),
            clock_ms: self.scheduler.now().as_millis(),
        }
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] for a travel target off the map.
    pub fn dispatch(&mut self, command: RpgCommand) -> Result<Outcome, GameError> {
        match command {
            RpgCommand::Move(direction) => self.move_player(direction),
            RpgCommand::Travel(target) => self.travel_to(target),
            RpgCommand::Attack => self.attack(),
            RpgCommand::Defend => Ok(self.defend()),
            RpgCommand::Flee => Ok(self.flee()),
            RpgCommand::BuyPotion => Ok(self.buy_potion()),
            RpgCommand::BuySword => Ok(self.buy_sword()),
            RpgCommand::LeaveShop => Ok(self.leave(Mode::Shop)),
            RpgCommand::Rest => Ok(self.rest()),
            RpgCommand::LeaveInn => Ok(self.leave(Mode::Inn)),
        }
    }

    fn ignore(&self, action: &str) -> Outcome {
        tracing::debug!(action, mode = ?self.mode, "command not available");
        Outcome::Ignored
    }

    /// Step one cell, clamped to the map.
    ///
    /// Cancels any path-following. Walking into the map edge is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates a tile lookup fault.
    pub fn move_player(&mut self, direction: Direction) -> Result<Outcome, GameError> {
        if self.mode != Mode::World {
            return Ok(self.ignore("move"));
        }
        self.cancel_travel();

        let target = direction.step(self.position).clamped(self.world.side());
        if target == self.position {
            return Ok(Outcome::Ignored);
        }
        self.enter(target)?;
        Ok(Outcome::Applied)
    }

    /// Start walking towards `target`, one cell per path step.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if `target` is off the map.
    pub fn travel_to(&mut self, target: Position) -> Result<Outcome, GameError> {
        if self.mode != Mode::World {
            return Ok(self.ignore("travel"));
        }
        self.world.tile_at(target)?;
        self.cancel_travel();
        if target == self.position {
            return Ok(Outcome::Ignored);
        }
        self.destination = Some(target);
        self.path_task = Some(
            self.scheduler
                .schedule(self.config.path_step(), RpgTask::PathStep),
        );
        Ok(Outcome::Applied)
    }

    /// Strike the enemy.
    ///
    /// # Errors
    ///
    /// Propagates a tile fault while clearing a defeated enemy's tile.
    pub fn attack(&mut self) -> Result<Outcome, GameError> {
        if self.mode != Mode::Combat {
            return Ok(self.ignore("attack"));
        }
        let Some(encounter) = self.encounter.as_mut() else {
            return Ok(self.ignore("attack"));
        };

        let damage = combat::player_damage(&mut self.dice, self.player.attack);
        match encounter.strike(damage) {
            Strike::Hit { damage, .. } => {
                let id = encounter.id;
                self.message = format!("You attack for {damage} damage!");
                self.schedule_enemy_turn(id, Stance::Attacking);
            }
            Strike::Kill { reward, .. } => self.win_encounter(reward)?,
        }
        Ok(Outcome::Applied)
    }

    /// Brace for the enemy's next strike.
    pub fn defend(&mut self) -> Outcome {
        if self.mode != Mode::Combat {
            return self.ignore("defend");
        }
        let Some(id) = self.encounter.as_ref().map(|e| e.id) else {
            return self.ignore("defend");
        };
        self.message = "You defend! Damage reduced.".to_string();
        self.schedule_enemy_turn(id, Stance::Defending);
        Outcome::Applied
    }

    /// Leave the fight without a damage exchange.
    pub fn flee(&mut self) -> Outcome {
        if self.mode != Mode::Combat {
            return self.ignore("flee");
        }
        self.end_encounter();
        self.stats.flights += 1;
        self.message = "You fled from combat!".to_string();
        Outcome::Applied
    }

    /// Buy a potion that heals [`POTION_HEAL`] hp.
    pub fn buy_potion(&mut self) -> Outcome {
        if self.mode != Mode::Shop {
            return self.ignore("buy_potion");
        }
        if !self.player.spend(POTION_COST) {
            return self.reject();
        }
        self.player.heal(POTION_HEAL);
        self.message = format!("Bought potion! Healed {POTION_HEAL} HP.");
        self.persist();
        Outcome::Applied
    }

    /// Buy a sword adding [`SWORD_ATTACK`] attack.
    pub fn buy_sword(&mut self) -> Outcome {
        if self.mode != Mode::Shop {
            return self.ignore("buy_sword");
        }
        if !self.player.spend(SWORD_COST) {
            return self.reject();
        }
        self.player.attack = self.player.attack.saturating_add(SWORD_ATTACK);
        self.message = format!("Bought sword! Attack +{SWORD_ATTACK}.");
        self.persist();
        Outcome::Applied
    }

    /// Pay for a full heal.
    pub fn rest(&mut self) -> Outcome {
        if self.mode != Mode::Inn {
            return self.ignore("rest");
        }
        if !self.player.spend(REST_COST) {
            return self.reject();
        }
        self.player.heal_fully();
        self.message = "Rested! Fully healed.".to_string();
        self.persist();
        Outcome::Applied
    }

    /// Return to the map from the shop or inn.
    pub fn leave(&mut self, from: Mode) -> Outcome {
        if self.mode != from || !matches!(from, Mode::Shop | Mode::Inn) {
            return self.ignore("leave");
        }
        self.mode = Mode::World;
        Outcome::Applied
    }

    fn reject(&mut self) -> Outcome {
        self.message = MSG_NO_GOLD.to_string();
        Outcome::Rejected
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Let `elapsed` of virtual time pass, running every task that falls
    /// due, in order.
    ///
    /// # Errors
    ///
    /// Propagates a tile lookup fault from a scheduled task.
    pub fn advance(&mut self, elapsed: Duration) -> Result<(), GameError> {
        let until = self.scheduler.now() + elapsed;
        while let Some(task) = self.scheduler.poll(until) {
            self.run_task(task)?;
        }
        self.scheduler.settle(until);
        Ok(())
    }

    fn run_task(&mut self, task: RpgTask) -> Result<(), GameError> {
        match task {
            RpgTask::PathStep => self.path_step(),
            RpgTask::EnemyTurn { encounter, stance } => {
                self.enemy_turn(encounter, stance);
                Ok(())
            }
            RpgTask::Respawn { at, epoch } => self.respawn(at, epoch),
        }
    }

    fn path_step(&mut self) -> Result<(), GameError> {
        self.path_task = None;
        let Some(target) = self.destination else {
            return Ok(());
        };
        if self.mode != Mode::World {
            self.destination = None;
            return Ok(());
        }
        let Some(next) = next_step_toward(self.position, target) else {
            self.destination = None;
            return Ok(());
        };

        let tile = self.enter(next.clamped(self.world.side()))?;
        if self.position == target || tile.is_interactive() {
            self.destination = None;
        } else if self.mode == Mode::World {
            self.path_task = Some(
                self.scheduler
                    .schedule(self.config.path_step(), RpgTask::PathStep),
            );
        }
        Ok(())
    }

    fn schedule_enemy_turn(&mut self, encounter: EncounterId, stance: Stance) {
        self.scheduler.schedule(
            self.config.enemy_turn(),
            RpgTask::EnemyTurn { encounter, stance },
        );
    }

    fn enemy_turn(&mut self, id: EncounterId, stance: Stance) {
        let Some(encounter) = self.encounter.as_ref().filter(|e| e.id == id) else {
            tracing::debug!(encounter = id.0, "enemy turn for a finished fight dropped");
            return;
        };
        let name = encounter.enemy.name.clone();
        let damage = combat::enemy_damage(&mut self.dice, encounter.enemy.attack, stance);

        match combat::retaliate(&mut self.player, damage) {
            Retaliation::Hit { damage, .. } => {
                self.message = format!("{name} attacks for {damage} damage!");
                self.persist();
            }
            Retaliation::Defeated { .. } => self.defeat(),
        }
    }

    fn respawn(&mut self, at: Position, epoch: u64) -> Result<(), GameError> {
        if epoch != self.epoch {
            tracing::debug!(%at, "respawn for a replaced map lapsed");
            return Ok(());
        }
        if self.world.tile_at(at)? == Tile::Grass {
            self.world.set_tile(at, Tile::Enemy)?;
            tracing::debug!(%at, "enemy respawned");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Move onto `pos` and react to its tile.
    fn enter(&mut self, pos: Position) -> Result<Tile, GameError> {
        let tile = self.world.tile_at(pos)?;
        self.position = pos;
        self.stats.steps += 1;

        match tile {
            Tile::Enemy => self.begin_encounter(pos),
            Tile::Shop => {
                self.switch_mode(Mode::Shop);
                self.message = MSG_SHOP.to_string();
            }
            Tile::Inn => {
                self.switch_mode(Mode::Inn);
                self.message = MSG_INN.to_string();
            }
            Tile::Grass => self.message = MSG_MOVE.to_string(),
        }
        Ok(tile)
    }

    fn switch_mode(&mut self, mode: Mode) {
        if mode != Mode::World {
            self.cancel_travel();
        }
        self.mode = mode;
    }

    fn cancel_travel(&mut self) {
        self.destination = None;
        if let Some(id) = self.path_task.take() {
            self.scheduler.cancel(id);
        }
    }

    fn begin_encounter(&mut self, origin: Position) {
        let id = EncounterId(self.next_encounter);
        self.next_encounter += 1;
        let enemy = Character::goblin(self.config.encounter_gold);
        self.message = format!("You encountered a {}! Combat begins!", enemy.name);
        self.encounter = Some(Encounter::new(id, enemy, origin));
        self.switch_mode(Mode::Combat);
        self.stats.encounters += 1;
        tracing::info!(encounter = id.0, %origin, "combat started");
    }

    fn end_encounter(&mut self) -> Option<Encounter> {
        self.mode = Mode::World;
        self.encounter.take()
    }

    fn win_encounter(&mut self, reward: Reward) -> Result<(), GameError> {
        let Some(encounter) = self.end_encounter() else {
            return Ok(());
        };
        self.player.earn(reward.gold);
        let progress = apply_xp(&self.player, reward.xp);
        let levels_gained = progress.levels_gained;
        self.player = progress.character;
        self.stats.kills += 1;

        let name = &encounter.enemy.name;
        if levels_gained > 0 {
            let level = self.player.level;
            self.message = format!(
                "You defeated the {name}! Gained {} gold and {} XP. Leveled up to {level}!",
                reward.gold, reward.xp
            );
            self.stats.level_ups += u64::from(levels_gained);
            tracing::info!(level, "player leveled up");
            self.notifier.emit(&Notification::level_up(level));
        } else {
            self.message = format!(
                "You defeated the {name}! Gained {} gold and {} XP.",
                reward.gold, reward.xp
            );
        }
        self.persist();

        self.world.clear_tile(encounter.origin)?;
        self.scheduler.schedule(
            self.config.respawn(),
            RpgTask::Respawn {
                at: encounter.origin,
                epoch: self.epoch,
            },
        );
        tracing::info!(encounter = encounter.id.0, "enemy defeated");
        Ok(())
    }

    fn defeat(&mut self) {
        self.end_encounter();
        self.cancel_travel();
        self.player = Character::hero();
        self.position = self.config.start.clamped(self.world.side());
        self.message = "You were defeated! Game Over.".to_string();
        self.stats.defeats += 1;
        tracing::info!("player defeated, progress reset");
        self.persist();
    }

    /// Rebuild the map from the configured layout.
    ///
    /// Any fight is abandoned and pending respawns for the old map lapse.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout does not fit the grid.
    pub fn regenerate_world(&mut self) -> Result<(), GameError> {
        self.world = GridWorld::from_layout(self.config.grid_side, &self.config.layout, &mut self.dice)?;
        self.epoch += 1;
        self.end_encounter();
        self.cancel_travel();
        self.message = "The world shifts around you.".to_string();
        Ok(())
    }

    /// Tell the host to close the game view.
    pub fn close(&mut self) {
        tracing::info!("rpg session closed");
        self.notifier.emit(&Notification::close_webview());
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    fn persist(&mut self) {
        let encoded = match self.player.encode() {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode player");
                return;
            }
        };
        if let Err(e) = self.store.save(&self.config.save_key, &encoded) {
            tracing::warn!(error = %e, key = %self.config.save_key, "failed to save player");
        }
    }
}

fn restore_player(store: &dyn KeyValueStore, key: &str) -> Option<Character> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(error = %e, key, "failed to read saved player");
            return None;
        }
    };
    match Character::decode(&raw) {
        Ok(player) => {
            tracing::info!(level = player.level, "saved player restored");
            // Records written by older builds may hold unspent level-ups.
            Some(apply_xp(&player, 0).character)
        }
        Err(e) => {
            tracing::warn!(error = %e, key, "ignoring malformed saved player");
            None
        }
    }
}

/// Next cell on the way from `from` to `to`.
///
/// Closes the axis with the larger remaining offset first; ties go to the
/// x axis. Returns `None` once there.
#[must_use]
pub fn next_step_toward(from: Position, to: Position) -> Option<Position> {
    let (dx, dy) = from.delta_to(to);
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx.abs() >= dy.abs() {
        Some(from.offset(dx.signum(), 0))
    } else {
        Some(from.offset(0, dy.signum()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldLayout;
    use crate::dice::ScriptedDice;
    use std::sync::mpsc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn layout(enemies: &[(i32, i32)]) -> RpgConfig {
        RpgConfig {
            layout: WorldLayout::Fixed {
                shop: Some(Position::new(0, 0)),
                inn: Some(Position::new(9, 9)),
                enemies: enemies.iter().map(|&p| p.into()).collect(),
            },
            ..RpgConfig::default()
        }
    }

    fn session(config: RpgConfig, rolls: &[u32]) -> RpgSession<ScriptedDice> {
        RpgSession::new(
            config,
            ScriptedDice::new(rolls.iter().copied()),
            MemoryStore::new(),
            Notifier::detached(),
        )
        .unwrap()
    }

    /// A session standing next to an enemy at (6, 5).
    fn beside_enemy(rolls: &[u32]) -> RpgSession<ScriptedDice> {
        session(layout(&[(6, 5)]), rolls)
    }

    #[test]
    fn test_initial_state() {
        let s = session(RpgConfig::default(), &[]);
        assert_eq!(s.mode(), Mode::World);
        assert_eq!(s.position(), Position::new(5, 5));
        assert_eq!(s.player(), &Character::hero());
        assert_eq!(s.message(), MSG_WELCOME);
        assert!(s.enemy().is_none());
    }

    #[test]
    fn test_move_onto_grass() {
        let mut s = session(RpgConfig::default(), &[]);
        assert_eq!(s.move_player(Direction::Up).unwrap(), Outcome::Applied);
        assert_eq!(s.position(), Position::new(5, 4));
        assert_eq!(s.message(), MSG_MOVE);
    }

    #[test]
    fn test_move_into_edge_is_noop() {
        let config = RpgConfig {
            start: Position::new(0, 0),
            layout: WorldLayout::Fixed {
                shop: None,
                inn: None,
                enemies: vec![],
            },
            ..RpgConfig::default()
        };
        let mut s = session(config, &[]);
        let before = s.message().to_string();
        assert_eq!(s.move_player(Direction::Left).unwrap(), Outcome::Ignored);
        assert_eq!(s.position(), Position::new(0, 0));
        assert_eq!(s.message(), before);
    }

    #[test]
    fn test_move_into_enemy_starts_combat() {
        let mut s = beside_enemy(&[]);
        s.move_player(Direction::Right).unwrap();
        assert_eq!(s.mode(), Mode::Combat);
        assert_eq!(s.enemy_position(), Some(Position::new(6, 5)));
        let enemy = s.enemy().unwrap();
        assert_eq!((enemy.hp, enemy.max_hp, enemy.attack, enemy.gold), (50, 50, 15, 20));
    }

    #[test]
    fn test_move_ignored_outside_world() {
        let mut s = beside_enemy(&[]);
        s.move_player(Direction::Right).unwrap();
        assert_eq!(s.move_player(Direction::Left).unwrap(), Outcome::Ignored);
        assert_eq!(s.position(), Position::new(6, 5));
    }

    #[test]
    fn test_attack_then_delayed_retaliation() {
        // Player roll 5 -> 15 damage; enemy roll 9 -> 14 damage.
        let mut s = beside_enemy(&[5, 9]);
        s.move_player(Direction::Right).unwrap();
        s.attack().unwrap();
        assert_eq!(s.enemy().unwrap().hp, 35);
        assert_eq!(s.message(), "You attack for 15 damage!");
        assert_eq!(s.player().hp, 100);

        s.advance(ms(999)).unwrap();
        assert_eq!(s.player().hp, 100);
        s.advance(ms(1)).unwrap();
        assert_eq!(s.player().hp, 86);
        assert_eq!(s.message(), "Goblin attacks for 14 damage!");
    }

    #[test]
    fn test_kill_rewards_and_respawns() {
        // Roll 45 of 60 -> 55 damage against 50 hp.
        let mut s = beside_enemy(&[45]);
        s.player.attack = 60;
        s.move_player(Direction::Right).unwrap();
        s.attack().unwrap();
        assert_eq!(s.mode(), Mode::World);
        assert!(s.enemy().is_none());
        assert_eq!(s.player().gold, 20);
        assert_eq!(s.player().xp, 20);
        assert_eq!(
            s.message(),
            "You defeated the Goblin! Gained 20 gold and 20 XP."
        );
        assert_eq!(s.world().get(Position::new(6, 5)), Some(Tile::Grass));

        s.advance(ms(4999)).unwrap();
        assert_eq!(s.world().get(Position::new(6, 5)), Some(Tile::Grass));
        s.advance(ms(1)).unwrap();
        assert_eq!(s.world().get(Position::new(6, 5)), Some(Tile::Enemy));
    }

    #[test]
    fn test_kill_drops_pending_retaliation() {
        let mut s = beside_enemy(&[0, 45]);
        s.player.attack = 60;
        s.move_player(Direction::Right).unwrap();
        s.attack().unwrap(); // 10 damage, retaliation pending
        s.attack().unwrap(); // 55 damage, kill
        assert_eq!(s.mode(), Mode::World);
        s.advance(ms(1000)).unwrap();
        assert_eq!(s.player().hp, 100);
    }

    #[test]
    fn test_defend_halves_damage() {
        let mut s = beside_enemy(&[14]);
        s.move_player(Direction::Right).unwrap();
        assert_eq!(s.defend(), Outcome::Applied);
        s.advance(ms(1000)).unwrap();
        assert_eq!(s.player().hp, 91);
    }

    #[test]
    fn test_flee_drops_retaliation() {
        let mut s = beside_enemy(&[0, 14]);
        s.move_player(Direction::Right).unwrap();
        s.attack().unwrap();
        assert_eq!(s.flee(), Outcome::Applied);
        assert_eq!(s.mode(), Mode::World);
        assert!(s.enemy().is_none());
        s.advance(ms(2000)).unwrap();
        assert_eq!(s.player().hp, 100);
        assert_eq!(s.world().get(Position::new(6, 5)), Some(Tile::Enemy));
    }

    #[test]
    fn test_retaliation_bound_to_its_encounter() {
        // Fight one: attack, flee. Fight two starts before fight one's turn.
        let config = layout(&[(6, 5), (7, 5)]);
        let mut s = session(config, &[0, 14]);
        s.move_player(Direction::Right).unwrap();
        s.attack().unwrap();
        s.flee();
        s.move_player(Direction::Right).unwrap();
        assert_eq!(s.mode(), Mode::Combat);
        s.advance(ms(1000)).unwrap();
        assert_eq!(s.player().hp, 100);
        assert_eq!(s.enemy().unwrap().hp, 50);
    }

    #[test]
    fn test_defeat_resets_player() {
        let mut s = beside_enemy(&[0, 14]);
        s.player.hp = 10;
        s.player.gold = 99;
        s.move_player(Direction::Right).unwrap();
        s.attack().unwrap();
        s.advance(ms(1000)).unwrap();
        assert_eq!(s.mode(), Mode::World);
        assert_eq!(s.player(), &Character::hero());
        assert_eq!(s.position(), Position::new(5, 5));
        assert_eq!(s.message(), "You were defeated! Game Over.");
        assert_eq!(s.stats().defeats, 1);
    }

    #[test]
    fn test_level_up_notifies_host() {
        let (tx, rx) = mpsc::channel();
        let mut s = RpgSession::new(
            layout(&[(6, 5)]),
            ScriptedDice::new([49]),
            MemoryStore::new(),
            Notifier::new(tx),
        )
        .unwrap();
        s.player.xp = 90;
        s.player.attack = 50;
        s.move_player(Direction::Right).unwrap();
        s.attack().unwrap();
        assert_eq!(s.player().level, 2);
        assert_eq!(s.stats().level_ups, 1);
        assert_eq!(s.stats().kills, 1);
        assert!(s.message().contains("Leveled up to 2!"));
        assert_eq!(
            rx.try_recv().unwrap(),
            r#"{"event":"level_up","data":{"level":2}}"#
        );
    }

    #[test]
    fn test_close_notifies_host() {
        let (tx, rx) = mpsc::channel();
        let mut s = RpgSession::new(
            RpgConfig::default(),
            ScriptedDice::default(),
            MemoryStore::new(),
            Notifier::new(tx),
        )
        .unwrap();
        s.close();
        assert_eq!(rx.try_recv().unwrap(), "close_webview");
    }

    #[test]
    fn test_shop_purchases() {
        let mut s = session(RpgConfig::default(), &[]);
        s.position = Position::new(1, 0);
        s.move_player(Direction::Left).unwrap();
        assert_eq!(s.mode(), Mode::Shop);

        assert_eq!(s.buy_potion(), Outcome::Rejected);
        assert_eq!(s.message(), MSG_NO_GOLD);

        s.player.gold = 60;
        s.player.hp = 70;
        assert_eq!(s.buy_potion(), Outcome::Applied);
        assert_eq!((s.player().hp, s.player().gold), (100, 50));
        assert_eq!(s.buy_sword(), Outcome::Applied);
        assert_eq!((s.player().attack, s.player().gold), (25, 0));
        assert_eq!(s.buy_sword(), Outcome::Rejected);

        assert_eq!(s.leave(Mode::Inn), Outcome::Ignored);
        assert_eq!(s.leave(Mode::Shop), Outcome::Applied);
        assert_eq!(s.mode(), Mode::World);
    }

    #[test]
    fn test_inn_rest() {
        let mut s = session(RpgConfig::default(), &[]);
        s.position = Position::new(9, 8);
        s.move_player(Direction::Down).unwrap();
        assert_eq!(s.mode(), Mode::Inn);
        s.player.hp = 3;
        assert_eq!(s.rest(), Outcome::Rejected);
        assert_eq!(s.player().hp, 3);
        s.player.gold = 20;
        assert_eq!(s.rest(), Outcome::Applied);
        assert_eq!((s.player().hp, s.player().gold), (100, 0));
        assert_eq!(s.dispatch(RpgCommand::LeaveInn).unwrap(), Outcome::Applied);
    }

    #[test]
    fn test_next_step_prefers_larger_offset() {
        let from = Position::new(5, 5);
        assert_eq!(next_step_toward(from, Position::new(6, 9)), Some(Position::new(5, 6)));
        assert_eq!(next_step_toward(from, Position::new(9, 6)), Some(Position::new(6, 5)));
        assert_eq!(next_step_toward(from, Position::new(3, 3)), Some(Position::new(4, 5)));
        assert_eq!(next_step_toward(from, from), None);
    }

    #[test]
    fn test_travel_one_step_per_interval() {
        let config = layout(&[]);
        let mut s = session(config, &[]);
        s.travel_to(Position::new(7, 4)).unwrap();
        assert!(s.is_traveling());

        s.advance(ms(199)).unwrap();
        assert_eq!(s.position(), Position::new(5, 5));
        s.advance(ms(1)).unwrap();
        assert_eq!(s.position(), Position::new(6, 5));
        s.advance(ms(400)).unwrap();
        assert_eq!(s.position(), Position::new(7, 4));
        assert_eq!(s.destination(), None);
        assert!(!s.is_traveling());
    }

    #[test]
    fn test_travel_stops_at_enemy() {
        let mut s = session(layout(&[(7, 5)]), &[]);
        s.travel_to(Position::new(9, 5)).unwrap();
        s.advance(ms(2000)).unwrap();
        assert_eq!(s.mode(), Mode::Combat);
        assert_eq!(s.position(), Position::new(7, 5));
        assert_eq!(s.destination(), None);
        assert_eq!(s.pending_tasks(), 0);
    }

    #[test]
    fn test_manual_move_cancels_travel() {
        let mut s = session(layout(&[]), &[]);
        s.travel_to(Position::new(9, 5)).unwrap();
        s.move_player(Direction::Up).unwrap();
        assert_eq!(s.destination(), None);
        s.advance(ms(2000)).unwrap();
        assert_eq!(s.position(), Position::new(5, 4));
    }

    #[test]
    fn test_travel_off_map_is_fault() {
        let mut s = session(layout(&[]), &[]);
        assert!(matches!(
            s.travel_to(Position::new(10, 0)),
            Err(GameError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_respawn_lapses_after_regeneration() {
        let mut s = beside_enemy(&[45]);
        s.player.attack = 60;
        s.move_player(Direction::Right).unwrap();
        s.attack().unwrap();
        assert_eq!(s.world().get(Position::new(6, 5)), Some(Tile::Grass));

        s.config.layout = WorldLayout::Fixed {
            shop: None,
            inn: None,
            enemies: vec![],
        };
        s.regenerate_world().unwrap();
        s.advance(ms(5000)).unwrap();
        assert_eq!(s.world().get(Position::new(6, 5)), Some(Tile::Grass));
    }

    #[test]
    fn test_persists_on_mutation_and_restores() {
        let mut store = MemoryStore::new();
        let mut hero = Character::hero();
        hero.gold = 42;
        hero.level = 3;
        store
            .save("rpg-player-progress", &hero.encode().unwrap())
            .unwrap();

        let s = RpgSession::new(
            RpgConfig::default(),
            ScriptedDice::default(),
            store,
            Notifier::detached(),
        )
        .unwrap();
        assert_eq!(s.player(), &hero);
        assert_eq!(s.message(), MSG_WELCOME_BACK);
    }

    #[test]
    fn test_malformed_save_falls_back() {
        let mut store = MemoryStore::new();
        store.save("rpg-player-progress", "{broken").unwrap();
        let s = RpgSession::new(
            RpgConfig::default(),
            ScriptedDice::default(),
            store,
            Notifier::detached(),
        )
        .unwrap();
        assert_eq!(s.player(), &Character::hero());
        assert_eq!(s.message(), MSG_WELCOME);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = RpgConfig {
            enemy_turn_ms: 0,
            ..RpgConfig::default()
        };
        assert!(matches!(
            RpgSession::seeded(config, 1),
            Err(GameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_runaway_level_save_falls_back() {
        let mut store = MemoryStore::new();
        store
            .save(
                "rpg-player-progress",
                r#"{"name":"Hero","hp":100,"maxHp":100,"attack":20,"gold":0,"level":4294967295,"xp":4294967295}"#,
            )
            .unwrap();
        let s = RpgSession::new(
            RpgConfig::default(),
            ScriptedDice::default(),
            store,
            Notifier::detached(),
        )
        .unwrap();
        assert_eq!(s.player(), &Character::hero());
        assert_eq!(s.message(), MSG_WELCOME);
    }

    #[test]
    fn test_snapshot_projection() {
        let mut s = beside_enemy(&[]);
        s.move_player(Direction::Right).unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.mode, Mode::Combat);
        assert_eq!(snap.enemy_position, Some(Position::new(6, 5)));
        assert_eq!(snap.xp_to_next_level, 100);
        assert_eq!(snap.grid.len(), 10);
        assert_eq!(snap.grid[5][6], Tile::Enemy);
    }
}
