//! The RPG's square tile grid.

use serde::{Deserialize, Serialize};

use crate::config::WorldLayout;
use crate::dice::Dice;
use crate::error::GameError;
use crate::grid::Position;

/// Content of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Tile {
    /// Empty ground.
    #[default]
    Grass = 0,
    /// An enemy waiting to be fought.
    Enemy = 1,
    /// The shop.
    Shop = 2,
    /// The inn.
    Inn = 3,
}

impl Tile {
    /// Whether stepping onto this tile leaves the World state.
    #[must_use]
    pub const fn is_interactive(self) -> bool {
        !matches!(self, Tile::Grass)
    }
}

/// Square grid of tiles, fixed shape, mutable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridWorld {
    /// Side length.
    side: i32,
    /// Tiles stored in row-major order.
    tiles: Vec<Tile>,
}

impl GridWorld {
    /// Create an all-grass grid.
    ///
    /// Returns `None` if `side` is not positive.
    #[must_use]
    pub fn new(side: i32) -> Option<Self> {
        let n = usize::try_from(side).ok().filter(|&n| n > 0)?;
        Some(Self {
            side,
            tiles: vec![Tile::Grass; n * n],
        })
    }

    /// Build a grid with an optional shop, an optional inn and enemies on
    /// fixed cells.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if a cell lies off the grid or the
    /// side is not positive.
    pub fn generate(
        side: i32,
        shop: Option<Position>,
        inn: Option<Position>,
        enemies: &[Position],
    ) -> Result<Self, GameError> {
        let mut world = Self::new(side).ok_or(GameError::OutOfBounds { x: 0, y: 0, side })?;
        world.place_landmarks(shop, inn)?;
        for &pos in enemies {
            world.set_tile(pos, Tile::Enemy)?;
        }
        Ok(world)
    }

    /// Build a grid where every cell other than the shop and inn holds an
    /// enemy with independent probability `enemy_chance`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if the shop or inn lies off the
    /// grid or the side is not positive.
    pub fn scatter(
        side: i32,
        shop: Option<Position>,
        inn: Option<Position>,
        enemy_chance: f64,
        dice: &mut impl Dice,
    ) -> Result<Self, GameError> {
        let mut world = Self::new(side).ok_or(GameError::OutOfBounds { x: 0, y: 0, side })?;
        for tile in &mut world.tiles {
            if dice.chance(enemy_chance) {
                *tile = Tile::Enemy;
            }
        }
        world.place_landmarks(shop, inn)?;
        Ok(world)
    }

    /// Build a grid from a configured layout.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] if the layout names a cell off the
    /// grid.
    pub fn from_layout(
        side: i32,
        layout: &WorldLayout,
        dice: &mut impl Dice,
    ) -> Result<Self, GameError> {
        match layout {
            WorldLayout::Fixed { shop, inn, enemies } => Self::generate(side, *shop, *inn, enemies),
            WorldLayout::Scattered {
                enemy_chance,
                shop,
                inn,
            } => Self::scatter(side, *shop, *inn, *enemy_chance, dice),
        }
    }

    fn place_landmarks(
        &mut self,
        shop: Option<Position>,
        inn: Option<Position>,
    ) -> Result<(), GameError> {
        if let Some(pos) = shop {
            self.set_tile(pos, Tile::Shop)?;
        }
        if let Some(pos) = inn {
            self.set_tile(pos, Tile::Inn)?;
        }
        Ok(())
    }

    /// Side length of the grid.
    #[must_use]
    pub const fn side(&self) -> i32 {
        self.side
    }

    /// Check if a position is on the grid.
    #[must_use]
    pub const fn in_bounds(&self, pos: Position) -> bool {
        pos.in_bounds(self.side)
    }

    fn index(&self, pos: Position) -> Result<usize, GameError> {
        if !self.in_bounds(pos) {
            return Err(GameError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                side: self.side,
            });
        }
        // Both coordinates are in [0, side) so the casts are lossless.
        #[allow(clippy::cast_sign_loss)]
        let idx = pos.y as usize * self.side as usize + pos.x as usize;
        Ok(idx)
    }

    /// Tile at `pos`, or `None` off the grid.
    #[must_use]
    pub fn get(&self, pos: Position) -> Option<Tile> {
        self.index(pos).ok().map(|idx| self.tiles[idx])
    }

    /// Tile at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] off the grid.
    pub fn tile_at(&self, pos: Position) -> Result<Tile, GameError> {
        self.index(pos).map(|idx| self.tiles[idx])
    }

    /// Overwrite the tile at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] off the grid.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> Result<(), GameError> {
        let idx = self.index(pos)?;
        self.tiles[idx] = tile;
        Ok(())
    }

    /// Reset the tile at `pos` to grass.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] off the grid.
    pub fn clear_tile(&mut self, pos: Position) -> Result<(), GameError> {
        self.set_tile(pos, Tile::Grass)
    }

    /// Iterate over all positions and tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, Tile)> + '_ {
        let side = self.side;
        self.tiles.iter().enumerate().map(move |(idx, &tile)| {
            // idx < side * side <= i32::MAX
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let idx = idx as i32;
            (Position::new(idx % side, idx / side), tile)
        })
    }

    /// Count tiles of one kind.
    #[must_use]
    pub fn count(&self, kind: Tile) -> usize {
        self.tiles.iter().filter(|&&tile| tile == kind).count()
    }

    /// Tiles as rows, top to bottom.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<Tile>> {
        #[allow(clippy::cast_sign_loss)]
        let width = self.side as usize;
        self.tiles.chunks(width).map(<[Tile]>::to_vec).collect()
    }
}
