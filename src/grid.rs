//! Grid coordinates and movement directions shared by both games.

use serde::{Deserialize, Serialize};

/// A cell on a square grid.
///
/// Coordinates are signed so that a step off the edge can be represented
/// before it is clamped (RPG) or wrapped (Snake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row, growing downwards.
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by a raw delta without any bounds handling.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Check whether the position lies inside `[0, side)` on both axes.
    #[must_use]
    pub const fn in_bounds(self, side: i32) -> bool {
        self.x >= 0 && self.x < side && self.y >= 0 && self.y < side
    }

    /// Clamp each axis independently into `[0, side)`.
    #[must_use]
    pub fn clamped(self, side: i32) -> Self {
        let max = (side - 1).max(0);
        Self::new(self.x.clamp(0, max), self.y.clamp(0, max))
    }

    /// Wrap each axis modulo `side` (toroidal topology).
    #[must_use]
    pub fn wrapped(self, side: i32) -> Self {
        Self::new(self.x.rem_euclid(side), self.y.rem_euclid(side))
    }

    /// Signed offset from `self` to `other`.
    #[must_use]
    pub const fn delta_to(self, other: Self) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl From<Position> for (i32, i32) {
    fn from(pos: Position) -> Self {
        (pos.x, pos.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four unit movement vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `(0, -1)`
    Up,
    /// `(0, 1)`
    Down,
    /// `(-1, 0)`
    Left,
    /// `(1, 0)`
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// The unit vector for this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// The direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Whether both directions move along the same axis.
    ///
    /// True for the direction itself and for its opposite.
    #[must_use]
    pub const fn shares_axis(self, other: Self) -> bool {
        let (ax, _) = self.delta();
        let (bx, _) = other.delta();
        (ax == 0) == (bx == 0)
    }

    /// Step one cell from `pos`, without bounds handling.
    #[must_use]
    pub const fn step(self, pos: Position) -> Position {
        let (dx, dy) = self.delta();
        pos.offset(dx, dy)
    }
}
