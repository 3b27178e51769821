//! Enumeration types used throughout the coastline engine.

use serde::{Deserialize, Serialize};

/// Classification of a map tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Open water, no coastline.
    #[default]
    Sea,
    /// Solid land, no coastline.
    Land,
    /// Contains at least one coastline fragment.
    Mixed,
}

impl TileKind {
    /// True for tiles that are rendered as a single flat quad.
    pub fn is_pure(self) -> bool {
        !matches!(self, TileKind::Mixed)
    }
}

/// One side of a rectangle (tile or whole map).
///
/// The discriminants are the conventional border indices
/// 0 = top, 1 = right, 2 = bottom, 3 = left, which is also clockwise order
/// with world `y` pointing north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Border {
    Top = 0,
    Right = 1,
    Bottom = 2,
    Left = 3,
}

impl Border {
    pub const ALL: [Border; 4] = [Border::Top, Border::Right, Border::Bottom, Border::Left];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Border> {
        Border::ALL.get(index).copied()
    }

    /// The side reached after turning one corner clockwise.
    pub fn next_clockwise(self) -> Border {
        Border::ALL[(self.index() + 1) % 4]
    }

    /// The side facing this one.
    pub fn opposite(self) -> Border {
        Border::ALL[(self.index() + 2) % 4]
    }
}

/// Step direction along pixel-corner vertices.
///
/// Counter-clockwise order, so `+1` is a left turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East = 0,
    North = 1,
    West = 2,
    South = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn left(self) -> Direction {
        Direction::ALL[(self.index() + 1) % 4]
    }

    pub fn right(self) -> Direction {
        Direction::ALL[(self.index() + 3) % 4]
    }

    pub fn reverse(self) -> Direction {
        Direction::ALL[(self.index() + 2) % 4]
    }

    /// Grid offset `(dx, dy)` of one step.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::North => (0, 1),
            Direction::West => (-1, 0),
            Direction::South => (0, -1),
        }
    }

    /// Signed turn from `self` to `next`: +1 left, -1 right, 0 straight.
    ///
    /// A reversal counts as 0; the tracer never produces one.
    pub fn turn_to(self, next: Direction) -> i32 {
        match (next.index() + 4 - self.index()) % 4 {
            1 => 1,
            3 => -1,
            _ => 0,
        }
    }
}
