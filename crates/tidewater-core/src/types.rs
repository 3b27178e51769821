//! Fundamental geometric and indexing types.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::enums::{Border, Direction};

/// Pixel-corner vertex of the raster mask.
///
/// Vertex `(x, y)` is the south-west corner of pixel `(x, y)`; valid
/// vertices satisfy `0 <= x <= width` and `0 <= y <= height`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbouring vertex one step in `dir`.
    pub fn step(self, dir: Direction) -> GridPoint {
        let (dx, dy) = dir.offset();
        GridPoint::new(self.x + dx, self.y + dy)
    }

    pub fn as_dvec2(self) -> DVec2 {
        DVec2::new(self.x as f64, self.y as f64)
    }
}

/// Integer tile coordinates. Tile `(0, 0)` is the south-west tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Index of a global coastline curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CurveId(pub usize);

/// Index of a curve fragment within one tile's fragment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentId(pub usize);

/// Axis-aligned rectangle in world coordinates (meters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    pub min: DVec2,
    pub max: DVec2,
}

impl WorldRect {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Half-open containment: the max edges belong to the next rectangle.
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    pub fn intersects(&self, other: &WorldRect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Total boundary length.
    pub fn perimeter(&self) -> f64 {
        2.0 * (self.width() + self.height())
    }

    /// Corner reached at the clockwise end of `border`.
    pub fn corner_after(&self, border: Border) -> DVec2 {
        match border {
            Border::Top => DVec2::new(self.max.x, self.max.y),
            Border::Right => DVec2::new(self.max.x, self.min.y),
            Border::Bottom => DVec2::new(self.min.x, self.min.y),
            Border::Left => DVec2::new(self.min.x, self.max.y),
        }
    }

    /// Clockwise arc length from the north-west corner to `p` on `border`.
    ///
    /// Top runs west to east, right north to south, bottom east to west and
    /// left south to north. `p` is clamped onto the side first.
    pub fn perimeter_position(&self, border: Border, p: DVec2) -> f64 {
        let w = self.width();
        let h = self.height();
        let x = p.x.clamp(self.min.x, self.max.x);
        let y = p.y.clamp(self.min.y, self.max.y);
        match border {
            Border::Top => x - self.min.x,
            Border::Right => w + (self.max.y - y),
            Border::Bottom => w + h + (self.max.x - x),
            Border::Left => 2.0 * w + h + (y - self.min.y),
        }
    }

    /// Perimeter positions of the four corners, clockwise from the
    /// north-east corner, paired with the corner points.
    pub fn corner_positions(&self) -> [(f64, DVec2); 4] {
        let w = self.width();
        let h = self.height();
        [
            (w, self.corner_after(Border::Top)),
            (w + h, self.corner_after(Border::Right)),
            (2.0 * w + h, self.corner_after(Border::Bottom)),
            (2.0 * (w + h), self.corner_after(Border::Left)),
        ]
    }

    /// Clockwise distance along the boundary from `(from_border, from)` to
    /// `(to_border, to)`, in `[0, perimeter)`.
    pub fn clockwise_distance(
        &self,
        from_border: Border,
        from: DVec2,
        to_border: Border,
        to: DVec2,
    ) -> f64 {
        let a = self.perimeter_position(from_border, from);
        let b = self.perimeter_position(to_border, to);
        (b - a).rem_euclid(self.perimeter())
    }
}
