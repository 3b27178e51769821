//! Tiles ("segments") and the curve fragments distributed into them.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::Serialize;
use tidewater_core::enums::{Border, TileKind};
use tidewater_core::types::{CurveId, FragmentId, TileCoord, WorldRect};

use crate::cache::TileMesh;
use crate::error::CoastError;
use crate::mask::MaskHeader;
use crate::projection::MaskProjection;

/// Fixed square tiling of the mask.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    /// Tile edge in pixels.
    pub tile_pixels: u32,
    /// Tiles west to east.
    pub columns: u32,
    /// Tiles south to north.
    pub rows: u32,
    projection: MaskProjection,
}

impl TileGrid {
    /// Tiling for a mask.
    ///
    /// A forced `tile_pixels` wins; otherwise the edge is the smallest power
    /// of two pixel count spanning at least `min_tile_extent` meters. The mask
    /// must divide evenly into tiles.
    pub fn new(
        header: &MaskHeader,
        tile_pixels: Option<u32>,
        min_tile_extent: f64,
    ) -> Result<Self, CoastError> {
        let tile_pixels = match tile_pixels {
            Some(0) => {
                return Err(CoastError::InvalidMetadata(
                    "tile_pixels must be at least 1".into(),
                ))
            }
            Some(p) => p,
            None => Self::derived_tile_pixels(header.pixel_size, min_tile_extent)?,
        };

        if header.width == 0 || header.height == 0 {
            return Err(CoastError::InvalidMetadata("mask has no pixels".into()));
        }
        if header.width % tile_pixels != 0 || header.height % tile_pixels != 0 {
            return Err(CoastError::MisalignedDimensions {
                width: header.width,
                height: header.height,
                tile_pixels,
            });
        }

        Ok(Self {
            tile_pixels,
            columns: header.width / tile_pixels,
            rows: header.height / tile_pixels,
            projection: MaskProjection::new(header.origin, header.pixel_size),
        })
    }

    fn derived_tile_pixels(pixel_size: f64, min_tile_extent: f64) -> Result<u32, CoastError> {
        if !(pixel_size.is_finite() && pixel_size > 0.0) {
            return Err(CoastError::InvalidMetadata(format!(
                "pixel size must be positive, got {pixel_size}"
            )));
        }
        let mut pixels: u32 = 1;
        while (pixels as f64) * pixel_size < min_tile_extent {
            pixels = pixels.checked_mul(2).ok_or_else(|| {
                CoastError::InvalidMetadata(format!(
                    "no tile size reaches {min_tile_extent} m with {pixel_size} m pixels"
                ))
            })?;
        }
        Ok(pixels)
    }

    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Tile edge length in meters.
    pub fn tile_extent(&self) -> f64 {
        self.tile_pixels as f64 * self.projection.pixel_size
    }

    /// Linear index of a tile, `None` when out of range.
    pub fn index(&self, coord: TileCoord) -> Option<usize> {
        (coord.x < self.columns && coord.y < self.rows)
            .then(|| coord.y as usize * self.columns as usize + coord.x as usize)
    }

    pub fn coord(&self, index: usize) -> TileCoord {
        let columns = self.columns.max(1) as usize;
        TileCoord::new((index % columns) as u32, (index / columns) as u32)
    }

    /// All tiles, row by row from the south-west.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (0..self.tile_count()).map(|i| self.coord(i))
    }

    /// World rectangle of a tile.
    pub fn rect(&self, coord: TileCoord) -> WorldRect {
        let extent = self.tile_extent();
        let min = self.projection.origin + DVec2::new(coord.x as f64, coord.y as f64) * extent;
        WorldRect::new(min, min + DVec2::splat(extent))
    }

    /// Tile holding fractional grid coordinates, clamped into the map.
    pub fn tile_of_grid(&self, g: DVec2) -> TileCoord {
        let tp = self.tile_pixels as f64;
        let x = (g.x / tp).floor().clamp(0.0, (self.columns - 1) as f64);
        let y = (g.y / tp).floor().clamp(0.0, (self.rows - 1) as f64);
        TileCoord::new(x as u32, y as u32)
    }

    /// Tiles overlapping a world rectangle, row by row from the south-west.
    /// Tiles that only touch its edge are left out.
    pub fn tiles_in(&self, window: &WorldRect) -> impl Iterator<Item = TileCoord> {
        let extent = self.tile_extent();
        let origin = self.projection.origin;
        let span = |lo: f64, hi: f64, origin: f64, count: u32| {
            let first = ((lo - origin) / extent).floor().max(0.0);
            let last = (((hi - origin) / extent).ceil() - 1.0).min(count as f64 - 1.0);
            (first.is_finite() && last.is_finite() && first <= last)
                .then(|| first as u32..=last as u32)
        };
        let columns = span(window.min.x, window.max.x, origin.x, self.columns);
        let rows = span(window.min.y, window.max.y, origin.y, self.rows);
        let (columns, rows) = match (columns, rows) {
            (Some(c), Some(r)) => (c, r),
            _ => (1..=0, 1..=0),
        };
        rows.flat_map(move |y| columns.clone().map(move |x| TileCoord::new(x, y)))
    }

    /// Tile holding a world position; `None` outside the map.
    pub fn tile_at(&self, pos: DVec2) -> Option<TileCoord> {
        let g = self.projection.world_to_grid(pos) / self.tile_pixels as f64;
        if g.x < 0.0 || g.y < 0.0 || !g.x.is_finite() || !g.y.is_finite() {
            return None;
        }
        let coord = TileCoord::new(g.x.floor() as u32, g.y.floor() as u32);
        self.index(coord).map(|_| coord)
    }

    /// Centre pixel of a tile.
    pub fn center_pixel(&self, coord: TileCoord) -> (u32, u32) {
        let half = self.tile_pixels / 2;
        (
            coord.x * self.tile_pixels + half,
            coord.y * self.tile_pixels + half,
        )
    }
}

/// Portion of one curve lying inside one tile ("SegCl").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegCl {
    pub curve: CurveId,
    /// Parameter range `begin_t < end_t`. The range of a closed curve's seam
    /// fragment extends past 1.
    pub begin_t: f64,
    pub end_t: f64,
    /// Tile side the fragment enters through; `None` for an interior start.
    pub begin_border: Option<Border>,
    /// Tile side the fragment leaves through; `None` for an interior end.
    pub end_border: Option<Border>,
    /// World position of the start, on the border line when `begin_border` is set.
    pub begin: DVec2,
    /// World position of the end, on the border line when `end_border` is set.
    pub end: DVec2,
    /// Successor within the same tile.
    pub next: Option<FragmentId>,
    /// A whole closed curve inside one tile.
    pub cyclic: bool,
}

impl SegCl {
    /// Parameter length of the fragment.
    pub fn span(&self) -> f64 {
        self.end_t - self.begin_t
    }
}

/// One tile of the map.
#[derive(Debug, Clone)]
pub struct Segment {
    pub coord: TileCoord,
    pub rect: WorldRect,
    pub kind: TileKind,
    pub fragments: Vec<SegCl>,
    cache: BTreeMap<i32, TileMesh>,
}

impl Segment {
    pub fn new(coord: TileCoord, rect: WorldRect) -> Self {
        Self {
            coord,
            rect,
            kind: TileKind::Sea,
            fragments: Vec::new(),
            cache: BTreeMap::new(),
        }
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&SegCl> {
        self.fragments.get(id.0)
    }

    /// Append a fragment, returning its id.
    pub fn push_fragment(&mut self, fragment: SegCl) -> FragmentId {
        self.fragments.push(fragment);
        FragmentId(self.fragments.len() - 1)
    }

    pub fn cached(&self, detail: i32) -> Option<&TileMesh> {
        self.cache.get(&detail)
    }

    pub fn store_cache(&mut self, detail: i32, mesh: TileMesh) {
        self.cache.insert(detail, mesh);
    }

    pub fn cached_details(&self) -> impl Iterator<Item = i32> + '_ {
        self.cache.keys().copied()
    }
}

/// Move `p` onto the given side of `rect`, clamped to the side's extent.
pub fn project_to_border(rect: &WorldRect, border: Border, p: DVec2) -> DVec2 {
    let x = p.x.clamp(rect.min.x, rect.max.x);
    let y = p.y.clamp(rect.min.y, rect.max.y);
    match border {
        Border::Top => DVec2::new(x, rect.max.y),
        Border::Right => DVec2::new(rect.max.x, y),
        Border::Bottom => DVec2::new(x, rect.min.y),
        Border::Left => DVec2::new(rect.min.x, y),
    }
}
