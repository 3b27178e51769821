//! RasterMask: the 1-bit land/sea raster the coastline engine is built from.

use glam::DVec2;
use tidewater_core::types::WorldRect;

use crate::projection::MaskProjection;

/// Raster mask metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskHeader {
    /// Number of columns (west to east).
    pub width: u32,
    /// Number of rows (south to north).
    pub height: u32,
    /// Edge length of one pixel in meters.
    pub pixel_size: f64,
    /// World position of the south-west corner in meters.
    pub origin: DVec2,
}

impl MaskHeader {
    /// Real-world width of the whole mask in meters.
    pub fn real_width(&self) -> f64 {
        self.width as f64 * self.pixel_size
    }

    /// Real-world height of the whole mask in meters.
    pub fn real_height(&self) -> f64 {
        self.height as f64 * self.pixel_size
    }
}

/// Immutable land/sea raster.
///
/// Rows are stored south to north; pixel `(x, y)` covers the world square
/// whose south-west corner is vertex `(x, y)`.
#[derive(Debug, Clone)]
pub struct RasterMask {
    pub header: MaskHeader,
    /// Packed land mask: bit 1 = land, bit 0 = sea. One bit per pixel.
    bits: Vec<u8>,
}

impl RasterMask {
    /// Create a mask from packed bits (row-major, south row first).
    ///
    /// Missing trailing bytes read as sea.
    pub fn new(header: MaskHeader, bits: Vec<u8>) -> Self {
        Self { header, bits }
    }

    /// Build a mask by evaluating `is_land` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        pixel_size: f64,
        origin: DVec2,
        is_land: impl Fn(u32, u32) -> bool,
    ) -> Self {
        let cell_count = width as usize * height as usize;
        let mut bits = vec![0u8; cell_count.div_ceil(8)];
        for y in 0..height {
            for x in 0..width {
                if is_land(x, y) {
                    let i = y as usize * width as usize + x as usize;
                    bits[i / 8] |= 1 << (i % 8);
                }
            }
        }
        Self::new(
            MaskHeader {
                width,
                height,
                pixel_size,
                origin,
            },
            bits,
        )
    }

    /// Build a mask from text rows, `#` = land, anything else = sea.
    ///
    /// The first row is the northern edge, as the mask would be drawn.
    pub fn from_ascii(rows: &[&str], pixel_size: f64) -> Self {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        Self::from_fn(width, height, pixel_size, DVec2::ZERO, |x, y| {
            let row = rows[(height - 1 - y) as usize].as_bytes();
            row.get(x as usize) == Some(&b'#')
        })
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Projection from grid vertices to world meters.
    pub fn projection(&self) -> MaskProjection {
        MaskProjection::new(self.header.origin, self.header.pixel_size)
    }

    /// World rectangle covered by the mask.
    pub fn extent(&self) -> WorldRect {
        let min = self.header.origin;
        WorldRect::new(
            min,
            min + DVec2::new(self.header.real_width(), self.header.real_height()),
        )
    }

    /// Land test for an in-range pixel. Out-of-range pixels are sea.
    pub fn is_land(&self, x: u32, y: u32) -> bool {
        if x >= self.header.width || y >= self.header.height {
            return false;
        }
        let i = y as usize * self.header.width as usize + x as usize;
        self.bits
            .get(i / 8)
            .is_some_and(|byte| byte & (1 << (i % 8)) != 0)
    }

    /// Land test with coordinates clamped into the raster.
    ///
    /// Pixels beyond the border repeat the nearest border pixel, so no
    /// land/sea boundary ever runs along the outside of the map.
    pub fn land_clamped(&self, x: i64, y: i64) -> bool {
        if self.header.width == 0 || self.header.height == 0 {
            return false;
        }
        let cx = x.clamp(0, self.header.width as i64 - 1) as u32;
        let cy = y.clamp(0, self.header.height as i64 - 1) as u32;
        self.is_land(cx, cy)
    }

    /// Land test at a world position; positions outside the mask are sea.
    pub fn is_land_at(&self, pos: DVec2) -> bool {
        let g = self.projection().world_to_grid(pos);
        if g.x < 0.0 || g.y < 0.0 {
            return false;
        }
        self.is_land(g.x.floor() as u32, g.y.floor() as u32)
    }

    /// Number of land pixels.
    pub fn land_count(&self) -> usize {
        (0..self.header.height)
            .flat_map(|y| (0..self.header.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.is_land(x, y))
            .count()
    }

    /// Number of pixel edges separating land from sea.
    pub fn boundary_edge_count(&self) -> usize {
        let w = self.header.width;
        let h = self.header.height;
        let mut count = 0;
        for y in 0..h {
            for x in 0..w {
                let here = self.is_land(x, y);
                if x + 1 < w && here != self.is_land(x + 1, y) {
                    count += 1;
                }
                if y + 1 < h && here != self.is_land(x, y + 1) {
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_island_mask() -> RasterMask {
        RasterMask::from_ascii(
            &[
                ".....", //
                ".###.", //
                ".###.", //
                ".....", //
            ],
            100.0,
        )
    }

    #[test]
    fn test_ascii_rows_are_flipped() {
        let mask = RasterMask::from_ascii(&["#.", ".."], 1.0);
        // Top-left character is the north-west pixel.
        assert!(mask.is_land(0, 1));
        assert!(!mask.is_land(0, 0));
    }

    #[test]
    fn test_land_count_and_edges() {
        let mask = make_island_mask();
        assert_eq!(mask.land_count(), 6);
        // 3x2 block: perimeter of 10 pixel edges.
        assert_eq!(mask.boundary_edge_count(), 10);
    }

    #[test]
    fn test_land_clamped_repeats_border() {
        let mask = RasterMask::from_ascii(&["#.", "#."], 1.0);
        assert!(mask.land_clamped(-3, 0));
        assert!(mask.land_clamped(0, 9));
        assert!(!mask.land_clamped(7, 1));
    }

    #[test]
    fn test_is_land_at_world_position() {
        let mask = make_island_mask();
        // Pixel (2, 1) is land; its centre is at (250, 150).
        assert!(mask.is_land_at(DVec2::new(250.0, 150.0)));
        assert!(!mask.is_land_at(DVec2::new(50.0, 50.0)));
        assert!(!mask.is_land_at(DVec2::new(-10.0, 150.0)));
        assert!(!mask.is_land_at(DVec2::new(250.0, 1e6)));
    }

    #[test]
    fn test_extent() {
        let mut mask = make_island_mask();
        mask.header.origin = DVec2::new(1000.0, 2000.0);
        let e = mask.extent();
        assert!((e.min - DVec2::new(1000.0, 2000.0)).length() < 1e-12);
        assert!((e.max - DVec2::new(1500.0, 2400.0)).length() < 1e-12);
    }
}
