//! Mask projection: converts between pixel-corner coordinates and world meters.
//!
//! World `x` grows east and world `y` grows north. The mask origin offset is
//! the world position of the south-west corner of the raster.

use glam::DVec2;
use tidewater_core::types::GridPoint;

/// Linear mapping from mask grid coordinates to world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskProjection {
    /// World position of vertex (0, 0) in meters.
    pub origin: DVec2,
    /// Edge length of one pixel in meters.
    pub pixel_size: f64,
}

impl MaskProjection {
    pub fn new(origin: DVec2, pixel_size: f64) -> Self {
        Self { origin, pixel_size }
    }

    /// World position of an integer pixel-corner vertex.
    pub fn to_world(&self, p: GridPoint) -> DVec2 {
        self.grid_to_world(p.as_dvec2())
    }

    /// World position of fractional grid coordinates.
    pub fn grid_to_world(&self, g: DVec2) -> DVec2 {
        self.origin + g * self.pixel_size
    }

    /// Fractional grid coordinates of a world position.
    pub fn world_to_grid(&self, w: DVec2) -> DVec2 {
        (w - self.origin) / self.pixel_size
    }

    /// Pixels per meter, the inverse of the pixel size.
    pub fn pixels_per_meter(&self) -> f64 {
        1.0 / self.pixel_size
    }
}
