//! Map descriptor: the JSON file naming the mask image and its metadata.
//!
//! ```json
//! {
//!   "mask": "channel.png",
//!   "realwidth": 512000.0,
//!   "realoffset": [0.0, 0.0],
//!   "cities": [{ "name": "Dover", "position": [300000.0, 220000.0] }]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tidewater_core::constants::{
    DEFAULT_CONTROL_POINT_STRIDE, DEFAULT_MIN_TILE_EXTENT, DEFAULT_SAMPLES_PER_CONTROL_INTERVAL,
    DEFAULT_SPLINE_DEGREE, MAX_SPLINE_DEGREE,
};

use crate::error::CoastError;

/// Named position carried through for map labels. Not interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    /// World position in meters.
    pub position: [f64; 2],
}

/// Tuning knobs for curve fitting and tiling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoastSettings {
    /// Minimum tile edge length in meters when the tile size is derived.
    pub min_tile_extent: f64,
    /// Boundary vertices per B-spline control point.
    pub control_point_stride: usize,
    /// Requested B-spline degree (lowered for short chains).
    pub spline_degree: usize,
    /// Resampling density per control interval at detail level 0.
    pub samples_per_control_interval: usize,
}

impl Default for CoastSettings {
    fn default() -> Self {
        Self {
            min_tile_extent: DEFAULT_MIN_TILE_EXTENT,
            control_point_stride: DEFAULT_CONTROL_POINT_STRIDE,
            spline_degree: DEFAULT_SPLINE_DEGREE,
            samples_per_control_interval: DEFAULT_SAMPLES_PER_CONTROL_INTERVAL,
        }
    }
}

impl CoastSettings {
    pub fn validate(&self) -> Result<(), CoastError> {
        if !(self.min_tile_extent.is_finite() && self.min_tile_extent > 0.0) {
            return Err(CoastError::InvalidMetadata(format!(
                "min_tile_extent must be positive, got {}",
                self.min_tile_extent
            )));
        }
        if self.control_point_stride == 0 {
            return Err(CoastError::InvalidMetadata(
                "control_point_stride must be at least 1".into(),
            ));
        }
        if self.spline_degree == 0 || self.spline_degree > MAX_SPLINE_DEGREE {
            return Err(CoastError::InvalidMetadata(format!(
                "spline_degree must be in 1..={MAX_SPLINE_DEGREE}, got {}",
                self.spline_degree
            )));
        }
        if self.samples_per_control_interval == 0 {
            return Err(CoastError::InvalidMetadata(
                "samples_per_control_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Contents of a map descriptor file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDescriptor {
    /// Mask image path, relative to the descriptor's directory.
    pub mask: PathBuf,
    /// Real-world width of the mask in meters.
    pub realwidth: f64,
    /// World position of the mask's south-west corner in meters.
    #[serde(default)]
    pub realoffset: [f64; 2],
    /// Forced tile edge in pixels; derived from `min_tile_extent` when absent.
    #[serde(default)]
    pub tile_pixels: Option<u32>,
    /// Treat dark pixels as land instead of light ones.
    #[serde(default)]
    pub invert: bool,
    #[serde(default)]
    pub cities: Vec<City>,
    #[serde(default)]
    pub settings: CoastSettings,
}

impl MapDescriptor {
    /// Read and validate a descriptor file.
    pub fn load(path: &Path) -> Result<Self, CoastError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoastError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let descriptor: MapDescriptor =
            serde_json::from_str(&text).map_err(|source| CoastError::Descriptor {
                path: path.to_path_buf(),
                source,
            })?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<(), CoastError> {
        if !(self.realwidth.is_finite() && self.realwidth > 0.0) {
            return Err(CoastError::InvalidMetadata(format!(
                "realwidth must be a positive length in meters, got {}",
                self.realwidth
            )));
        }
        if !self.realoffset.iter().all(|v| v.is_finite()) {
            return Err(CoastError::InvalidMetadata(
                "realoffset must be finite".into(),
            ));
        }
        if self.tile_pixels == Some(0) {
            return Err(CoastError::InvalidMetadata(
                "tile_pixels must be at least 1".into(),
            ));
        }
        self.settings.validate()
    }

    /// Mask image path resolved against the descriptor file location.
    pub fn mask_path(&self, descriptor_path: &Path) -> PathBuf {
        match descriptor_path.parent() {
            Some(dir) if self.mask.is_relative() => dir.join(&self.mask),
            _ => self.mask.clone(),
        }
    }
}
