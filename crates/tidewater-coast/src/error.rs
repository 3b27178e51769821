//! Error types for the coastline engine.
//!
//! `CoastError` covers fatal load errors: no partially built map is ever
//! returned. Geometry anomalies found while building or triangulating are
//! reported through `SplineError` and `TriangulationError`, which callers log
//! and skip.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal map construction error.
#[derive(Error, Debug)]
pub enum CoastError {
    /// Descriptor or mask file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// The offending file.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Descriptor is not valid JSON or misses required fields
    #[error("invalid map descriptor {path}: {source}")]
    Descriptor {
        /// The offending descriptor.
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Mask image could not be decoded
    #[error("cannot decode mask image {path}: {source}")]
    Image {
        /// The offending image.
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Mask image is not a 1-bit-per-pixel image
    #[error("mask image {path} must be 1 bit per pixel, found {found}")]
    NotOneBit {
        /// The offending image.
        path: PathBuf,
        /// Colour type reported by the decoder.
        found: String,
    },

    /// Required size metadata missing or out of range
    #[error("invalid map metadata: {0}")]
    InvalidMetadata(String),

    /// Mask dimensions are not a multiple of the tile size
    #[error("mask size {width}x{height} is not a multiple of the tile size {tile_pixels}")]
    MisalignedDimensions {
        /// Mask width in pixels.
        width: u32,
        /// Mask height in pixels.
        height: u32,
        /// Tile edge in pixels.
        tile_pixels: u32,
    },
}

/// B-spline construction or evaluation error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplineError {
    /// Degree zero or not enough control points for the degree
    #[error("a degree {degree} B-spline cannot be built from {control_points} control points")]
    InvalidDegree {
        /// Requested degree.
        degree: usize,
        /// Control points supplied.
        control_points: usize,
    },

    /// An interpolation weight became NaN or infinite
    #[error("non-finite interpolation weight at t={t}")]
    NonFiniteWeight {
        /// Parameter being evaluated.
        t: f64,
    },
}

/// Polygon triangulation failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriangulationError {
    /// Fewer than three points
    #[error("polygon has {0} points, at least 3 are needed")]
    TooFewPoints(usize),

    /// No clippable ear found; the polygon self-intersects or is degenerate
    #[error("no ear found with {remaining} vertices left")]
    NoEar {
        /// Vertices still unclipped when the search failed.
        remaining: usize,
    },
}
