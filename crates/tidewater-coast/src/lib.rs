//! Coastline engine for TIDEWATER.
//!
//! Traces a 1-bit land/sea mask into B-spline coastlines, cuts them into
//! fixed-size tiles, and triangulates the land of each tile on demand.

pub use tidewater_core as core;

pub mod bspline;
pub mod cache;
pub mod classify;
pub mod coastmap;
pub mod curve;
pub mod descriptor;
pub mod distribute;
pub mod error;
pub mod loader;
pub mod mask;
pub mod projection;
pub mod segment;
pub mod successor;
pub mod trace;
pub mod triangulate;

// Re-export key types for convenience.
pub use cache::{MeshPolygon, TileMesh};
pub use coastmap::{BuildReport, CoastMap, MapView, TileDraw};
pub use curve::Curve;
pub use descriptor::{City, CoastSettings, MapDescriptor};
pub use error::{CoastError, SplineError, TriangulationError};
pub use loader::{load_mask, write_pbm};
pub use mask::{MaskHeader, RasterMask};
pub use projection::MaskProjection;
pub use segment::{SegCl, Segment, TileGrid};
pub use trace::{trace_all, BoundaryChain, BoundaryTracer};
