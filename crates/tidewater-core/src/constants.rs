//! Engine constants and tuning defaults.
//!
//! Lengths are in meters, parameters are in B-spline parameter units
//! (one unit spans a whole curve).

// --- Tiling ---

/// Minimum real-world tile edge length (meters, ~60 km).
pub const DEFAULT_MIN_TILE_EXTENT: f64 = 60_000.0;

// --- Curve fitting ---

/// Upper bound for the B-spline degree.
pub const MAX_SPLINE_DEGREE: usize = 16;

/// Default B-spline degree (cubic).
pub const DEFAULT_SPLINE_DEGREE: usize = 3;

/// Default number of boundary vertices per control point.
pub const DEFAULT_CONTROL_POINT_STRIDE: usize = 2;

/// Default resampling density per control interval at detail level 0.
pub const DEFAULT_SAMPLES_PER_CONTROL_INTERVAL: usize = 4;

// --- Tolerances ---

/// Points closer than this are merged by the point cache (meters).
pub const POINT_MERGE_EPSILON: f64 = 0.5;

/// Minimum parameter gap kept between consecutive tile crossings.
pub const PARAM_EPSILON: f64 = 1.0e-9;

/// Tile fragments spanning less curve parameter than this carry no geometry
/// and are folded into their neighbours.
pub const MIN_FRAGMENT_SPAN: f64 = 1.0e-6;

/// Distance below which a point counts as lying on a corner or border (meters).
pub const BORDER_EPSILON: f64 = 1.0e-6;

/// Relative cross-product threshold below which the triangulator treats a
/// vertex as collinear.
pub const COLLINEAR_EPSILON: f64 = 1.0e-12;

/// Bisection steps used to refine a tile crossing parameter.
pub const CROSSING_REFINE_STEPS: u32 = 32;

// --- Detail levels ---

/// Coarsest accepted detail level.
pub const MIN_DETAIL: i32 = -6;

/// Finest accepted detail level.
pub const MAX_DETAIL: i32 = 6;

// --- Map view ---

/// Default screen width for map views (pixels).
pub const DEFAULT_SCREEN_WIDTH: f64 = 1024.0;

/// Default screen height for map views (pixels).
pub const DEFAULT_SCREEN_HEIGHT: f64 = 768.0;
