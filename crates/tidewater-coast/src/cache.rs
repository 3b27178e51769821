//! Point cache: per-tile land outlines resampled at a detail level and
//! triangulated for rendering.

use glam::DVec2;
use serde::Serialize;
use tidewater_core::constants::{BORDER_EPSILON, MAX_DETAIL, MIN_DETAIL, POINT_MERGE_EPSILON};
use tidewater_core::types::FragmentId;
use tracing::{debug, warn};

use crate::curve::Curve;
use crate::error::SplineError;
use crate::segment::{SegCl, Segment};
use crate::successor::chains;
use crate::triangulate::{signed_area, triangulate};

/// One closed land outline and its triangles.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeshPolygon {
    /// Outline in world meters, clockwise, without a repeated closing point.
    pub points: Vec<DVec2>,
    /// Counter-clockwise index triples into `points`.
    pub triangles: Vec<[u32; 3]>,
}

impl MeshPolygon {
    pub fn area(&self) -> f64 {
        signed_area(&self.points).abs()
    }
}

/// Triangulated land of one tile at one detail level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TileMesh {
    pub detail: i32,
    pub polygons: Vec<MeshPolygon>,
    /// Outlines that could not be triangulated.
    pub failed_polygons: usize,
    /// Fragment chains skipped because they do not close or could not be sampled.
    pub skipped_chains: usize,
}

impl TileMesh {
    pub fn triangle_count(&self) -> usize {
        self.polygons.iter().map(|p| p.triangles.len()).sum()
    }

    /// Total land area in square meters.
    pub fn land_area(&self) -> f64 {
        self.polygons.iter().map(MeshPolygon::area).sum()
    }
}

/// Clamp a requested detail level into the supported range.
pub fn clamp_detail(detail: i32) -> i32 {
    detail.clamp(MIN_DETAIL, MAX_DETAIL)
}

/// Drop points closer than `epsilon` to their predecessor, then a trailing
/// point that closes onto the first. Returns the number dropped.
pub fn dedup_points(points: &mut Vec<DVec2>, epsilon: f64) -> usize {
    let before = points.len();
    points.dedup_by(|p, kept| p.distance(*kept) < epsilon);
    while points.len() > 1 {
        match (points.first(), points.last()) {
            (Some(first), Some(last)) if first.distance(*last) < epsilon => {
                points.pop();
            }
            _ => break,
        }
    }
    before - points.len()
}

/// Tile corners passed walking clockwise from the end of `from` to the start
/// of `to`, in walking order.
fn corners_between(segment: &Segment, from: &SegCl, to: &SegCl) -> Vec<DVec2> {
    let (Some(end_side), Some(begin_side)) = (from.end_border, to.begin_border) else {
        return Vec::new();
    };
    let rect = &segment.rect;
    let perimeter = rect.perimeter();
    let start = rect.perimeter_position(end_side, from.end);
    let walk = rect.clockwise_distance(end_side, from.end, begin_side, to.begin);

    let mut corners: Vec<(f64, DVec2)> = rect
        .corner_positions()
        .into_iter()
        .map(|(pos, corner)| ((pos - start).rem_euclid(perimeter), corner))
        .filter(|&(along, _)| along > BORDER_EPSILON && along < walk - BORDER_EPSILON)
        .collect();
    corners.sort_by(|a, b| a.0.total_cmp(&b.0));
    corners.into_iter().map(|(_, corner)| corner).collect()
}

/// Outline of one closed fragment chain.
pub fn chain_outline(
    segment: &Segment,
    cycle: &[FragmentId],
    curves: &[Curve],
    detail: i32,
) -> Result<Vec<DVec2>, SplineError> {
    let scale = 2f64.powi(clamp_detail(detail));
    let mut points = Vec::new();

    for (i, id) in cycle.iter().enumerate() {
        let Some(frag) = segment.fragment(*id) else {
            continue;
        };
        let Some(next) = segment.fragment(cycle[(i + 1) % cycle.len()]) else {
            continue;
        };
        let Some(curve) = curves.get(frag.curve.0) else {
            continue;
        };

        points.push(frag.begin);
        let density = curve.samples_per_unit_t() as f64 * scale;
        let intervals = ((frag.span() * density).ceil() as usize).max(1);
        for k in 1..intervals {
            let t = frag.begin_t + frag.span() * k as f64 / intervals as f64;
            points.push(curve.value(t)?);
        }

        if frag.end_border.is_some() {
            points.push(frag.end);
            points.extend(corners_between(segment, frag, next));
        }
    }

    Ok(points)
}

/// Build the mesh of one tile at one detail level.
///
/// Chains that do not close, fail to sample, or fail to triangulate are
/// logged and left out; the rest of the tile is still meshed.
pub fn build_tile_mesh(segment: &Segment, curves: &[Curve], detail: i32) -> TileMesh {
    let detail = clamp_detail(detail);
    let found = chains(segment);
    let mut mesh = TileMesh {
        detail,
        skipped_chains: found.broken.len(),
        ..TileMesh::default()
    };

    for cycle in &found.cycles {
        let mut points = match chain_outline(segment, cycle, curves, detail) {
            Ok(points) => points,
            Err(e) => {
                warn!(
                    tile_x = segment.coord.x,
                    tile_y = segment.coord.y,
                    error = %e,
                    "skipping coastline chain"
                );
                mesh.skipped_chains += 1;
                continue;
            }
        };

        let dropped = dedup_points(&mut points, POINT_MERGE_EPSILON);
        if dropped > 0 {
            debug!(dropped, kept = points.len(), "merged near-duplicate outline points");
        }

        match triangulate(&points) {
            Ok(triangles) => mesh.polygons.push(MeshPolygon { points, triangles }),
            Err(e) => {
                warn!(
                    tile_x = segment.coord.x,
                    tile_y = segment.coord.y,
                    points = points.len(),
                    error = %e,
                    "land polygon could not be triangulated"
                );
                mesh.failed_polygons += 1;
            }
        }
    }

    debug!(
        tile_x = segment.coord.x,
        tile_y = segment.coord.y,
        detail,
        polygons = mesh.polygons.len(),
        triangles = mesh.triangle_count(),
        "built tile mesh"
    );
    mesh
}
