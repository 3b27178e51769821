//! Ear-clipping triangulation of simple polygons.

use glam::DVec2;
use tidewater_core::constants::COLLINEAR_EPSILON;

use crate::error::TriangulationError;

/// Signed area of a closed polygon: positive counter-clockwise, negative
/// clockwise (world `y` up).
pub fn signed_area(points: &[DVec2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    0.5 * (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f64>()
}

/// Area of a triangle given by indices into `points`.
pub fn triangle_area(points: &[DVec2], tri: [u32; 3]) -> f64 {
    let [a, b, c] = tri.map(|i| points[i as usize]);
    0.5 * (b - a).perp_dot(c - a)
}

/// Closed-triangle containment, excluding points equal to a corner.
fn in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    if p == a || p == b || p == c {
        return false;
    }
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Triangulate a simple polygon by ear clipping.
///
/// Land outlines arrive clockwise; counter-clockwise input is accepted too.
/// Triangles are index triples into `points`, always counter-clockwise.
/// Collinear vertices are dropped without producing a triangle.
pub fn triangulate(points: &[DVec2]) -> Result<Vec<[u32; 3]>, TriangulationError> {
    let n = points.len();
    if n < 3 {
        return Err(TriangulationError::TooFewPoints(n));
    }

    // +1 when a convex corner turns left, -1 when it turns right.
    let orientation = if signed_area(points) < 0.0 { -1.0 } else { 1.0 };

    let mut remaining: Vec<usize> = (0..n).collect();
    let mut triangles = Vec::with_capacity(n - 2);
    let mut cursor = 0;
    let mut misses = 0;

    while remaining.len() > 3 {
        let len = remaining.len();
        if misses >= len {
            return Err(TriangulationError::NoEar { remaining: len });
        }

        let i = cursor % len;
        let prev = remaining[(i + len - 1) % len];
        let cur = remaining[i];
        let next = remaining[(i + 1) % len];
        let (a, b, c) = (points[prev], points[cur], points[next]);

        let cross = (b - a).perp_dot(c - b);
        let scale = (b - a).length() * (c - b).length();
        if cross.abs() <= COLLINEAR_EPSILON * scale {
            remaining.remove(i);
            misses = 0;
            continue;
        }

        let convex = cross * orientation > 0.0;
        let blocked = convex
            && remaining
                .iter()
                .filter(|&&k| k != prev && k != cur && k != next)
                .any(|&k| in_triangle(points[k], a, b, c));

        if convex && !blocked {
            triangles.push(ccw_triangle(prev, cur, next, orientation));
            remaining.remove(i);
            misses = 0;
        } else {
            cursor = i + 1;
            misses += 1;
        }
    }

    if let [a, b, c] = remaining[..] {
        let cross = (points[b] - points[a]).perp_dot(points[c] - points[b]);
        let scale = (points[b] - points[a]).length() * (points[c] - points[b]).length();
        if cross.abs() > COLLINEAR_EPSILON * scale {
            let orientation = if cross > 0.0 { 1.0 } else { -1.0 };
            triangles.push(ccw_triangle(a, b, c, orientation));
        }
    }

    Ok(triangles)
}

fn ccw_triangle(prev: usize, cur: usize, next: usize, orientation: f64) -> [u32; 3] {
    if orientation > 0.0 {
        [prev as u32, cur as u32, next as u32]
    } else {
        [prev as u32, next as u32, cur as u32]
    }
}
