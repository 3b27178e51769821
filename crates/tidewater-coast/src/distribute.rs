//! Segment distribution: splits each curve into per-tile fragments.
//!
//! Tile membership is decided on the integer vertex chain (see
//! `edge_tiles`). The crossing parameter itself is solved on the curve, so
//! near a crossing the two can disagree slightly; the parameter is clamped
//! into the bracketing vertex range rather than re-deriving membership from
//! the curve. Fragments left with no extent by that disagreement are folded
//! away.

use glam::DVec2;
use tidewater_core::constants::{
    CROSSING_REFINE_STEPS, MIN_FRAGMENT_SPAN, PARAM_EPSILON, POINT_MERGE_EPSILON,
};
use tidewater_core::enums::Border;
use tidewater_core::types::{CurveId, FragmentId, TileCoord};

use crate::curve::Curve;
use crate::error::SplineError;
use crate::segment::{project_to_border, SegCl, Segment, TileGrid};
use crate::trace::BoundaryChain;

/// Where a curve passes from one tile into the next.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Crossing {
    t: f64,
    point: DVec2,
    from: TileCoord,
    to: TileCoord,
    exit: Border,
    entry: Border,
}

/// Tile sides crossed when moving from `from` to the adjacent tile `to`.
///
/// A diagonal step takes the exit side from the x axis and the entry side
/// from the y axis.
fn crossing_sides(from: TileCoord, to: TileCoord) -> (Border, Border) {
    let horizontal = match to.x.cmp(&from.x) {
        std::cmp::Ordering::Greater => Some(Border::Right),
        std::cmp::Ordering::Less => Some(Border::Left),
        std::cmp::Ordering::Equal => None,
    };
    let vertical = match to.y.cmp(&from.y) {
        std::cmp::Ordering::Greater => Some(Border::Top),
        std::cmp::Ordering::Less => Some(Border::Bottom),
        std::cmp::Ordering::Equal => None,
    };
    match (horizontal, vertical) {
        (Some(exit), Some(v)) => (exit, v.opposite()),
        (Some(exit), None) | (None, Some(exit)) => (exit, exit.opposite()),
        // Same tile; never asked for.
        (None, None) => (Border::Right, Border::Left),
    }
}

/// Solve for the parameter where the curve meets the border line between
/// `t0` and `t1`.
fn solve_crossing(
    curve: &Curve,
    t0: f64,
    t1: f64,
    fallback: f64,
    vertical: bool,
    line: f64,
) -> Result<f64, SplineError> {
    let offset = |t: f64| -> Result<f64, SplineError> {
        let p = curve.value(t)?;
        Ok(if vertical { p.x - line } else { p.y - line })
    };

    let f0 = offset(t0)?;
    let f1 = offset(t1)?;
    if f0 == f1 {
        return Ok(fallback);
    }

    // Linear guess from the bracket ends.
    let guess = (t0 + (t1 - t0) * f0 / (f0 - f1)).clamp(t0, t1);
    if f0.signum() == f1.signum() && f0 != 0.0 && f1 != 0.0 {
        return Ok(guess);
    }

    let fg = offset(guess)?;
    let (mut lo, mut hi, f_lo) = if fg == 0.0 {
        return Ok(guess);
    } else if fg.signum() == f0.signum() {
        (guess, t1, fg)
    } else {
        (t0, guess, f0)
    };
    for _ in 0..CROSSING_REFINE_STEPS {
        let mid = 0.5 * (lo + hi);
        let fm = offset(mid)?;
        if fm == 0.0 {
            return Ok(mid);
        }
        if fm.signum() == f_lo.signum() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(0.5 * (lo + hi))
}

/// Tile of every chain edge.
///
/// An edge belongs to the tile holding its midpoint, except that an edge
/// lying on a tile line keeps the tile of the last edge before it that does
/// not. A coast running along a tile line therefore stays in the tile it
/// came from. A chain lying wholly on tile lines puts each edge in the tile
/// on its land side.
fn edge_tiles(chain: &BoundaryChain, grid: &TileGrid) -> Vec<TileCoord> {
    let points = &chain.points;
    let n = points.len();
    let count = chain.edge_count();
    let tp = grid.tile_pixels as i32;
    let ends = |e: usize| (points[e % n], points[(e + 1) % n]);
    let midpoint = |e: usize| {
        let (a, b) = ends(e);
        (a.as_dvec2() + b.as_dvec2()) * 0.5
    };
    let on_line = |e: usize| {
        let (a, b) = ends(e);
        (a.y == b.y && a.y % tp == 0) || (a.x == b.x && a.x % tp == 0)
    };

    let Some(first_off) = (0..count).find(|&e| !on_line(e)) else {
        return (0..count)
            .map(|e| {
                let (a, b) = ends(e);
                let half = (b.as_dvec2() - a.as_dvec2()) * 0.5;
                // Land lies right of the direction of travel.
                grid.tile_of_grid(midpoint(e) + DVec2::new(half.y, -half.x))
            })
            .collect();
    };

    // Closed chains carry the tile around the seam; leading on-line edges of
    // an open chain take the tile of its first edge off the lines.
    let start = if chain.cyclic { first_off } else { 0 };
    let mut current = grid.tile_of_grid(midpoint(first_off));
    let mut tiles = vec![TileCoord::default(); count];
    for i in 0..count {
        let e = (start + i) % count;
        if !on_line(e) {
            current = grid.tile_of_grid(midpoint(e));
        }
        tiles[e] = current;
    }
    tiles
}

/// True when the stretch of curve between two crossings has no extent inside
/// its tile, as when the curve grazes a tile corner.
fn is_degenerate(
    curve: &Curve,
    t0: f64,
    t1: f64,
    p0: DVec2,
    p1: DVec2,
) -> Result<bool, SplineError> {
    if t1 - t0 < MIN_FRAGMENT_SPAN {
        return Ok(true);
    }
    if p0.distance(p1) > POINT_MERGE_EPSILON {
        return Ok(false);
    }
    let mid = curve.value(0.5 * (t0 + t1))?;
    Ok(mid.distance(p0) <= POINT_MERGE_EPSILON)
}

/// One crossing standing in for `a` then `b` once the fragment between them
/// is dropped.
fn rejoin(grid: &TileGrid, a: &Crossing, b: &Crossing) -> Crossing {
    let (exit, entry) = crossing_sides(a.from, b.to);
    let on_exit = project_to_border(&grid.rect(a.from), exit, a.point);
    Crossing {
        t: a.t,
        point: project_to_border(&grid.rect(b.to), entry, on_exit),
        from: a.from,
        to: b.to,
        exit,
        entry,
    }
}

/// Drop every fragment between consecutive crossings that has no extent.
fn fold_degenerate(
    curve: &Curve,
    grid: &TileGrid,
    crossings: Vec<Crossing>,
) -> Result<Vec<Crossing>, SplineError> {
    let mut kept: Vec<Crossing> = Vec::with_capacity(crossings.len());
    for c in crossings {
        if let Some(prev) = kept.last().copied() {
            if is_degenerate(curve, prev.t, c.t, prev.point, c.point)? {
                kept.pop();
                if prev.from != c.to {
                    kept.push(rejoin(grid, &prev, &c));
                }
                continue;
            }
        }
        kept.push(c);
    }
    Ok(kept)
}

/// Split `curve` into tile fragments and append them to `segments`.
///
/// `chain` must be the chain the curve was fitted to. Returns the ids of
/// the fragments added, in curve order. On error nothing is added.
pub fn distribute(
    curve: &Curve,
    curve_id: CurveId,
    chain: &BoundaryChain,
    grid: &TileGrid,
    segments: &mut [Segment],
) -> Result<Vec<(TileCoord, FragmentId)>, SplineError> {
    let pieces = split_curve(curve, curve_id, chain, grid)?;

    let mut added = Vec::with_capacity(pieces.len());
    for (coord, fragment) in pieces {
        let Some(segment) = grid.index(coord).and_then(|i| segments.get_mut(i)) else {
            continue;
        };
        let cyclic = fragment.cyclic;
        let id = segment.push_fragment(fragment);
        if cyclic {
            segment.fragments[id.0].next = Some(id);
        }
        added.push((coord, id));
    }
    Ok(added)
}

/// Compute the fragments of one curve without touching any tile.
pub fn split_curve(
    curve: &Curve,
    curve_id: CurveId,
    chain: &BoundaryChain,
    grid: &TileGrid,
) -> Result<Vec<(TileCoord, SegCl)>, SplineError> {
    let n = chain.points.len();
    let edge_count = chain.edge_count();
    if edge_count == 0 {
        return Ok(Vec::new());
    }
    let tiles = edge_tiles(chain, grid);

    // Closed chains also check the vertex joining the last edge to the first,
    // numbered `n` so parameters keep increasing.
    let inner_vertices = if chain.cyclic { 1..=n } else { 1..=n - 2 };
    let mut crossings: Vec<Crossing> = Vec::new();
    let mut prev_t = f64::NEG_INFINITY;
    for k in inner_vertices {
        let from = tiles[k - 1];
        let to = tiles[k % edge_count];
        if from == to {
            continue;
        }

        let (exit, entry) = crossing_sides(from, to);
        let from_rect = grid.rect(from);
        let vertical = matches!(exit, Border::Left | Border::Right);
        let line = match exit {
            Border::Top => from_rect.max.y,
            Border::Right => from_rect.max.x,
            Border::Bottom => from_rect.min.y,
            Border::Left => from_rect.min.x,
        };

        let k = k as isize;
        let t0 = curve.param_of_vertex(k - 1);
        let t1 = curve.param_of_vertex(k + 1);
        let solved = solve_crossing(curve, t0, t1, curve.param_of_vertex(k), vertical, line)?;
        let t = solved.clamp(t0, t1).max(prev_t + PARAM_EPSILON);
        prev_t = t;

        let on_exit = project_to_border(&from_rect, exit, curve.value(t)?);
        let point = project_to_border(&grid.rect(to), entry, on_exit);
        crossings.push(Crossing {
            t,
            point,
            from,
            to,
            exit,
            entry,
        });
    }

    let mut home = crossings.first().map_or(tiles[0], |c| c.from);
    let mut crossings = fold_degenerate(curve, grid, crossings)?;
    let mut pieces = Vec::with_capacity(crossings.len() + 1);

    if chain.cyclic {
        if let (Some(&first), Some(&last)) = (crossings.first(), crossings.last()) {
            if crossings.len() >= 2
                && is_degenerate(curve, last.t, first.t + 1.0, last.point, first.point)?
            {
                crossings.pop();
                crossings.remove(0);
                if last.from != first.to {
                    crossings.push(rejoin(grid, &last, &first));
                }
                home = last.from;
            }
        }

        let Some(first) = crossings.first().copied() else {
            let begin = curve.value(0.0)?;
            pieces.push((
                home,
                SegCl {
                    curve: curve_id,
                    begin_t: 0.0,
                    end_t: 1.0,
                    begin_border: None,
                    end_border: None,
                    begin,
                    end: begin,
                    next: None,
                    cyclic: true,
                },
            ));
            return Ok(pieces);
        };

        for pair in crossings.windows(2) {
            pieces.push((pair[0].to, between(curve_id, &pair[0], &pair[1])));
        }
        let last = crossings[crossings.len() - 1];
        let mut seam = first;
        seam.t = (first.t + 1.0).max(last.t + PARAM_EPSILON);
        pieces.push((last.to, between(curve_id, &last, &seam)));
        return Ok(pieces);
    }

    // A crossing right at either end of an open chain leaves nothing in the
    // tile beyond it.
    let start = curve.value(0.0)?;
    let finish = curve.value(1.0)?;
    let mut tile = tiles[0];
    while let Some(c) = crossings.first().copied() {
        if !is_degenerate(curve, 0.0, c.t, start, c.point)? {
            break;
        }
        crossings.remove(0);
        tile = c.to;
    }
    while let Some(c) = crossings.last().copied() {
        if !is_degenerate(curve, c.t, 1.0, c.point, finish)? {
            break;
        }
        crossings.pop();
    }

    let mut begin_t = 0.0;
    let mut begin_border = curve.begin_border;
    let mut begin_point = match curve.begin_border {
        Some(side) => project_to_border(&grid.rect(tile), side, start),
        None => start,
    };
    for c in &crossings {
        pieces.push((
            tile,
            SegCl {
                curve: curve_id,
                begin_t,
                end_t: c.t,
                begin_border,
                end_border: Some(c.exit),
                begin: begin_point,
                end: c.point,
                next: None,
                cyclic: false,
            },
        ));
        tile = c.to;
        begin_t = c.t;
        begin_border = Some(c.entry);
        begin_point = c.point;
    }
    let end = match curve.end_border {
        Some(side) => project_to_border(&grid.rect(tile), side, finish),
        None => finish,
    };
    pieces.push((
        tile,
        SegCl {
            curve: curve_id,
            begin_t,
            end_t: 1.0_f64.max(begin_t + PARAM_EPSILON),
            begin_border,
            end_border: curve.end_border,
            begin: begin_point,
            end,
            next: None,
            cyclic: false,
        },
    ));
    Ok(pieces)
}

/// Fragment of a closed curve between two consecutive crossings.
fn between(curve: CurveId, enter: &Crossing, leave: &Crossing) -> SegCl {
    debug_assert_eq!(enter.to, leave.from);
    SegCl {
        curve,
        begin_t: enter.t,
        end_t: leave.t,
        begin_border: Some(enter.entry),
        end_border: Some(leave.exit),
        begin: enter.point,
        end: leave.point,
        next: None,
        cyclic: false,
    }
}
