//! Successor resolution: links the fragments of a tile into closed chains.
//!
//! A fragment ending inside the tile continues at the nearest interior
//! start. A fragment ending on the tile border continues at the first
//! border start met walking clockwise along the tile edge, which keeps the
//! land on the right of the closed outline.

use tidewater_core::types::FragmentId;
use tracing::warn;

use crate::segment::{SegCl, Segment};

/// Distance from the end of `from` to the start of `to`, or `None` when an
/// interior endpoint would have to meet a border endpoint.
fn link_distance(segment: &Segment, from: &SegCl, to: &SegCl) -> Option<f64> {
    match (from.end_border, to.begin_border) {
        (None, None) => Some((to.begin - from.end).length()),
        (Some(end_side), Some(begin_side)) => Some(segment.rect.clockwise_distance(
            end_side, from.end, begin_side, to.begin,
        )),
        _ => None,
    }
}

/// Set `next` on every fragment of the tile.
///
/// Closed single-tile fragments keep pointing at themselves. Ties go to the
/// lowest fragment index. Returns the number of fragments left without a
/// successor.
pub fn resolve_successors(segment: &mut Segment) -> usize {
    let mut links = Vec::with_capacity(segment.fragments.len());
    for (i, from) in segment.fragments.iter().enumerate() {
        if from.cyclic {
            links.push(Some(FragmentId(i)));
            continue;
        }

        let mut best: Option<(usize, f64)> = None;
        for (j, to) in segment.fragments.iter().enumerate() {
            if to.cyclic {
                continue;
            }
            let Some(d) = link_distance(segment, from, to) else {
                continue;
            };
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((j, d));
            }
        }

        if best.is_none() {
            warn!(
                tile_x = segment.coord.x,
                tile_y = segment.coord.y,
                fragment = i,
                "no successor for coastline fragment"
            );
        }
        links.push(best.map(|(j, _)| FragmentId(j)));
    }

    let unresolved = links.iter().filter(|l| l.is_none()).count();
    for (fragment, next) in segment.fragments.iter_mut().zip(links) {
        fragment.next = next;
    }
    unresolved
}

/// Closed fragment chains of one tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FragmentChains {
    /// Chains that return to their first fragment, in `next` order.
    pub cycles: Vec<Vec<FragmentId>>,
    /// Start fragments of walks that ran into a missing or already used link.
    pub broken: Vec<FragmentId>,
}

/// Follow `next` links from every unvisited fragment.
pub fn chains(segment: &Segment) -> FragmentChains {
    let count = segment.fragments.len();
    let mut visited = vec![false; count];
    let mut result = FragmentChains::default();

    for start in 0..count {
        if visited[start] {
            continue;
        }
        let mut cycle = Vec::new();
        let mut current = start;
        let closed = loop {
            visited[current] = true;
            cycle.push(FragmentId(current));
            match segment.fragments[current].next {
                Some(FragmentId(next)) if next == start => break true,
                Some(FragmentId(next)) if next < count && !visited[next] => current = next,
                _ => break false,
            }
        };

        if closed {
            result.cycles.push(cycle);
        } else {
            warn!(
                tile_x = segment.coord.x,
                tile_y = segment.coord.y,
                start,
                walked = cycle.len(),
                "fragment chain does not close"
            );
            result.broken.push(FragmentId(start));
        }
    }

    result
}
