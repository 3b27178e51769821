//! Boundary tracing: walks land/sea pixel boundaries into ordered chains.
//!
//! Traces run along pixel-corner vertices with land always on the right of
//! the walking direction, so islands come out clockwise and lakes
//! counter-clockwise. Each vertex is decided from its four diagonal pixels;
//! at saddles (two diagonal land pixels) a right turn wins, which keeps
//! diagonal land pixels apart.

use tidewater_core::enums::{Border, Direction};
use tidewater_core::types::GridPoint;
use tracing::debug;

use crate::mask::RasterMask;

/// One traced coastline before curve fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryChain {
    /// Vertices in walking order. Cyclic chains do not repeat the first vertex.
    pub points: Vec<GridPoint>,
    /// The chain closes on itself (island or lake).
    pub cyclic: bool,
    /// Map side the chain starts on; `None` for cyclic chains.
    pub begin_border: Option<Border>,
    /// Map side the chain ends on; `None` for cyclic chains.
    pub end_border: Option<Border>,
    /// Sum of left (+1) and right (-1) turns. Islands total -4, lakes +4.
    pub turn_count: i32,
}

impl BoundaryChain {
    /// Cyclic chains enclosing sea (positive turn count) are lakes and must
    /// not become coastlines. Degenerate chains are never valid.
    pub fn is_valid(&self) -> bool {
        if self.cyclic {
            self.points.len() >= 4 && self.turn_count <= 0
        } else {
            self.points.len() >= 2
        }
    }

    /// Number of pixel edges walked.
    pub fn edge_count(&self) -> usize {
        if self.cyclic {
            self.points.len()
        } else {
            self.points.len().saturating_sub(1)
        }
    }
}

/// Per-vertex record of traced outgoing edges.
///
/// Owned by one tracing run; the mask itself is never written.
#[derive(Debug, Clone)]
pub struct VisitedGrid {
    columns: u32,
    rows: u32,
    marks: Vec<u8>,
}

impl VisitedGrid {
    /// Grid covering all vertices of a `width` × `height` pixel mask.
    pub fn new(width: u32, height: u32) -> Self {
        let columns = width + 1;
        let rows = height + 1;
        Self {
            columns,
            rows,
            marks: vec![0; columns as usize * rows as usize],
        }
    }

    fn index(&self, p: GridPoint) -> Option<usize> {
        if p.x < 0 || p.y < 0 || p.x as u32 >= self.columns || p.y as u32 >= self.rows {
            return None;
        }
        Some(p.y as usize * self.columns as usize + p.x as usize)
    }

    pub fn is_visited(&self, p: GridPoint, dir: Direction) -> bool {
        self.index(p)
            .is_some_and(|i| self.marks[i] & (1 << dir.index()) != 0)
    }

    pub fn mark(&mut self, p: GridPoint, dir: Direction) {
        if let Some(i) = self.index(p) {
            self.marks[i] |= 1 << dir.index();
        }
    }

    /// Total number of traced edges.
    pub fn marked_edges(&self) -> usize {
        self.marks.iter().map(|m| m.count_ones() as usize).sum()
    }
}

/// Result of tracing a whole mask.
#[derive(Debug, Clone, Default)]
pub struct TraceOutcome {
    /// Valid coastline chains in discovery order.
    pub chains: Vec<BoundaryChain>,
    /// Cyclic chains discarded because they enclose sea.
    pub lakes_discarded: usize,
    /// Edges covered by all traces, including discarded ones.
    pub traced_edges: usize,
}

/// Boundary follower over one mask.
pub struct BoundaryTracer<'a> {
    mask: &'a RasterMask,
    visited: VisitedGrid,
}

impl<'a> BoundaryTracer<'a> {
    pub fn new(mask: &'a RasterMask) -> Self {
        Self {
            mask,
            visited: VisitedGrid::new(mask.width(), mask.height()),
        }
    }

    pub fn visited(&self) -> &VisitedGrid {
        &self.visited
    }

    fn land(&self, x: i32, y: i32) -> bool {
        self.mask.land_clamped(x as i64, y as i64)
    }

    fn is_vertex(&self, p: GridPoint) -> bool {
        p.x >= 0 && p.y >= 0 && p.x as u32 <= self.mask.width() && p.y as u32 <= self.mask.height()
    }

    /// True when the edge leaving `p` in `dir` has land on its right and sea
    /// on its left.
    pub fn is_boundary_edge(&self, p: GridPoint, dir: Direction) -> bool {
        if !self.is_vertex(p) || !self.is_vertex(p.step(dir)) {
            return false;
        }
        let (x, y) = (p.x, p.y);
        let (right, left) = match dir {
            Direction::East => (self.land(x, y - 1), self.land(x, y)),
            Direction::North => (self.land(x, y), self.land(x - 1, y)),
            Direction::West => (self.land(x - 1, y), self.land(x - 1, y - 1)),
            Direction::South => (self.land(x - 1, y - 1), self.land(x, y - 1)),
        };
        right && !left
    }

    /// Outgoing direction at `p` after arriving in direction `incoming`.
    fn next_direction(&self, p: GridPoint, incoming: Direction) -> Option<Direction> {
        [incoming.right(), incoming, incoming.left()]
            .into_iter()
            .find(|&d| self.is_boundary_edge(p, d))
    }

    /// Incoming direction at `p` whose forward step continues with `outgoing`.
    fn previous_direction(&self, p: GridPoint, outgoing: Direction) -> Option<Direction> {
        [outgoing.left(), outgoing, outgoing.right()]
            .into_iter()
            .find(|&d| {
                let from = p.step(d.reverse());
                self.is_boundary_edge(from, d) && self.next_direction(p, d) == Some(outgoing)
            })
    }

    /// Walk backward from an edge to where its chain naturally begins.
    ///
    /// Returns the start edge and whether the chain is a closed loop.
    fn find_natural_start(&self, start: GridPoint, dir: Direction) -> (GridPoint, Direction, bool) {
        let mut p = start;
        let mut d = dir;
        loop {
            match self.previous_direction(p, d) {
                None => return (p, d, false),
                Some(d_in) => {
                    p = p.step(d_in.reverse());
                    d = d_in;
                    if p == start && d == dir {
                        return (start, dir, true);
                    }
                }
            }
        }
    }

    /// Map side a border vertex lies on.
    fn map_border(&self, p: GridPoint) -> Option<Border> {
        if p.y as u32 == self.mask.height() {
            Some(Border::Top)
        } else if p.x as u32 == self.mask.width() {
            Some(Border::Right)
        } else if p.y == 0 {
            Some(Border::Bottom)
        } else if p.x == 0 {
            Some(Border::Left)
        } else {
            None
        }
    }

    /// First untraced boundary edge leaving `p`.
    fn untraced_edge(&self, p: GridPoint) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|&d| self.is_boundary_edge(p, d) && !self.visited.is_visited(p, d))
    }

    /// Trace the coastline through an untraced boundary edge at `start`.
    ///
    /// Returns `None` when no untraced boundary edge leaves `start`. Every
    /// edge walked is marked, including those of chains that turn out to be
    /// lakes.
    pub fn find_coastline(&mut self, start: GridPoint) -> Option<BoundaryChain> {
        let start_dir = self.untraced_edge(start)?;
        let (begin, begin_dir, cyclic) = self.find_natural_start(start, start_dir);

        let mut points = vec![begin];
        let mut p = begin;
        let mut d = begin_dir;
        let mut turn_count = 0;

        loop {
            self.visited.mark(p, d);
            let next = p.step(d);
            match self.next_direction(next, d) {
                Some(nd) if cyclic && next == begin && nd == begin_dir => {
                    turn_count += d.turn_to(nd);
                    break;
                }
                Some(nd) => {
                    turn_count += d.turn_to(nd);
                    points.push(next);
                    p = next;
                    d = nd;
                }
                None => {
                    points.push(next);
                    break;
                }
            }
        }

        let (begin_border, end_border) = if cyclic {
            (None, None)
        } else {
            (self.map_border(begin), self.map_border(p.step(d)))
        };

        Some(BoundaryChain {
            points,
            cyclic,
            begin_border,
            end_border,
            turn_count,
        })
    }
}

/// Trace every land/sea boundary of a mask.
///
/// Lakes are counted and dropped; every other chain is returned.
pub fn trace_all(mask: &RasterMask) -> TraceOutcome {
    let mut tracer = BoundaryTracer::new(mask);
    let mut outcome = TraceOutcome::default();

    for y in 0..=mask.height() as i32 {
        for x in 0..=mask.width() as i32 {
            let p = GridPoint::new(x, y);
            while let Some(chain) = tracer.find_coastline(p) {
                if chain.is_valid() {
                    debug!(
                        points = chain.points.len(),
                        cyclic = chain.cyclic,
                        turns = chain.turn_count,
                        "traced coastline"
                    );
                    outcome.chains.push(chain);
                } else {
                    debug!(points = chain.points.len(), "discarding lake");
                    outcome.lakes_discarded += 1;
                }
            }
        }
    }

    outcome.traced_edges = tracer.visited().marked_edges();
    outcome
}
