//! Tile classification.

use tidewater_core::enums::TileKind;

use crate::mask::RasterMask;
use crate::segment::{Segment, TileGrid};
use crate::successor::resolve_successors;

/// Tile counts by kind after classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub land: usize,
    pub sea: usize,
    pub mixed: usize,
    /// Fragments the successor resolver could not link.
    pub unresolved_fragments: usize,
}

/// Classify every tile.
///
/// Tiles without fragments take the value of their centre pixel. Tiles
/// with fragments are mixed and get their successors resolved.
pub fn classify(mask: &RasterMask, grid: &TileGrid, segments: &mut [Segment]) -> ClassifyStats {
    let mut stats = ClassifyStats::default();
    for segment in segments.iter_mut() {
        if segment.fragments.is_empty() {
            let (x, y) = grid.center_pixel(segment.coord);
            segment.kind = if mask.is_land(x, y) {
                stats.land += 1;
                TileKind::Land
            } else {
                stats.sea += 1;
                TileKind::Sea
            };
        } else {
            segment.kind = TileKind::Mixed;
            stats.mixed += 1;
            stats.unresolved_fragments += resolve_successors(segment);
        }
    }
    stats
}
