//! CoastMap: the built map and the queries a renderer or simulation makes
//! against it.

use std::path::Path;

use glam::DVec2;
use serde::Serialize;
use tidewater_core::constants::{DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH};
use tidewater_core::enums::TileKind;
use tidewater_core::types::{CurveId, TileCoord, WorldRect};
use tracing::{debug, info, warn};

use crate::cache::{build_tile_mesh, clamp_detail, MeshPolygon, TileMesh};
use crate::classify::classify;
use crate::curve::Curve;
use crate::descriptor::{City, CoastSettings, MapDescriptor};
use crate::distribute::distribute;
use crate::error::CoastError;
use crate::loader::load_descriptor_mask;
use crate::mask::RasterMask;
use crate::segment::{Segment, TileGrid};
use crate::trace::trace_all;

/// Summary of a map build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub chains_traced: usize,
    pub lakes_discarded: usize,
    pub curves: usize,
    /// Chains dropped because fitting or distribution failed.
    pub curves_skipped: usize,
    pub fragments: usize,
    pub land_tiles: usize,
    pub sea_tiles: usize,
    pub mixed_tiles: usize,
    pub unresolved_fragments: usize,
}

/// Visible window of a map view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    /// World position at the centre of the screen (meters).
    pub offset: DVec2,
    /// Screen pixels per meter.
    pub zoom: f64,
    /// Screen size in pixels.
    pub screen: DVec2,
}

impl MapView {
    pub fn new(offset: DVec2, zoom: f64) -> Self {
        Self {
            offset,
            zoom,
            screen: DVec2::new(DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT),
        }
    }

    /// World rectangle shown on screen.
    pub fn window(&self) -> WorldRect {
        let half = self.screen / (2.0 * self.zoom);
        WorldRect::new(self.offset - half, self.offset + half)
    }
}

/// What the renderer draws for one tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TileDraw {
    /// Single flat quad of land or sea.
    Quad {
        coord: TileCoord,
        kind: TileKind,
        rect: WorldRect,
    },
    /// Sea quad with triangulated land on top.
    Mesh {
        coord: TileCoord,
        rect: WorldRect,
        polygons: Vec<MeshPolygon>,
    },
}

/// A fully built coastline map.
#[derive(Debug, Clone)]
pub struct CoastMap {
    mask: RasterMask,
    grid: TileGrid,
    curves: Vec<Curve>,
    segments: Vec<Segment>,
    cities: Vec<City>,
    settings: CoastSettings,
    report: BuildReport,
}

impl CoastMap {
    /// Load a descriptor, its mask, and build the map.
    pub fn load(descriptor_path: &Path) -> Result<Self, CoastError> {
        let descriptor = MapDescriptor::load(descriptor_path)?;
        let mask = load_descriptor_mask(&descriptor, descriptor_path)?;
        info!(
            path = %descriptor_path.display(),
            width = mask.width(),
            height = mask.height(),
            pixel_size = mask.header.pixel_size,
            "loaded coast mask"
        );
        Self::from_mask(
            mask,
            descriptor.settings,
            descriptor.tile_pixels,
            descriptor.cities,
        )
    }

    /// Build a map from an in-memory mask.
    pub fn from_mask(
        mask: RasterMask,
        settings: CoastSettings,
        tile_pixels: Option<u32>,
        cities: Vec<City>,
    ) -> Result<Self, CoastError> {
        settings.validate()?;
        let grid = TileGrid::new(&mask.header, tile_pixels, settings.min_tile_extent)?;
        let mut segments: Vec<Segment> = grid
            .coords()
            .map(|coord| Segment::new(coord, grid.rect(coord)))
            .collect();

        let traced = trace_all(&mask);
        let projection = mask.projection();
        let mut report = BuildReport {
            chains_traced: traced.chains.len(),
            lakes_discarded: traced.lakes_discarded,
            ..BuildReport::default()
        };

        let mut curves = Vec::with_capacity(traced.chains.len());
        for chain in &traced.chains {
            let curve = match Curve::fit(chain, &projection, &settings) {
                Ok(curve) => curve,
                Err(e) => {
                    warn!(points = chain.points.len(), error = %e, "cannot fit coastline");
                    report.curves_skipped += 1;
                    continue;
                }
            };
            let id = CurveId(curves.len());
            match distribute(&curve, id, chain, &grid, &mut segments) {
                Ok(added) => {
                    debug!(curve = id.0, fragments = added.len(), "distributed curve");
                    report.fragments += added.len();
                    curves.push(curve);
                }
                Err(e) => {
                    warn!(curve = id.0, error = %e, "cannot distribute coastline");
                    report.curves_skipped += 1;
                }
            }
        }
        report.curves = curves.len();

        let stats = classify(&mask, &grid, &mut segments);
        report.land_tiles = stats.land;
        report.sea_tiles = stats.sea;
        report.mixed_tiles = stats.mixed;
        report.unresolved_fragments = stats.unresolved_fragments;

        info!(
            curves = report.curves,
            lakes = report.lakes_discarded,
            tiles = segments.len(),
            tile_pixels = grid.tile_pixels,
            land = report.land_tiles,
            sea = report.sea_tiles,
            mixed = report.mixed_tiles,
            "built coast map"
        );

        Ok(Self {
            mask,
            grid,
            curves,
            segments,
            cities,
            settings,
            report,
        })
    }

    pub fn mask(&self) -> &RasterMask {
        &self.mask
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn settings(&self) -> &CoastSettings {
        &self.settings
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Named positions from the descriptor, passed through untouched.
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn curve(&self, id: CurveId) -> Option<&Curve> {
        self.curves.get(id.0)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, coord: TileCoord) -> Option<&Segment> {
        self.grid.index(coord).and_then(|i| self.segments.get(i))
    }

    /// World rectangle covered by the map.
    pub fn extent(&self) -> WorldRect {
        self.mask.extent()
    }

    pub fn tile_kind(&self, coord: TileCoord) -> Option<TileKind> {
        self.segment(coord).map(|s| s.kind)
    }

    /// Kind of the tile holding a world position; `None` off the map.
    pub fn tile_kind_at(&self, pos: DVec2) -> Option<TileKind> {
        self.grid.tile_at(pos).and_then(|c| self.tile_kind(c))
    }

    /// Pixel-exact land test; everything off the map is sea.
    pub fn is_land_at(&self, pos: DVec2) -> bool {
        self.mask.is_land_at(pos)
    }

    /// Build the mesh for a tile and detail level if it is not cached yet.
    ///
    /// Returns `false` for tiles that have no mesh (pure or off-map tiles).
    pub fn ensure_cache(&mut self, coord: TileCoord, detail: i32) -> bool {
        let detail = clamp_detail(detail);
        let Some(index) = self.grid.index(coord) else {
            return false;
        };
        let Some(segment) = self.segments.get(index) else {
            return false;
        };
        if segment.kind != TileKind::Mixed {
            return false;
        }
        if segment.cached(detail).is_none() {
            let mesh = build_tile_mesh(segment, &self.curves, detail);
            if let Some(segment) = self.segments.get_mut(index) {
                segment.store_cache(detail, mesh);
            }
        }
        true
    }

    /// Cached mesh of a tile, after `ensure_cache`.
    pub fn cached(&self, coord: TileCoord, detail: i32) -> Option<&TileMesh> {
        self.segment(coord)
            .and_then(|s| s.cached(clamp_detail(detail)))
    }

    /// Draw list entry for one tile, building its mesh on demand.
    fn tile_draw(&mut self, coord: TileCoord, detail: i32) -> Option<TileDraw> {
        let segment = self.segment(coord)?;
        let (kind, rect) = (segment.kind, segment.rect);
        if kind.is_pure() {
            return Some(TileDraw::Quad { coord, kind, rect });
        }
        self.ensure_cache(coord, detail);
        let polygons = self
            .cached(coord, detail)
            .map(|mesh| mesh.polygons.clone())
            .unwrap_or_default();
        Some(TileDraw::Mesh {
            coord,
            rect,
            polygons,
        })
    }

    /// Draw list for every tile intersecting the view.
    pub fn draw_as_map(&mut self, view: &MapView, detail: i32) -> Vec<TileDraw> {
        let visible: Vec<TileCoord> = self.grid.tiles_in(&view.window()).collect();
        visible
            .into_iter()
            .filter_map(|c| self.tile_draw(c, detail))
            .collect()
    }

    /// Draw list entry for the tile holding a world position.
    pub fn render(&mut self, position: DVec2, detail: i32) -> Option<TileDraw> {
        let coord = self.grid.tile_at(position)?;
        self.tile_draw(coord, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4 x 4 tiles of 8 px; an island in tile (1, 1) and land filling tile (3, 3).
    fn sample_map() -> CoastMap {
        let mask = RasterMask::from_fn(32, 32, 100.0, DVec2::ZERO, |x, y| {
            let island = (10..14).contains(&x) && (10..14).contains(&y);
            let corner = x >= 24 && y >= 24;
            island || corner
        });
        CoastMap::from_mask(mask, CoastSettings::default(), Some(8), Vec::new()).unwrap()
    }

    #[test]
    fn test_build_report() {
        let map = sample_map();
        let report = map.report();
        // The corner block touches the map border: one open coast.
        assert_eq!(report.curves, 2);
        assert_eq!(report.lakes_discarded, 0);
        assert_eq!(report.mixed_tiles, 2);
        assert_eq!(report.land_tiles + report.sea_tiles + report.mixed_tiles, 16);
        assert_eq!(report.unresolved_fragments, 0);
    }

    #[test]
    fn test_tile_queries() {
        let map = sample_map();
        assert_eq!(map.tile_kind(TileCoord::new(0, 0)), Some(TileKind::Sea));
        assert_eq!(map.tile_kind(TileCoord::new(1, 1)), Some(TileKind::Mixed));
        assert_eq!(map.tile_kind(TileCoord::new(9, 9)), None);
        assert_eq!(map.tile_kind_at(DVec2::new(1200.0, 1200.0)), Some(TileKind::Mixed));
        assert_eq!(map.tile_kind_at(DVec2::new(-1.0, 5.0)), None);
        assert!(map.is_land_at(DVec2::new(1150.0, 1150.0)));
        assert!(!map.is_land_at(DVec2::new(50.0, 50.0)));
    }

    #[test]
    fn test_two_phase_cache() {
        let mut map = sample_map();
        let coord = TileCoord::new(1, 1);
        assert!(map.cached(coord, 0).is_none());
        assert!(map.ensure_cache(coord, 0));
        let mesh = map.cached(coord, 0).unwrap();
        assert_eq!(mesh.polygons.len(), 1);
        assert_eq!(mesh.failed_polygons, 0);
        assert!(mesh.land_area() > 0.0 && mesh.land_area() < 400.0 * 400.0);

        // Pure tiles have nothing to cache.
        assert!(!map.ensure_cache(TileCoord::new(0, 0), 0));
        // Detail levels are cached independently.
        assert!(map.cached(coord, 1).is_none());
        map.ensure_cache(coord, 1);
        let fine = map.cached(coord, 1).unwrap().polygons[0].points.len();
        let coarse = map.cached(coord, 0).unwrap().polygons[0].points.len();
        assert!(fine > coarse);
    }

    #[test]
    fn test_draw_as_map_covers_view() {
        let mut map = sample_map();
        // Whole map in view.
        let mut view = MapView::new(DVec2::new(1600.0, 1600.0), 0.1);
        view.screen = DVec2::new(400.0, 400.0);
        let draws = map.draw_as_map(&view, 0);
        assert_eq!(draws.len(), 16);
        let meshes = draws
            .iter()
            .filter(|d| matches!(d, TileDraw::Mesh { .. }))
            .count();
        assert_eq!(meshes, 2);

        // Zoomed into one tile interior.
        let mut view = MapView::new(DVec2::new(400.0, 400.0), 1.0);
        view.screen = DVec2::new(100.0, 100.0);
        let draws = map.draw_as_map(&view, 0);
        assert_eq!(draws.len(), 1);
        assert!(matches!(
            draws[0],
            TileDraw::Quad {
                kind: TileKind::Sea,
                ..
            }
        ));
    }

    #[test]
    fn test_render_single_tile() {
        let mut map = sample_map();
        match map.render(DVec2::new(1200.0, 1200.0), 0) {
            Some(TileDraw::Mesh { coord, polygons, .. }) => {
                assert_eq!(coord, TileCoord::new(1, 1));
                assert_eq!(polygons.len(), 1);
            }
            other => panic!("expected a mesh, got {other:?}"),
        }
        assert!(map.render(DVec2::new(-10.0, 0.0), 0).is_none());
    }
}
