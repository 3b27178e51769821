//! Whole-pipeline tests: mask in, tile meshes out.

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tidewater_coast::core::enums::TileKind;
use tidewater_coast::core::types::TileCoord;
use tidewater_coast::{write_pbm, CoastMap, CoastSettings, MapDescriptor, RasterMask};

const PIXEL: f64 = 1000.0;

fn block_mask(width: u32, height: u32, lo: u32, hi: u32) -> RasterMask {
    RasterMask::from_fn(width, height, PIXEL, DVec2::ZERO, |x, y| {
        (lo..hi).contains(&x) && (lo..hi).contains(&y)
    })
}

fn build(mask: RasterMask, tile_pixels: u32) -> CoastMap {
    CoastMap::from_mask(mask, CoastSettings::default(), Some(tile_pixels), Vec::new()).unwrap()
}

fn mesh_area(map: &mut CoastMap, coord: TileCoord, detail: i32) -> f64 {
    assert!(map.ensure_cache(coord, detail));
    let mesh = map.cached(coord, detail).unwrap();
    assert_eq!(mesh.failed_polygons, 0);
    assert_eq!(mesh.skipped_chains, 0);
    mesh.land_area()
}

/// Land area summed over the tiles: pure land tiles whole, mixed tiles by
/// their meshes.
fn tiled_land_area(map: &mut CoastMap) -> f64 {
    let grid = map.grid().clone();
    let tile_area = grid.tile_extent() * grid.tile_extent();
    let mut total = 0.0;
    for coord in grid.coords() {
        match map.tile_kind(coord) {
            Some(TileKind::Land) => total += tile_area,
            Some(TileKind::Mixed) => total += mesh_area(map, coord, 0),
            _ => {}
        }
    }
    total
}

fn assert_land_conserved(map: &mut CoastMap, tolerance: f64, label: &str) {
    assert_eq!(map.report().unresolved_fragments, 0, "{label}");
    let exact = map.mask().land_count() as f64 * PIXEL * PIXEL;
    let tiled = tiled_land_area(map);
    assert!(
        (tiled - exact).abs() <= exact * tolerance,
        "{label}: tiled {tiled} vs mask {exact}"
    );
}

#[test]
fn test_single_island_in_one_tile() {
    let mut map = build(block_mask(64, 64, 28, 36), 64);
    let report = map.report().clone();
    assert_eq!(report.curves, 1);
    assert_eq!(report.lakes_discarded, 0);
    assert_eq!(report.mixed_tiles, 1);
    assert_eq!(report.unresolved_fragments, 0);

    let coord = TileCoord::new(0, 0);
    let segment = map.segment(coord).unwrap();
    assert_eq!(segment.fragments.len(), 1);
    let fragment = &segment.fragments[0];
    assert!(fragment.cyclic);
    assert_eq!((fragment.begin_t, fragment.end_t), (0.0, 1.0));
    assert!(map.curves()[0].control_count() <= 16);

    // The smoothed outline sits inside the pixel block and loses a little
    // at each corner.
    let exact = 8.0 * 8.0 * PIXEL * PIXEL;
    let area = mesh_area(&mut map, coord, 0);
    assert!(area <= exact * 1.001, "area {area}");
    assert!(area >= exact * 0.95, "area {area}");

    // Finer detail never loses triangles.
    let coarse = map.cached(coord, 0).unwrap().triangle_count();
    let fine_area = mesh_area(&mut map, coord, 2);
    let fine = map.cached(coord, 2).unwrap().triangle_count();
    assert!(fine >= coarse);
    assert!((fine_area - area).abs() < exact * 0.05);
}

#[test]
fn test_island_across_four_tiles() {
    let mut map = build(block_mask(128, 128, 48, 80), 64);
    let report = map.report().clone();
    assert_eq!(report.curves, 1);
    assert_eq!(report.mixed_tiles, 4);
    assert_eq!(report.fragments, 4);
    assert_eq!(report.unresolved_fragments, 0);

    // The four fragments cover exactly one period of the closed curve.
    let covered: f64 = map
        .segments()
        .iter()
        .flat_map(|s| s.fragments.iter())
        .map(|f| f.span())
        .sum();
    assert!((covered - 1.0).abs() < 1e-9, "covered {covered}");

    let centre = DVec2::splat(64.0 * PIXEL);
    let mut total = 0.0;
    for y in 0..2 {
        for x in 0..2 {
            let coord = TileCoord::new(x, y);
            total += mesh_area(&mut map, coord, 0);
            let mesh = map.cached(coord, 0).unwrap();
            assert_eq!(mesh.polygons.len(), 1);
            // Every quarter closes through the corner shared by all four tiles.
            assert!(mesh.polygons[0]
                .points
                .iter()
                .any(|p| p.distance(centre) < 1e-6));
        }
    }
    let exact = 32.0 * 32.0 * PIXEL * PIXEL;
    assert!((total - exact).abs() < exact * 0.05, "total {total}");
}

#[test]
fn test_straight_coast_across_two_tiles() {
    // Land fills the southern half of a 2x1 tile map.
    let mask = RasterMask::from_fn(128, 64, PIXEL, DVec2::ZERO, |_, y| y < 32);
    let mut map = build(mask, 64);
    assert_eq!(map.report().curves, 1);
    assert_eq!(map.report().mixed_tiles, 2);
    assert_eq!(map.report().unresolved_fragments, 0);

    let expected = 64.0 * 32.0 * PIXEL * PIXEL;
    for x in 0..2 {
        let area = mesh_area(&mut map, TileCoord::new(x, 0), 0);
        assert!((area - expected).abs() < expected * 1e-6, "tile {x}: {area}");
    }
    assert!(map.is_land_at(DVec2::new(10_000.0, 10_000.0)));
    assert!(!map.is_land_at(DVec2::new(10_000.0, 50_000.0)));
}

#[test]
fn test_pure_tiles_and_lakes() {
    // All land except a lake; the lake is not a coastline.
    let mask = RasterMask::from_fn(128, 64, PIXEL, DVec2::ZERO, |x, y| {
        !((10..20).contains(&x) && (10..20).contains(&y))
    });
    let mut map = build(mask, 64);
    assert_eq!(map.report().curves, 0);
    assert_eq!(map.report().lakes_discarded, 1);
    assert_eq!(map.report().land_tiles, 2);
    assert_eq!(map.tile_kind(TileCoord::new(0, 0)), Some(TileKind::Land));
    assert!(!map.ensure_cache(TileCoord::new(0, 0), 0));
    assert_eq!(map.tile_kind(TileCoord::new(5, 5)), None);
}

#[test]
fn test_load_from_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let mask = block_mask(128, 128, 48, 80);
    write_pbm(&mask, &dir.path().join("island.pbm")).unwrap();

    let descriptor = MapDescriptor {
        mask: "island.pbm".into(),
        realwidth: 128.0 * PIXEL,
        realoffset: [5000.0, -3000.0],
        tile_pixels: Some(64),
        invert: false,
        cities: Vec::new(),
        settings: CoastSettings::default(),
    };
    let path = dir.path().join("island.json");
    std::fs::write(&path, serde_json::to_string(&descriptor).unwrap()).unwrap();

    let map = CoastMap::load(&path).unwrap();
    assert_eq!(map.mask().header.origin, DVec2::new(5000.0, -3000.0));
    assert_eq!(map.mask().header.pixel_size, PIXEL);
    assert_eq!(map.mask().land_count(), mask.land_count());
    assert!(map.mask().is_land(48, 48));
    assert!(!map.mask().is_land(47, 48));
    assert_eq!(map.report().mixed_tiles, 4);
    assert_eq!(
        map.tile_kind_at(DVec2::new(5000.0 + 10.0, -3000.0 + 10.0)),
        Some(TileKind::Mixed)
    );
    assert!(map.is_land_at(DVec2::new(5000.0 + 64_000.0, -3000.0 + 64_000.0)));
}

#[test]
fn test_missing_mask_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{ "mask": "nowhere.pbm", "realwidth": 1000.0 }"#).unwrap();
    assert!(CoastMap::load(&path).is_err());
}

#[test]
fn test_coast_ending_on_tile_corner() {
    // The coast reaches the west edge along the tile line y = 32, ending on
    // the corner shared by tiles (0, 0) and (0, 1).
    let mask = RasterMask::from_fn(64, 64, PIXEL, DVec2::ZERO, |x, y| {
        y >= 32 || (x >= 1 && y >= 28)
    });
    let mut map = build(mask, 32);
    assert_eq!(map.report().curves, 1);
    assert_eq!(map.report().fragments, 2);
    assert_eq!(map.tile_kind(TileCoord::new(0, 1)), Some(TileKind::Land));
    assert_eq!(map.tile_kind(TileCoord::new(1, 1)), Some(TileKind::Land));
    assert_eq!(map.tile_kind(TileCoord::new(0, 0)), Some(TileKind::Mixed));
    assert_eq!(map.tile_kind(TileCoord::new(1, 0)), Some(TileKind::Mixed));
    assert_land_conserved(&mut map, 0.01, "ledge");
}

/// Pick a value in `lo..=hi`, snapped to a multiple of the 32 px tile for
/// some draws so coasts run along tile lines and end on tile corners.
fn pick(rng: &mut ChaCha8Rng, lo: u32, hi: u32) -> u32 {
    let v = rng.gen_range(lo..=hi);
    if rng.gen_bool(0.4) {
        (v + 16) / 32 * 32
    } else {
        v
    }
}

/// A stepped mainland along the south edge and a round island north of it,
/// on a 128 px map.
fn seeded_mask(seed: u64) -> RasterMask {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let west_shore = pick(&mut rng, 16, 44);
    let east_shore = pick(&mut rng, 16, 60);
    let step = pick(&mut rng, 16, 112);
    let radius: f64 = rng.gen_range(12.0..20.0);
    let lowest = west_shore.max(east_shore) as f64 + radius + 3.0;
    let cx: f64 = rng.gen_range(0.0..128.0);
    let cy: f64 = rng.gen_range(lowest..124.0);

    RasterMask::from_fn(128, 128, PIXEL, DVec2::ZERO, |x, y| {
        let shore = if x < step { west_shore } else { east_shore };
        let (px, py) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
        y < shore || px * px + py * py <= radius * radius
    })
}

#[test]
fn test_land_is_conserved_across_tiles() {
    for seed in 0..24 {
        let mut map = build(seeded_mask(seed), 32);
        assert_eq!(map.report().curves_skipped, 0, "seed {seed}");
        assert_land_conserved(&mut map, 0.03, &format!("seed {seed}"));
    }
}

#[test]
fn test_higher_degree_shrinks_small_islands() {
    let coord = TileCoord::new(0, 0);
    let exact = 8.0 * 8.0 * PIXEL * PIXEL;
    let mut cubic = build(block_mask(64, 64, 28, 36), 64);
    let cubic_area = mesh_area(&mut cubic, coord, 0);

    let settings = CoastSettings {
        spline_degree: 16,
        ..CoastSettings::default()
    };
    let mut high = CoastMap::from_mask(block_mask(64, 64, 28, 36), settings, Some(64), Vec::new())
        .unwrap();
    // Sixteen control points cap the degree at 15.
    assert_eq!(high.curves()[0].spline.degree(), 15);
    let high_area = mesh_area(&mut high, coord, 0);

    assert!(high_area < cubic_area);
    assert!(high_area < exact * 0.95, "area {high_area}");
    assert!(high_area > exact * 0.7, "area {high_area}");
}
