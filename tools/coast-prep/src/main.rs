//! coast-prep: build and inspect coastline maps, generate synthetic masks.
//!
//! Usage:
//!   coast-prep build channel.json --detail 0
//!   coast-prep mesh channel.json --tile 3,2 --detail 1
//!   coast-prep synthetic --output maps/archipelago --seed 7

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tidewater_coast::{City, CoastMap, CoastSettings, MapDescriptor, RasterMask};
use tidewater_core::enums::TileKind;
use tidewater_core::types::TileCoord;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Tile edge written into synthetic descriptors.
const SYNTHETIC_TILE_PIXELS: u32 = 64;

#[derive(Parser)]
#[command(author, version, about = "TIDEWATER coastline preprocessing tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a map from a descriptor and print a summary
    Build {
        /// Map descriptor (JSON)
        descriptor: PathBuf,

        /// Also triangulate every mixed tile at this detail level
        #[arg(long, allow_hyphen_values = true)]
        detail: Option<i32>,
    },

    /// Print one tile's mesh as JSON
    Mesh {
        /// Map descriptor (JSON)
        descriptor: PathBuf,

        /// Tile coordinates as X,Y
        #[arg(long, value_parser = parse_tile)]
        tile: TileCoord,

        /// Detail level
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        detail: i32,
    },

    /// Generate a seeded synthetic archipelago mask (PBM) and descriptor
    Synthetic {
        /// Output directory
        #[arg(long)]
        output: PathBuf,

        /// Mask edge in pixels (a multiple of 64)
        #[arg(long, default_value_t = 256)]
        size: u32,

        /// Pixel edge in meters
        #[arg(long, default_value_t = 500.0)]
        pixel_size: f64,

        /// Random seed
        #[arg(long, default_value_t = 1)]
        seed: u64,

        /// Number of islands
        #[arg(long, default_value_t = 12)]
        islands: usize,
    },
}

fn parse_tile(s: &str) -> Result<TileCoord, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad tile x: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad tile y: {e}"))?;
    Ok(TileCoord::new(x, y))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Build { descriptor, detail } => cmd_build(&descriptor, detail),
        Command::Mesh {
            descriptor,
            tile,
            detail,
        } => cmd_mesh(&descriptor, tile, detail),
        Command::Synthetic {
            output,
            size,
            pixel_size,
            seed,
            islands,
        } => cmd_synthetic(&output, size, pixel_size, seed, islands),
    }
}

fn cmd_build(descriptor: &Path, detail: Option<i32>) -> anyhow::Result<()> {
    let mut map = CoastMap::load(descriptor)
        .with_context(|| format!("building map from {}", descriptor.display()))?;

    let report = map.report().clone();
    let grid = map.grid().clone();
    println!("Map:        {} x {} px", map.mask().width(), map.mask().height());
    println!(
        "Tiles:      {} x {} of {} px ({:.0} m)",
        grid.columns,
        grid.rows,
        grid.tile_pixels,
        grid.tile_extent()
    );
    println!(
        "Coastlines: {} ({} lakes discarded, {} skipped)",
        report.curves, report.lakes_discarded, report.curves_skipped
    );
    println!(
        "Fragments:  {} ({} without successor)",
        report.fragments, report.unresolved_fragments
    );
    println!(
        "Tile kinds: {} land, {} sea, {} mixed",
        report.land_tiles, report.sea_tiles, report.mixed_tiles
    );
    println!("Cities:     {}", map.cities().len());

    let Some(detail) = detail else {
        return Ok(());
    };

    let mixed: Vec<TileCoord> = grid
        .coords()
        .filter(|&c| map.tile_kind(c) == Some(TileKind::Mixed))
        .collect();
    let (mut triangles, mut failed, mut skipped, mut area) = (0, 0, 0, 0.0);
    for coord in mixed {
        map.ensure_cache(coord, detail);
        if let Some(mesh) = map.cached(coord, detail) {
            triangles += mesh.triangle_count();
            failed += mesh.failed_polygons;
            skipped += mesh.skipped_chains;
            area += mesh.land_area();
        }
    }
    let pure_land = report.land_tiles as f64 * grid.tile_extent() * grid.tile_extent();
    println!("Detail {detail}:   {triangles} triangles, {failed} failed polygons, {skipped} skipped chains");
    println!("Land area:  {:.1} km²", (area + pure_land) / 1.0e6);
    Ok(())
}

fn cmd_mesh(descriptor: &Path, tile: TileCoord, detail: i32) -> anyhow::Result<()> {
    let mut map = CoastMap::load(descriptor)
        .with_context(|| format!("building map from {}", descriptor.display()))?;

    match map.tile_kind(tile) {
        None => bail!(
            "tile {},{} is outside the {}x{} tile map",
            tile.x,
            tile.y,
            map.grid().columns,
            map.grid().rows
        ),
        Some(kind) if kind.is_pure() => {
            println!("{}", serde_json::to_string_pretty(&kind)?);
            return Ok(());
        }
        Some(_) => {}
    }

    map.ensure_cache(tile, detail);
    let mesh = map
        .cached(tile, detail)
        .context("mixed tile produced no mesh")?;
    println!("{}", serde_json::to_string_pretty(mesh)?);
    Ok(())
}

/// Elliptical island at (cx, cy) with semi-axes (rx, ry), in normalized coordinates.
#[derive(Debug, Clone, Copy)]
struct Island {
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    /// Shoreline wobble amplitude relative to the radius.
    wobble: f64,
    phase: f64,
}

impl Island {
    fn random(rng: &mut ChaCha8Rng) -> Self {
        Self {
            cx: rng.gen_range(0.1..0.9),
            cy: rng.gen_range(0.1..0.65),
            rx: rng.gen_range(0.02..0.09),
            ry: rng.gen_range(0.02..0.07),
            wobble: rng.gen_range(0.0..0.25),
            phase: rng.gen_range(0.0..std::f64::consts::TAU),
        }
    }

    fn contains(&self, nx: f64, ny: f64) -> bool {
        let dx = (nx - self.cx) / self.rx;
        let dy = (ny - self.cy) / self.ry;
        let angle = dy.atan2(dx);
        let radius = 1.0 + self.wobble * (3.0 * angle + self.phase).sin();
        dx * dx + dy * dy <= radius * radius
    }
}

/// Land test for the synthetic archipelago: a mainland along the north edge
/// plus scattered islands. `nx`, `ny` run 0..1 west to east, south to north.
fn synthetic_land(nx: f64, ny: f64, islands: &[Island]) -> bool {
    let north_shore = 0.8 + 0.05 * (nx * 8.0).sin() + 0.03 * (nx * 19.0).sin();
    ny > north_shore || islands.iter().any(|i| i.contains(nx, ny))
}

fn cmd_synthetic(
    output: &Path,
    size: u32,
    pixel_size: f64,
    seed: u64,
    island_count: usize,
) -> anyhow::Result<()> {
    if size == 0 || size % SYNTHETIC_TILE_PIXELS != 0 {
        bail!("size must be a positive multiple of {SYNTHETIC_TILE_PIXELS}, got {size}");
    }
    if !(pixel_size.is_finite() && pixel_size > 0.0) {
        bail!("pixel size must be positive, got {pixel_size}");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let islands: Vec<Island> = (0..island_count).map(|_| Island::random(&mut rng)).collect();

    info!(size, seed, islands = island_count, "generating synthetic archipelago");
    let n = size as f64;
    let mask = RasterMask::from_fn(size, size, pixel_size, DVec2::ZERO, |x, y| {
        synthetic_land((x as f64 + 0.5) / n, (y as f64 + 0.5) / n, &islands)
    });

    // Ports on a few random land pixels.
    let mut cities = Vec::new();
    for _ in 0..1000 {
        if cities.len() >= 3 {
            break;
        }
        let x = rng.gen_range(0..size);
        let y = rng.gen_range(0..size);
        if mask.is_land(x, y) {
            cities.push(City {
                name: format!("Port {}", cities.len() + 1),
                position: [(x as f64 + 0.5) * pixel_size, (y as f64 + 0.5) * pixel_size],
            });
        }
    }
    info!(ports = cities.len(), "placed ports");

    std::fs::create_dir_all(output)
        .with_context(|| format!("creating {}", output.display()))?;
    let mask_path = output.join("mask.pbm");
    tidewater_coast::write_pbm(&mask, &mask_path)?;

    let descriptor = MapDescriptor {
        mask: PathBuf::from("mask.pbm"),
        realwidth: n * pixel_size,
        realoffset: [0.0, 0.0],
        tile_pixels: Some(SYNTHETIC_TILE_PIXELS),
        invert: false,
        cities,
        settings: CoastSettings::default(),
    };
    let descriptor_path = output.join("map.json");
    std::fs::write(&descriptor_path, serde_json::to_string_pretty(&descriptor)?)
        .with_context(|| format!("writing {}", descriptor_path.display()))?;

    println!(
        "Wrote {} ({} land pixels of {}) and {}",
        mask_path.display(),
        mask.land_count(),
        size as u64 * size as u64,
        descriptor_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tile() {
        assert_eq!(parse_tile("3,2"), Ok(TileCoord::new(3, 2)));
        assert_eq!(parse_tile(" 0, 7"), Ok(TileCoord::new(0, 7)));
        assert!(parse_tile("3").is_err());
        assert!(parse_tile("a,1").is_err());
    }

    #[test]
    fn test_synthetic_land_is_seeded() {
        let make = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..5).map(|_| Island::random(&mut rng)).collect::<Vec<_>>()
        };
        let a = make(7);
        let b = make(7);
        for y in 0..32 {
            for x in 0..32 {
                let (nx, ny) = (x as f64 / 32.0, y as f64 / 32.0);
                assert_eq!(synthetic_land(nx, ny, &a), synthetic_land(nx, ny, &b));
            }
        }
        // The mainland fills the northern edge.
        assert!(synthetic_land(0.5, 0.99, &[]));
        assert!(!synthetic_land(0.5, 0.5, &[]));
    }

    #[test]
    fn test_synthetic_map_builds() {
        let dir = tempfile::tempdir().unwrap();
        cmd_synthetic(dir.path(), 128, 500.0, 3, 6).unwrap();
        let map = CoastMap::load(&dir.path().join("map.json")).unwrap();
        assert_eq!(map.grid().tile_count(), 4);
        // The mainland coast crosses the whole map.
        assert!(map.report().curves >= 1);
        assert!(map.report().mixed_tiles >= 2);
    }
}
