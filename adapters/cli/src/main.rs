#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Swarmfall session.

mod assets;
mod config;
mod simulation;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use swarmfall_world::{DefinitionTables, TileMap, World};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    assets::AssetLibrary,
    config::{ContentSection, MapKind, SimulationConfig, WorldSection},
    simulation::Simulation,
};

/// Headless survival simulation driven by an autopilot.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a `swarmfall.toml` configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the JSON definition tables.
    #[arg(long)]
    content: Option<PathBuf>,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 3_600)]
    frames: u64,
    /// Length of one frame in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,
    /// Seed overriding `[world].seed`.
    #[arg(long)]
    seed: Option<u64>,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Entry point for the Swarmfall command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = SimulationConfig::load(args.config.as_deref())?;
    let seed = args.seed.unwrap_or(config.world.seed);
    let content_dir = args
        .content
        .clone()
        .unwrap_or_else(|| config.content.dir.clone());

    let assets = AssetLibrary::from_manifest(&config.assets);
    let mut tables = load_tables(&content_dir, &config.content)?;
    let missing = tables.check_images(&assets).len();
    info!(
        hostiles = tables.hostiles().len(),
        weapons = tables.weapons().len(),
        upgrades = tables.upgrades().len(),
        skipped = tables.warnings().len().saturating_sub(missing),
        missing_images = missing,
        images = assets.image_count(),
        "definition tables loaded"
    );

    let map = build_map(&config.world, seed)?;
    let world = World::new(config.world_config(), map, tables);
    let mut simulation = Simulation::new(&config, world, assets, seed);

    let dt = Duration::from_millis(args.frame_ms.max(1));
    for _ in 0..args.frames {
        if !simulation.step(dt) {
            info!("player died, stopping");
            break;
        }
    }

    let summary = simulation.summary();
    info!(?summary, "session finished");
    println!("frames:      {}", summary.frames);
    println!("level:       {}", summary.level);
    println!("spawned:     {}", summary.spawned);
    println!("killed:      {}", summary.killed);
    println!("culled:      {}", summary.culled);
    println!("shots:       {}", summary.shots);
    println!("hits taken:  {}", summary.hits_taken);
    println!("upgrades:    {}", summary.upgrades);
    println!("survived:    {}", !summary.player_dead);
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_tables(dir: &Path, content: &ContentSection) -> Result<DefinitionTables> {
    let read = |name: &str| {
        let path = dir.join(name);
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read definition table at {}", path.display()))
    };
    let hostiles = read(&content.hostiles)?;
    let weapons = read(&content.weapons)?;
    let upgrades = read(&content.upgrades)?;
    DefinitionTables::from_json(&hostiles, &weapons, &upgrades, &content.id_ranges())
        .with_context(|| format!("failed to load definition tables from {}", dir.display()))
}

fn build_map(world: &WorldSection, seed: u64) -> Result<TileMap> {
    let map = match world.map {
        MapKind::Forest => TileMap::forest(world.columns, world.rows, world.tile_length, seed),
        MapKind::Open => TileMap::open(world.columns, world.rows, world.tile_length),
    };
    map.context("invalid map configuration")
}
