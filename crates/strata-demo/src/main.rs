//! Headless driver that streams terrain around a walking observer.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p strata-demo -- --steps 16 --load-radius 3`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use glam::Vec3;
use strata_config::{CliArgs, Config, default_config_dir};
use strata_mesh::{ChunkGeometry, ChunkNeighborhood, greedy_mesh};
use strata_voxel::{ChunkCoordinate, ChunkDims, Voxel, VoxelRun, VoxelType, to_flat_buffer};
use strata_world::{ChunkStore, ObserverId};
use tracing::{info, warn};

const OBSERVER: ObserverId = ObserverId(0);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".strata"));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    info!(config_dir = %config_dir.display(), "strata demo starting");

    demonstrate_isolated_mesh();
    walk_observer(&config, args.steps);
}

/// A single stone voxel in an otherwise empty chunk meshes to one quad per side.
fn demonstrate_isolated_mesh() {
    let dims = ChunkDims::new(16, 16);
    let empty = ChunkNeighborhood::isolated(dims, to_flat_buffer(None, dims));
    info!(quads = greedy_mesh(&empty, 1.0).quad_count(), "empty chunk meshed");

    let mut run = VoxelRun::air(dims.volume());
    if let Err(e) = run.set(dims.index(0, 0, 0), Voxel::new(VoxelType::Stone)) {
        warn!(error = %e, "could not place demo voxel");
        return;
    }
    let neighborhood = ChunkNeighborhood::isolated(dims, run.to_flat());
    let geometry = greedy_mesh(&neighborhood, 1.0);
    info!(
        quads = geometry.quad_count(),
        vertices = geometry.vertices.len(),
        triangles = geometry.triangle_indices().len() / 3,
        "single voxel meshed"
    );
}

fn walk_observer(config: &Config, steps: u32) {
    let quads = Arc::new(AtomicUsize::new(0));
    let meshes = Arc::new(AtomicUsize::new(0));

    let mut store = ChunkStore::from_config(config);
    {
        let quads = Arc::clone(&quads);
        let meshes = Arc::clone(&meshes);
        store.set_geometry_sink(move |_: ChunkCoordinate, g: &ChunkGeometry| {
            quads.fetch_add(g.quad_count(), Ordering::Relaxed);
            meshes.fetch_add(1, Ordering::Relaxed);
        });
    }

    let load = config.streaming.load_radius;
    let unload = config.streaming.unload_radius;
    let start_y = (config.world.world_height_chunks / 2).max(0);

    for step in 0..steps {
        let chunk = ChunkCoordinate::new(step as i32, start_y, 0);
        let started = Instant::now();
        store.update_observer_chunk_position(OBSERVER, chunk, load, unload);
        if !settle(&mut store) {
            warn!(step, stats = ?store.stats(), "loading did not settle in time");
        }

        let origin = store.params().chunk_origin_world(chunk);
        let column = origin + Vec3::splat(0.5);
        let height = store.height_at_column(column.x, column.z);
        let stats = store.stats();
        info!(
            step,
            %chunk,
            loaded = stats.loaded,
            frontier = stats.frontier,
            failed = stats.failed,
            surface = height,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "observer step settled"
        );

        if step == steps / 2 {
            demonstrate_edits(&mut store, Vec3::new(column.x, height, column.z));
        }
    }

    info!(
        meshes = meshes.load(Ordering::Relaxed),
        quads = quads.load(Ordering::Relaxed),
        "walk finished"
    );
}

/// Ticks until nothing is loading or meshing. Returns `false` on timeout.
fn settle(store: &mut ChunkStore) -> bool {
    let started = Instant::now();
    while !store.is_idle() {
        if started.elapsed() > SETTLE_TIMEOUT {
            return false;
        }
        store.tick();
        std::thread::sleep(Duration::from_millis(2));
    }
    true
}

fn demonstrate_edits(store: &mut ChunkStore, surface: Vec3) {
    let below = surface - Vec3::new(0.0, 0.5, 0.0);
    let broke = store.try_break(below);
    let placed = store.try_place(surface + Vec3::new(0.0, 0.5, 0.0), VoxelType::Wood);
    let slab_min = surface + Vec3::new(2.0, 2.0, 2.0);
    let slab_max = slab_min + Vec3::new(6.0, 0.0, 6.0);
    let chunks = store.try_two_point_replace(slab_min, slab_max, VoxelType::Glass);

    info!(
        broke,
        placed,
        slab_chunks = chunks,
        events = store.events().len(),
        batch_events = store.events().batch_len(),
        surface_after = store.height_at_column(surface.x, surface.z),
        "sample edits applied"
    );
    for event in store.events().read() {
        info!(
            chunk = %event.chunk,
            local = ?event.local,
            from = %event.old_type,
            to = %event.new_type,
            "voxel edit event"
        );
    }
}
