//! Chunk streaming around observers.
//!
//! The store keeps three disjoint views of the chunk grid:
//!
//! - `loaded`: chunks whose contents are in memory,
//! - `in_progress`: coordinates whose generation result will be accepted,
//! - `frontier`: unloaded coordinates with at least one loaded face neighbor.
//!
//! Loads grow outward from the frontier (and from each observer's own
//! coordinate, which seeds an empty world). Unloads shrink the loaded set
//! from the outside in. Neither ever blocks on a worker.
//!
//! A coordinate dropped from `in_progress` may still have a task running in
//! the pool. It stays in `dispatched` until that result is drained, and asking
//! for it again in the meantime re-adopts the running task instead of
//! submitting a second one.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use strata_config::Config;
use strata_mesh::{
    ChunkGeometry, ChunkNeighborhood, FaceDirection, MeshTickets, MeshingPipeline, MeshingResult,
    MeshingTask, NeighborSlot, greedy_mesh,
};
use strata_terrain::{GeneratedChunk, GenerationPool, TerrainGenerator};
use strata_voxel::{ChunkCoordinate, ChunkDims, VoxelEventBuffer, VoxelRun, WorldParameters};

use crate::chunk::{Chunk, GeometrySink};
use crate::observer::{Observer, ObserverId};

/// Point-in-time counters for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Chunks in memory.
    pub loaded: usize,
    /// Requests whose results will be accepted.
    pub in_progress: usize,
    /// Generation tasks still running in the pool, accepted or not.
    pub dispatched: usize,
    /// Unloaded coordinates next to a loaded chunk.
    pub frontier: usize,
    /// Coordinates waiting to be dispatched.
    pub load_queue: usize,
    /// Chunks waiting to be dropped.
    pub unload_queue: usize,
    /// Chunks with a background mesh outstanding.
    pub pending_meshes: usize,
    /// Registered observers.
    pub observers: usize,
    /// Coordinates held back after a failed generation.
    pub failed: usize,
}

/// Owns every loaded chunk, the streaming queues and both worker pools.
pub struct ChunkStore {
    pub(crate) params: WorldParameters,
    pub(crate) dims: ChunkDims,
    pub(crate) loaded: FxHashMap<ChunkCoordinate, Chunk>,
    in_progress: FxHashSet<ChunkCoordinate>,
    dispatched: FxHashSet<ChunkCoordinate>,
    frontier: FxHashSet<ChunkCoordinate>,
    load_queue: VecDeque<ChunkCoordinate>,
    unload_queue: VecDeque<ChunkCoordinate>,
    observers: FxHashMap<ObserverId, Observer>,
    /// Coordinates whose generation failed; skipped until the next observer update.
    failed: FxHashSet<ChunkCoordinate>,
    tickets: MeshTickets,
    pub(crate) events: VoxelEventBuffer,
    generation: GenerationPool,
    meshing: MeshingPipeline,
    sink: Option<Box<dyn GeometrySink>>,
}

impl ChunkStore {
    /// Creates a store around existing worker pools.
    pub fn new(
        params: WorldParameters,
        generation: GenerationPool,
        meshing: MeshingPipeline,
    ) -> Self {
        let dims = params.dims();
        tracing::info!(
            world = %params.name,
            seed = params.seed,
            chunk_size = dims.size,
            chunk_height = dims.height,
            generation_threads = generation.thread_count(),
            meshing_threads = meshing.worker_count(),
            "chunk store created"
        );
        Self {
            params,
            dims,
            loaded: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            dispatched: FxHashSet::default(),
            frontier: FxHashSet::default(),
            load_queue: VecDeque::new(),
            unload_queue: VecDeque::new(),
            observers: FxHashMap::default(),
            failed: FxHashSet::default(),
            tickets: MeshTickets::new(),
            events: VoxelEventBuffer::new(),
            generation,
            meshing,
            sink: None,
        }
    }

    /// Builds the terrain generator and both pools from `config`.
    pub fn from_config(config: &Config) -> Self {
        let generator = Arc::new(TerrainGenerator::new(
            config.world.clone(),
            config.terrain.clone(),
        ));
        let generation =
            GenerationPool::new(generator, config.workers.resolved_generation_threads());
        let meshing = MeshingPipeline::new(
            config.workers.resolved_meshing_threads(),
            config.world.resolution,
        );
        Self::new(config.world.clone(), generation, meshing)
    }

    /// Installs the receiver for chunk geometry.
    pub fn set_geometry_sink(&mut self, sink: impl GeometrySink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// World layout this store was built for.
    pub fn params(&self) -> &WorldParameters {
        &self.params
    }

    /// A loaded chunk.
    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<&Chunk> {
        self.loaded.get(&coordinate)
    }

    /// Whether `coordinate` has contents in memory.
    pub fn is_loaded(&self, coordinate: ChunkCoordinate) -> bool {
        self.loaded.contains_key(&coordinate)
    }

    /// Every loaded coordinate, in no particular order.
    pub fn loaded_coordinates(&self) -> impl Iterator<Item = ChunkCoordinate> + '_ {
        self.loaded.keys().copied()
    }

    /// Unloaded coordinates adjacent to a loaded chunk.
    pub fn frontier(&self) -> &FxHashSet<ChunkCoordinate> {
        &self.frontier
    }

    /// Whether a generation result for `coordinate` would be accepted.
    pub fn is_in_progress(&self, coordinate: ChunkCoordinate) -> bool {
        self.in_progress.contains(&coordinate)
    }

    /// Edit notifications from this frame and the previous one.
    pub fn events(&self) -> &VoxelEventBuffer {
        &self.events
    }

    /// Current queue and map sizes.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            loaded: self.loaded.len(),
            in_progress: self.in_progress.len(),
            dispatched: self.dispatched.len(),
            frontier: self.frontier.len(),
            load_queue: self.load_queue.len(),
            unload_queue: self.unload_queue.len(),
            pending_meshes: self.tickets.pending_count(),
            observers: self.observers.len(),
            failed: self.failed.len(),
        }
    }

    /// Any chunk is queued or generating.
    pub fn is_loading_in_progress(&self) -> bool {
        !self.load_queue.is_empty() || !self.in_progress.is_empty()
    }

    /// Nothing is loading and no mesh request is outstanding.
    pub fn is_idle(&self) -> bool {
        !self.is_loading_in_progress() && self.tickets.pending_count() == 0
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Records where `id` is, queues every chunk no observer wants anymore,
    /// and drains the queues.
    pub fn update_observer_position(
        &mut self,
        id: ObserverId,
        chunk: ChunkCoordinate,
        load_radius: f32,
        unload_radius: f32,
    ) {
        let observer = Observer {
            chunk,
            load_radius,
            unload_radius,
        };
        if self.observers.insert(id, observer) != Some(observer) {
            tracing::debug!(
                observer = id.0,
                %chunk,
                load_radius,
                unload_radius,
                "observer moved"
            );
        }
        if !self.failed.is_empty() {
            tracing::debug!(count = self.failed.len(), "re-admitting failed chunks");
            self.failed.clear();
        }
        self.queue_unwanted();
        self.drain_queues();
    }

    /// Same as [`update_observer_position`](Self::update_observer_position).
    pub fn update_observer_chunk_position(
        &mut self,
        id: ObserverId,
        chunk: ChunkCoordinate,
        load_radius: f32,
        unload_radius: f32,
    ) {
        self.update_observer_position(id, chunk, load_radius, unload_radius);
    }

    /// Forgets `id`. Chunks only it was holding are unloaded.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        if self.observers.remove(&id).is_none() {
            return false;
        }
        tracing::debug!(observer = id.0, "observer removed");
        self.queue_unwanted();
        self.drain_queues();
        true
    }

    /// The last recorded position and radii of `id`.
    pub fn observer(&self, id: ObserverId) -> Option<&Observer> {
        self.observers.get(&id)
    }

    fn wanted_loaded(&self, coordinate: ChunkCoordinate) -> bool {
        self.observers.values().any(|o| o.wants_loaded(coordinate))
    }

    fn wanted_unloaded(&self, coordinate: ChunkCoordinate) -> bool {
        self.observers.values().all(|o| o.wants_unloaded(coordinate))
    }

    /// Queues loaded chunks beyond every observer's unload radius and drops
    /// in-progress requests beyond it. Late results for those are discarded.
    fn queue_unwanted(&mut self) {
        let mut unwanted: Vec<ChunkCoordinate> = self
            .loaded
            .keys()
            .copied()
            .filter(|&c| self.wanted_unloaded(c))
            .collect();
        unwanted.sort();
        self.unload_queue.extend(unwanted);

        let cancelled: Vec<ChunkCoordinate> = self
            .in_progress
            .iter()
            .copied()
            .filter(|&c| self.wanted_unloaded(c))
            .collect();
        for coordinate in cancelled {
            tracing::trace!(chunk = %coordinate, "dropping in-progress request");
            self.in_progress.remove(&coordinate);
        }
    }

    // -----------------------------------------------------------------------
    // Queues
    // -----------------------------------------------------------------------

    /// Unloads everything queued, queues every frontier coordinate inside a
    /// load radius, then dispatches every queued load.
    pub fn drain_queues(&mut self) {
        while let Some(coordinate) = self.unload_queue.pop_front() {
            self.unload(coordinate);
        }

        let mut candidates: Vec<ChunkCoordinate> = self
            .frontier
            .iter()
            .copied()
            .chain(self.observers.values().map(|o| o.chunk))
            .filter(|&c| self.should_request(c))
            .collect();
        candidates.sort_by_key(|&c| (self.nearest_observer_distance_sq(c), c));
        candidates.dedup();
        self.load_queue.extend(candidates);

        while let Some(coordinate) = self.load_queue.pop_front() {
            if !self.should_request(coordinate) {
                continue;
            }
            if self.dispatched.contains(&coordinate) {
                tracing::trace!(chunk = %coordinate, "re-adopting running generation");
                self.in_progress.insert(coordinate);
            } else if self.generation.submit(coordinate) {
                tracing::trace!(chunk = %coordinate, "generation requested");
                self.dispatched.insert(coordinate);
                self.in_progress.insert(coordinate);
            } else {
                tracing::warn!(chunk = %coordinate, "generation pool is shut down");
            }
        }
    }

    fn should_request(&self, coordinate: ChunkCoordinate) -> bool {
        self.params.in_vertical_bounds(coordinate)
            && !self.loaded.contains_key(&coordinate)
            && !self.in_progress.contains(&coordinate)
            && !self.failed.contains(&coordinate)
            && self.wanted_loaded(coordinate)
    }

    fn nearest_observer_distance_sq(&self, coordinate: ChunkCoordinate) -> i64 {
        self.observers
            .values()
            .map(|o| coordinate.distance_sq(o.chunk))
            .min()
            .unwrap_or(i64::MAX)
    }

    fn unload(&mut self, coordinate: ChunkCoordinate) {
        if self.loaded.remove(&coordinate).is_none() {
            return;
        }
        self.tickets.forget(coordinate);
        tracing::trace!(chunk = %coordinate, "chunk unloaded");

        if self.has_loaded_neighbor(coordinate) {
            self.frontier.insert(coordinate);
        }
        for neighbor in coordinate.neighbors() {
            if !self.loaded.contains_key(&neighbor) && !self.has_loaded_neighbor(neighbor) {
                self.frontier.remove(&neighbor);
            }
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.chunk_unloaded(coordinate);
        }
    }

    fn has_loaded_neighbor(&self, coordinate: ChunkCoordinate) -> bool {
        coordinate
            .neighbors()
            .iter()
            .any(|n| self.loaded.contains_key(n))
    }

    /// All six neighbors are loaded or lie outside the world vertically.
    pub fn is_surrounded(&self, coordinate: ChunkCoordinate) -> bool {
        coordinate
            .neighbors()
            .iter()
            .all(|&n| !self.params.in_vertical_bounds(n) || self.loaded.contains_key(&n))
    }

    // -----------------------------------------------------------------------
    // Worker results
    // -----------------------------------------------------------------------

    /// Applies finished generation and meshing work, then drains the queues.
    pub fn tick(&mut self) {
        self.events.swap();

        for GeneratedChunk {
            coordinate,
            result,
            generation_time_us,
        } in self.generation.drain_results()
        {
            self.dispatched.remove(&coordinate);
            match result {
                Ok(run) => {
                    tracing::trace!(chunk = %coordinate, generation_time_us, "chunk generated");
                    self.on_generation_complete(coordinate, run);
                }
                Err(err) => {
                    tracing::error!(chunk = %coordinate, error = %err, "chunk generation failed");
                    if self.in_progress.remove(&coordinate) {
                        self.failed.insert(coordinate);
                    }
                }
            }
        }

        for result in self.meshing.drain_results() {
            self.on_mesh_complete(result);
        }

        self.drain_queues();
    }

    /// Stores freshly generated contents, updates the frontier, re-drains the
    /// queues and requests meshes for the chunk and every loaded neighbor.
    ///
    /// Each neighbor's last mesh was built with this chunk missing, so its
    /// faces on the shared side were suppressed.
    ///
    /// Results for coordinates that were cancelled or already loaded are
    /// dropped.
    pub fn on_generation_complete(&mut self, coordinate: ChunkCoordinate, run: VoxelRun) {
        if self.loaded.contains_key(&coordinate) || !self.in_progress.remove(&coordinate) {
            tracing::trace!(chunk = %coordinate, "discarding stale generation result");
            return;
        }
        if run.volume() != self.dims.volume() {
            tracing::error!(
                chunk = %coordinate,
                volume = run.volume(),
                expected = self.dims.volume(),
                "generated chunk has the wrong volume"
            );
            debug_assert_eq!(run.volume(), self.dims.volume());
            return;
        }

        self.loaded.insert(coordinate, Chunk::new(coordinate, run));
        self.frontier.remove(&coordinate);
        for neighbor in coordinate.neighbors() {
            if !self.loaded.contains_key(&neighbor) {
                self.frontier.insert(neighbor);
            }
        }
        tracing::trace!(chunk = %coordinate, loaded = self.loaded.len(), "chunk loaded");

        self.drain_queues();

        self.request_mesh(coordinate);
        for neighbor in coordinate.neighbors() {
            if self.loaded.contains_key(&neighbor) {
                self.request_mesh(neighbor);
            }
        }
    }

    fn on_mesh_complete(&mut self, result: MeshingResult) {
        let MeshingResult {
            coordinate,
            ticket,
            geometry,
            mesh_time_us,
        } = result;
        if !self.tickets.accept(coordinate, ticket) {
            tracing::trace!(chunk = %coordinate, ticket, "discarding stale mesh");
            return;
        }
        tracing::trace!(
            chunk = %coordinate,
            quads = geometry.quad_count(),
            mesh_time_us,
            "mesh applied"
        );
        self.install_geometry(coordinate, geometry);
    }

    // -----------------------------------------------------------------------
    // Meshing
    // -----------------------------------------------------------------------

    /// Snapshot of `coordinate` and the touching layer of each neighbor.
    ///
    /// Only the center is expanded; neighbor layers are read from their runs.
    pub(crate) fn neighborhood(&self, coordinate: ChunkCoordinate) -> Option<ChunkNeighborhood> {
        let chunk = self.loaded.get(&coordinate)?;
        let mut neighborhood = ChunkNeighborhood::new(self.dims, chunk.run().to_flat());
        for direction in FaceDirection::ALL {
            let (dx, dy, dz) = direction.offset();
            let neighbor = coordinate.offset(dx, dy, dz);
            if !self.params.in_vertical_bounds(neighbor) {
                neighborhood.set_neighbor(direction, NeighborSlot::OutsideWorld);
            } else if let Some(chunk) = self.loaded.get(&neighbor) {
                neighborhood.set_run_neighbor(direction, chunk.run());
            }
        }
        Some(neighborhood)
    }

    /// Queues a background mesh, superseding any in-flight one.
    fn request_mesh(&mut self, coordinate: ChunkCoordinate) {
        let Some(neighborhood) = self.neighborhood(coordinate) else {
            return;
        };
        let ticket = self.tickets.issue(coordinate);
        let task = MeshingTask {
            coordinate,
            ticket,
            neighborhood,
        };
        if !self.meshing.submit(task) {
            tracing::warn!(chunk = %coordinate, "meshing pipeline is shut down");
            self.tickets.forget(coordinate);
        }
    }

    /// Meshes on the calling thread and installs the result right away. Any
    /// in-flight background mesh for the chunk becomes stale.
    pub(crate) fn remesh_now(&mut self, coordinate: ChunkCoordinate) {
        let Some(neighborhood) = self.neighborhood(coordinate) else {
            return;
        };
        let geometry = greedy_mesh(&neighborhood, self.params.resolution);
        let ticket = self.tickets.issue(coordinate);
        self.tickets.accept(coordinate, ticket);
        self.install_geometry(coordinate, geometry);
    }

    fn install_geometry(&mut self, coordinate: ChunkCoordinate, geometry: ChunkGeometry) {
        let Some(chunk) = self.loaded.get_mut(&coordinate) else {
            return;
        };
        if let Some(sink) = self.sink.as_mut() {
            sink.geometry_ready(coordinate, &geometry);
        }
        chunk.set_geometry(geometry);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
