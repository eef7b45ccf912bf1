//! A loaded chunk and the geometry output seam.

use strata_mesh::ChunkGeometry;
use strata_voxel::{ChunkCoordinate, VoxelRun};

/// A loaded chunk: its voxel data and the latest accepted geometry.
#[derive(Debug)]
pub struct Chunk {
    coordinate: ChunkCoordinate,
    run: VoxelRun,
    geometry: Option<ChunkGeometry>,
    version: u64,
}

impl Chunk {
    /// Wraps freshly generated contents. No geometry yet.
    pub fn new(coordinate: ChunkCoordinate, run: VoxelRun) -> Self {
        Self {
            coordinate,
            run,
            geometry: None,
            version: 0,
        }
    }

    /// Where the chunk sits in the chunk grid.
    pub fn coordinate(&self) -> ChunkCoordinate {
        self.coordinate
    }

    /// The chunk's voxel data.
    pub fn run(&self) -> &VoxelRun {
        &self.run
    }

    /// Mutable voxel data. Callers bump the version with
    /// [`mark_modified`](Self::mark_modified) when they change it.
    pub fn run_mut(&mut self) -> &mut VoxelRun {
        &mut self.run
    }

    /// Latest accepted geometry, if any mesh has landed.
    pub fn geometry(&self) -> Option<&ChunkGeometry> {
        self.geometry.as_ref()
    }

    /// Replaces the stored geometry.
    pub fn set_geometry(&mut self, geometry: ChunkGeometry) {
        self.geometry = Some(geometry);
    }

    /// Edit counter; zero for untouched generated data.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Bumps the edit counter after the run changed.
    pub fn mark_modified(&mut self) {
        self.version += 1;
    }

    /// Coordinates of the six face neighbors. Lookups go through the store.
    pub fn neighbor_coordinates(&self) -> [ChunkCoordinate; 6] {
        self.coordinate.neighbors()
    }
}

/// Receives geometry as chunks are meshed and unloaded.
///
/// Any `FnMut(ChunkCoordinate, &ChunkGeometry)` closure is a sink that ignores
/// unloads.
pub trait GeometrySink: Send {
    /// New geometry for `coordinate` replaces whatever was there.
    fn geometry_ready(&mut self, coordinate: ChunkCoordinate, geometry: &ChunkGeometry);

    /// `coordinate` left memory; drop its geometry.
    fn chunk_unloaded(&mut self, _coordinate: ChunkCoordinate) {}
}

impl<F> GeometrySink for F
where
    F: FnMut(ChunkCoordinate, &ChunkGeometry) + Send,
{
    fn geometry_ready(&mut self, coordinate: ChunkCoordinate, geometry: &ChunkGeometry) {
        self(coordinate, geometry)
    }
}
