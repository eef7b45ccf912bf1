//! Entities whose position drives loading and unloading.

use strata_voxel::ChunkCoordinate;

/// Caller-chosen identifier for an observer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

/// An observer's chunk position and streaming radii, in chunk units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observer {
    /// Chunk the observer is in.
    pub chunk: ChunkCoordinate,
    /// Chunks strictly closer than this are loaded.
    pub load_radius: f32,
    /// Chunks strictly farther than this are unloaded.
    pub unload_radius: f32,
}

impl Observer {
    /// `coordinate` is close enough to be requested (strictly inside the
    /// load radius).
    pub fn wants_loaded(&self, coordinate: ChunkCoordinate) -> bool {
        coordinate.distance(self.chunk) < self.load_radius
    }

    /// `coordinate` is far enough to be dropped (strictly outside the unload
    /// radius).
    pub fn wants_unloaded(&self, coordinate: ChunkCoordinate) -> bool {
        coordinate.distance(self.chunk) > self.unload_radius
    }
}
