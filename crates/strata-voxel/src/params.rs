//! Per-world constants and the coordinate conversions that depend on them.
//!
//! Three spaces are in play:
//! - **world space**: `f32` units, what observers and edit requests use;
//! - **voxel space**: global integer voxel indices, `floor(world * resolution)`;
//! - **chunk space**: a [`ChunkCoordinate`] plus a local position inside it.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::coords::{ChunkCoordinate, ChunkDims};

/// Immutable configuration of one world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldParameters {
    /// Human-readable world name.
    pub name: String,
    /// Voxels per world unit.
    pub resolution: f32,
    /// Chunk extent along X and Z, in voxels.
    pub chunk_size: usize,
    /// Chunk extent along Y, in voxels.
    pub chunk_height: usize,
    /// Number of chunk layers; valid chunk Y coordinates are `0..world_height_chunks`.
    pub world_height_chunks: i32,
    /// Water surface height in world units.
    pub water_height: f32,
    /// Seed for every procedural layer.
    pub seed: u64,
}

impl Default for WorldParameters {
    fn default() -> Self {
        Self {
            name: "strata".to_string(),
            resolution: 1.0,
            chunk_size: 16,
            chunk_height: 16,
            world_height_chunks: 8,
            water_height: 24.0,
            seed: 42,
        }
    }
}

impl WorldParameters {
    /// Dimensions of every chunk in this world.
    pub fn dims(&self) -> ChunkDims {
        ChunkDims::new(self.chunk_size, self.chunk_height)
    }

    /// Total world height in voxels.
    pub fn world_height_voxels(&self) -> i32 {
        self.world_height_chunks * self.chunk_height as i32
    }

    /// Whether a chunk layer lies inside the world's vertical extent.
    pub fn in_vertical_bounds(&self, coord: ChunkCoordinate) -> bool {
        (0..self.world_height_chunks).contains(&coord.y)
    }

    /// Size of one voxel in world units.
    pub fn voxel_size(&self) -> f32 {
        1.0 / self.resolution
    }

    /// Global voxel containing a world-space point.
    pub fn world_to_voxel(&self, pos: Vec3) -> IVec3 {
        (pos * self.resolution).floor().as_ivec3()
    }

    /// World-space position of a voxel's minimum corner.
    pub fn voxel_to_world(&self, voxel: IVec3) -> Vec3 {
        voxel.as_vec3() / self.resolution
    }

    /// Splits a global voxel position into its chunk and local position.
    pub fn voxel_to_chunk(&self, voxel: IVec3) -> (ChunkCoordinate, (usize, usize, usize)) {
        let size = self.chunk_size as i32;
        let height = self.chunk_height as i32;
        let coord = ChunkCoordinate::new(
            voxel.x.div_euclid(size),
            voxel.y.div_euclid(height),
            voxel.z.div_euclid(size),
        );
        let local = (
            voxel.x.rem_euclid(size) as usize,
            voxel.y.rem_euclid(height) as usize,
            voxel.z.rem_euclid(size) as usize,
        );
        (coord, local)
    }

    /// Chunk containing a world-space point.
    pub fn world_to_chunk(&self, pos: Vec3) -> ChunkCoordinate {
        self.voxel_to_chunk(self.world_to_voxel(pos)).0
    }

    /// Global voxel position of a chunk's minimum corner.
    pub fn chunk_origin_voxel(&self, coord: ChunkCoordinate) -> IVec3 {
        IVec3::new(
            coord.x * self.chunk_size as i32,
            coord.y * self.chunk_height as i32,
            coord.z * self.chunk_size as i32,
        )
    }

    /// World-space position of a chunk's minimum corner.
    pub fn chunk_origin_world(&self, coord: ChunkCoordinate) -> Vec3 {
        self.voxel_to_world(self.chunk_origin_voxel(coord))
    }
}
