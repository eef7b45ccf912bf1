//! Chunk meshing: neighborhood snapshots, greedy meshing into a
//! vertex/quad/color buffer, remesh invalidation, and the meshing worker pool.

pub mod async_mesh;
pub mod face_direction;
pub mod geometry;
pub mod greedy;
pub mod invalidation;
pub mod neighborhood;

pub use async_mesh::{MeshingPipeline, MeshingResult, MeshingTask};
pub use face_direction::FaceDirection;
pub use geometry::{ChunkGeometry, QuadInfo};
pub use greedy::greedy_mesh;
pub use invalidation::{MeshInvalidator, MeshTickets};
pub use neighborhood::{
    BoundarySlice, ChunkNeighborhood, NeighborSlot, extract_boundary_slice,
    extract_boundary_slice_from_run,
};
