//! Voxel values, run-length-encoded chunk storage, chunk coordinates, world
//! parameters, and edit notifications.

pub mod coords;
pub mod events;
pub mod params;
pub mod run;
pub mod voxel;

pub use coords::{ChunkCoordinate, ChunkDims};
pub use events::{VoxelBatchEditEvent, VoxelEditEvent, VoxelEventBuffer};
pub use params::WorldParameters;
pub use run::{Run, VoxelRun, VoxelRunError, to_flat_buffer};
pub use voxel::{Voxel, VoxelAttributes, VoxelType};
