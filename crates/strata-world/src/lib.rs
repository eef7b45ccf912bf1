//! The chunk store: streams chunks around observers, drives background
//! generation and meshing, and applies edits.
//!
//! A single control thread owns a [`ChunkStore`] and calls
//! [`ChunkStore::tick`] once per frame. Worker threads only ever see owned
//! snapshots and hand results back over channels.

pub mod chunk;
pub mod edit;
pub mod observer;
pub mod store;

pub use chunk::{Chunk, GeometrySink};
pub use observer::{Observer, ObserverId};
pub use store::{ChunkStore, StoreStats};
