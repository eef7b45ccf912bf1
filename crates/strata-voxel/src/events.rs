//! "An edit occurred" notifications.
//!
//! The chunk store writes a [`VoxelEditEvent`] for every point edit that
//! changes data and a [`VoxelBatchEditEvent`] per chunk touched by a range
//! edit. Collaborators (networking, audio, physics) read them from a
//! [`VoxelEventBuffer`], which keeps each event readable for two frames.

use crate::coords::ChunkCoordinate;
use crate::voxel::VoxelType;

/// A single voxel changed type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelEditEvent {
    /// The chunk containing the voxel.
    pub chunk: ChunkCoordinate,
    /// Local position inside the chunk.
    pub local: (u16, u16, u16),
    /// Type before the edit.
    pub old_type: VoxelType,
    /// Type after the edit.
    pub new_type: VoxelType,
}

/// A range edit wrote into one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelBatchEditEvent {
    /// The chunk that was modified.
    pub chunk: ChunkCoordinate,
    /// Type written into the range.
    pub new_type: VoxelType,
    /// Number of cells covered by the edit inside this chunk.
    pub cells: u32,
}

/// Double-buffered event storage.
///
/// Events written this frame are readable this frame and the next one. Call
/// [`swap`](Self::swap) once per frame.
#[derive(Debug, Default)]
pub struct VoxelEventBuffer {
    prev: Vec<VoxelEditEvent>,
    current: Vec<VoxelEditEvent>,
    batch_prev: Vec<VoxelBatchEditEvent>,
    batch_current: Vec<VoxelBatchEditEvent>,
}

impl VoxelEventBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a point edit.
    pub fn send(&mut self, event: VoxelEditEvent) {
        self.current.push(event);
    }

    /// Records a range edit.
    pub fn send_batch(&mut self, event: VoxelBatchEditEvent) {
        self.batch_current.push(event);
    }

    /// Readable point edits, oldest first.
    pub fn read(&self) -> impl Iterator<Item = &VoxelEditEvent> {
        self.prev.iter().chain(self.current.iter())
    }

    /// Readable range edits, oldest first.
    pub fn read_batch(&self) -> impl Iterator<Item = &VoxelBatchEditEvent> {
        self.batch_prev.iter().chain(self.batch_current.iter())
    }

    /// Number of readable point edits.
    pub fn len(&self) -> usize {
        self.prev.len() + self.current.len()
    }

    /// Returns `true` if no point edit is readable.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of readable range edits.
    pub fn batch_len(&self) -> usize {
        self.batch_prev.len() + self.batch_current.len()
    }

    /// Drops last frame's events and makes this frame's events the previous ones.
    pub fn swap(&mut self) {
        self.prev.clear();
        std::mem::swap(&mut self.prev, &mut self.current);
        self.batch_prev.clear();
        std::mem::swap(&mut self.batch_prev, &mut self.batch_current);
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.prev.clear();
        self.current.clear();
        self.batch_prev.clear();
        self.batch_current.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(x: u16) -> VoxelEditEvent {
        VoxelEditEvent {
            chunk: ChunkCoordinate::new(0, 0, 0),
            local: (x, 0, 0),
            old_type: VoxelType::Air,
            new_type: VoxelType::Stone,
        }
    }

    #[test]
    fn test_events_live_for_two_frames() {
        let mut events = VoxelEventBuffer::new();
        events.send(edit(1));
        assert_eq!(events.len(), 1);

        events.swap();
        assert_eq!(events.len(), 1);

        events.swap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_read_order_is_oldest_first() {
        let mut events = VoxelEventBuffer::new();
        events.send(edit(1));
        events.swap();
        events.send(edit(2));
        let xs: Vec<u16> = events.read().map(|e| e.local.0).collect();
        assert_eq!(xs, vec![1, 2]);
    }

    #[test]
    fn test_batch_events_are_separate() {
        let mut events = VoxelEventBuffer::new();
        events.send_batch(VoxelBatchEditEvent {
            chunk: ChunkCoordinate::new(1, 0, 0),
            new_type: VoxelType::Sand,
            cells: 12,
        });
        assert!(events.is_empty());
        assert_eq!(events.batch_len(), 1);
        assert_eq!(events.read_batch().next().map(|e| e.cells), Some(12));

        events.clear();
        assert_eq!(events.batch_len(), 0);
    }
}
