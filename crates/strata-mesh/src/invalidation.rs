//! Which chunks need remeshing after an edit, and which mesh results are
//! still wanted when they come back.

use rustc_hash::{FxHashMap, FxHashSet};
use strata_voxel::{ChunkCoordinate, ChunkDims};

use crate::face_direction::FaceDirection;

/// Latest mesh request per chunk.
///
/// Every request gets a fresh ticket; a result is accepted only if its ticket
/// is still the latest one for its chunk. Issuing a new ticket therefore
/// supersedes every older request for the same chunk.
#[derive(Debug, Default)]
pub struct MeshTickets {
    next: u64,
    latest: FxHashMap<ChunkCoordinate, u64>,
}

impl MeshTickets {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket for `coordinate`, superseding any outstanding one.
    pub fn issue(&mut self, coordinate: ChunkCoordinate) -> u64 {
        self.next += 1;
        self.latest.insert(coordinate, self.next);
        self.next
    }

    /// Accepts a result if `ticket` is the latest for `coordinate`, retiring it.
    pub fn accept(&mut self, coordinate: ChunkCoordinate, ticket: u64) -> bool {
        if self.latest.get(&coordinate) == Some(&ticket) {
            self.latest.remove(&coordinate);
            true
        } else {
            false
        }
    }

    /// Whether a request for `coordinate` is outstanding.
    pub fn is_pending(&self, coordinate: ChunkCoordinate) -> bool {
        self.latest.contains_key(&coordinate)
    }

    /// Drops any outstanding request, so its result will be discarded.
    pub fn forget(&mut self, coordinate: ChunkCoordinate) {
        self.latest.remove(&coordinate);
    }

    /// Number of outstanding requests.
    pub fn pending_count(&self) -> usize {
        self.latest.len()
    }
}

/// Determines which chunks need remeshing after a voxel edit.
pub struct MeshInvalidator;

impl MeshInvalidator {
    /// Chunks affected by an edit at `local` inside `edited`.
    ///
    /// The edited chunk is always first. A face neighbor is added when the
    /// edit lies on the shared boundary, because the neighbor's boundary faces
    /// depend on the edited voxel.
    pub fn invalidate(
        edited: ChunkCoordinate,
        local: (usize, usize, usize),
        dims: ChunkDims,
    ) -> Vec<ChunkCoordinate> {
        let mut dirty = vec![edited];
        let pos = [local.0, local.1, local.2];
        for dir in FaceDirection::ALL {
            let axis = dir.axis();
            let edge = if dir.is_positive() {
                dims.extent(axis) - 1
            } else {
                0
            };
            if pos[axis] == edge {
                let (dx, dy, dz) = dir.offset();
                dirty.push(edited.offset(dx, dy, dz));
            }
        }
        dirty
    }

    /// Chunks affected by edits in the local box `min..=max` inside `edited`,
    /// merged into `dirty`.
    pub fn invalidate_box(
        edited: ChunkCoordinate,
        min: (usize, usize, usize),
        max: (usize, usize, usize),
        dims: ChunkDims,
        dirty: &mut FxHashSet<ChunkCoordinate>,
    ) {
        dirty.insert(edited);
        let lo = [min.0, min.1, min.2];
        let hi = [max.0, max.1, max.2];
        for dir in FaceDirection::ALL {
            let axis = dir.axis();
            let touches = if dir.is_positive() {
                hi[axis] == dims.extent(axis) - 1
            } else {
                lo[axis] == 0
            };
            if touches {
                let (dx, dy, dz) = dir.offset();
                dirty.insert(edited.offset(dx, dy, dz));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIMS: ChunkDims = ChunkDims::new(16, 32);

    fn origin() -> ChunkCoordinate {
        ChunkCoordinate::new(0, 0, 0)
    }

    #[test]
    fn test_interior_edit_only_dirties_self() {
        let dirty = MeshInvalidator::invalidate(origin(), (8, 8, 8), DIMS);
        assert_eq!(dirty, vec![origin()]);
    }

    #[test]
    fn test_boundary_edit_dirties_neighbor() {
        let dirty = MeshInvalidator::invalidate(origin(), (0, 8, 8), DIMS);
        assert!(dirty.contains(&ChunkCoordinate::new(-1, 0, 0)));

        // Height differs from size: y = 31 is the top layer, y = 15 is not.
        let top = MeshInvalidator::invalidate(origin(), (8, 31, 8), DIMS);
        assert!(top.contains(&ChunkCoordinate::new(0, 1, 0)));
        let mid = MeshInvalidator::invalidate(origin(), (8, 15, 8), DIMS);
        assert_eq!(mid.len(), 1);
    }

    #[test]
    fn test_corner_edit_dirties_three_neighbors() {
        let dirty = MeshInvalidator::invalidate(origin(), (15, 0, 15), DIMS);
        assert_eq!(dirty.len(), 4);
        assert!(dirty.contains(&ChunkCoordinate::new(1, 0, 0)));
        assert!(dirty.contains(&ChunkCoordinate::new(0, -1, 0)));
        assert!(dirty.contains(&ChunkCoordinate::new(0, 0, 1)));
    }

    #[test]
    fn test_box_spanning_whole_chunk_dirties_all_faces() {
        let mut dirty = FxHashSet::default();
        MeshInvalidator::invalidate_box(origin(), (0, 0, 0), (15, 31, 15), DIMS, &mut dirty);
        assert_eq!(dirty.len(), 7);
    }

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let mut tickets = MeshTickets::new();
        let c = origin();
        let first = tickets.issue(c);
        let second = tickets.issue(c);
        assert!(second > first);
        assert!(!tickets.accept(c, first));
        assert!(tickets.is_pending(c));
        assert!(tickets.accept(c, second));
        assert!(!tickets.is_pending(c));
        // Already retired.
        assert!(!tickets.accept(c, second));
    }

    #[test]
    fn test_forget_discards_outstanding_result() {
        let mut tickets = MeshTickets::new();
        let c = ChunkCoordinate::new(1, 2, 3);
        let t = tickets.issue(c);
        tickets.forget(c);
        assert!(!tickets.accept(c, t));
        assert_eq!(tickets.pending_count(), 0);
    }
}
