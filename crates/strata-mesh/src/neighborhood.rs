//! Owned snapshot of a chunk and the boundary layers of its six neighbors.
//!
//! [`ChunkNeighborhood`] is everything the mesher needs, detached from the
//! chunk store so it can be sent to a worker thread.

use strata_voxel::{ChunkDims, Voxel, VoxelRun};

use crate::face_direction::FaceDirection;

// ---------------------------------------------------------------------------
// Boundary slices
// ---------------------------------------------------------------------------

/// One layer of voxels from a neighbor, the layer touching the center chunk.
///
/// Indexed by the `(u, v)` sweep axes of the face direction it sits on.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundarySlice {
    data: Vec<Voxel>,
    u_len: usize,
}

impl BoundarySlice {
    /// Number of voxels in the slice.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the slice holds no voxels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Voxel at slice coordinates `(u, v)`.
    pub fn get(&self, u: usize, v: usize) -> Voxel {
        self.data[v * self.u_len + u]
    }
}

/// Extracts the outermost layer of a chunk on its `face` side.
///
/// `PosX` yields the layer at `x = size - 1`, `NegX` the layer at `x = 0`.
pub fn extract_boundary_slice(
    flat: &[Voxel],
    dims: ChunkDims,
    face: FaceDirection,
) -> BoundarySlice {
    let (indices, u_len) = boundary_indices(dims, face);
    let data = indices.into_iter().map(|i| flat[i]).collect();
    BoundarySlice { data, u_len }
}

/// Same layer as [`extract_boundary_slice`], read straight from a run list in
/// one pass over its runs.
pub fn extract_boundary_slice_from_run(
    run: &VoxelRun,
    dims: ChunkDims,
    face: FaceDirection,
) -> BoundarySlice {
    let (indices, u_len) = boundary_indices(dims, face);
    let mut cells: Vec<(usize, usize)> = indices
        .into_iter()
        .enumerate()
        .map(|(slot, index)| (index, slot))
        .collect();
    cells.sort_unstable();

    let mut data = vec![Voxel::AIR; cells.len()];
    let mut runs = run.runs().iter();
    let mut current = None;
    let mut run_end = 0usize;
    for (index, slot) in cells {
        while index >= run_end {
            let Some(next) = runs.next() else {
                current = None;
                break;
            };
            current = Some(next.voxel);
            run_end += next.length as usize;
        }
        if let Some(voxel) = current {
            data[slot] = voxel;
        }
    }
    BoundarySlice { data, u_len }
}

/// Flat indices of the `face` layer in `(v, u)` row order, plus the row length.
fn boundary_indices(dims: ChunkDims, face: FaceDirection) -> (Vec<usize>, usize) {
    let (layer_axis, u_axis, v_axis) = face.sweep_axes();
    let layer = if face.is_positive() {
        dims.extent(layer_axis) - 1
    } else {
        0
    };
    let u_len = dims.extent(u_axis);
    let v_len = dims.extent(v_axis);

    let mut indices = Vec::with_capacity(u_len * v_len);
    let mut pos = [0usize; 3];
    pos[layer_axis] = layer;
    for v in 0..v_len {
        pos[v_axis] = v;
        for u in 0..u_len {
            pos[u_axis] = u;
            indices.push(dims.index(pos[0], pos[1], pos[2]));
        }
    }
    (indices, u_len)
}

// ---------------------------------------------------------------------------
// Neighbor slots
// ---------------------------------------------------------------------------

/// What lies beyond one face of the center chunk.
#[derive(Clone, Debug, PartialEq)]
pub enum NeighborSlot {
    /// A loaded neighbor; its touching layer.
    Loaded(BoundarySlice),
    /// Not loaded yet. Faces on this side are suppressed.
    Missing,
    /// Above or below the world. Treated as air.
    OutsideWorld,
}

// ---------------------------------------------------------------------------
// ChunkNeighborhood
// ---------------------------------------------------------------------------

/// A chunk's dense voxel buffer plus one [`NeighborSlot`] per face.
#[derive(Clone, Debug)]
pub struct ChunkNeighborhood {
    dims: ChunkDims,
    center: Vec<Voxel>,
    neighbors: [NeighborSlot; 6],
}

impl ChunkNeighborhood {
    /// Wraps a dense center buffer with every neighbor [`NeighborSlot::Missing`].
    pub fn new(dims: ChunkDims, center: Vec<Voxel>) -> Self {
        debug_assert_eq!(center.len(), dims.volume());
        Self {
            dims,
            center,
            neighbors: std::array::from_fn(|_| NeighborSlot::Missing),
        }
    }

    /// Wraps a dense center buffer surrounded by air on every side.
    pub fn isolated(dims: ChunkDims, center: Vec<Voxel>) -> Self {
        let mut n = Self::new(dims, center);
        n.neighbors = std::array::from_fn(|_| NeighborSlot::OutsideWorld);
        n
    }

    /// Sets the slot on the `direction` side.
    pub fn set_neighbor(&mut self, direction: FaceDirection, slot: NeighborSlot) {
        self.neighbors[direction.index()] = slot;
    }

    /// Sets the `direction` neighbor from its dense buffer, keeping only the
    /// layer that touches the center.
    pub fn set_face_neighbor(&mut self, direction: FaceDirection, neighbor_flat: &[Voxel]) {
        let slice = extract_boundary_slice(neighbor_flat, self.dims, direction.opposite());
        self.neighbors[direction.index()] = NeighborSlot::Loaded(slice);
    }

    /// Sets the `direction` neighbor from its run list without expanding it.
    pub fn set_run_neighbor(&mut self, direction: FaceDirection, neighbor: &VoxelRun) {
        let slice = extract_boundary_slice_from_run(neighbor, self.dims, direction.opposite());
        self.neighbors[direction.index()] = NeighborSlot::Loaded(slice);
    }

    /// The slot on the `direction` side.
    pub fn neighbor(&self, direction: FaceDirection) -> &NeighborSlot {
        &self.neighbors[direction.index()]
    }

    /// Chunk dimensions.
    pub fn dims(&self) -> ChunkDims {
        self.dims
    }

    /// The center chunk's dense buffer.
    pub fn center(&self) -> &[Voxel] {
        &self.center
    }

    /// Voxel inside the center chunk.
    pub fn get_center(&self, x: usize, y: usize, z: usize) -> Voxel {
        self.center[self.dims.index(x, y, z)]
    }

    /// Voxel just beyond the `direction` face at sweep coordinates `(u, v)`,
    /// or `None` when that neighbor is missing.
    pub fn beyond(&self, direction: FaceDirection, u: usize, v: usize) -> Option<Voxel> {
        match &self.neighbors[direction.index()] {
            NeighborSlot::Loaded(slice) => Some(slice.get(u, v)),
            NeighborSlot::Missing => None,
            NeighborSlot::OutsideWorld => Some(Voxel::AIR),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use strata_voxel::VoxelType;

    use super::*;

    fn dims() -> ChunkDims {
        ChunkDims::new(4, 6)
    }

    /// A buffer whose voxel type encodes which boundary a cell lies on.
    fn marked_buffer() -> Vec<Voxel> {
        let d = dims();
        let mut flat = vec![Voxel::AIR; d.volume()];
        for y in 0..d.height {
            for z in 0..d.size {
                flat[d.index(d.size - 1, y, z)] = Voxel::new(VoxelType::Stone);
                flat[d.index(0, y, z)] = Voxel::new(VoxelType::Dirt);
            }
        }
        flat
    }

    #[test]
    fn test_slice_dimensions_follow_sweep_axes() {
        let flat = marked_buffer();
        // PosX: u = Y (6), v = Z (4)
        let slice = extract_boundary_slice(&flat, dims(), FaceDirection::PosX);
        assert_eq!(slice.len(), 24);
        assert_eq!(slice.get(5, 3).voxel_type, VoxelType::Stone);
        // PosY: u = Z (4), v = X (4)
        let top = extract_boundary_slice(&flat, dims(), FaceDirection::PosY);
        assert_eq!(top.len(), 16);
        assert_eq!(top.get(0, 3).voxel_type, VoxelType::Stone);
        assert_eq!(top.get(0, 0).voxel_type, VoxelType::Dirt);
    }

    #[test]
    fn test_face_neighbor_uses_opposite_layer() {
        let mut n = ChunkNeighborhood::new(dims(), vec![Voxel::AIR; dims().volume()]);
        // The +X neighbor touches us with its x = 0 layer (dirt).
        n.set_face_neighbor(FaceDirection::PosX, &marked_buffer());
        assert_eq!(
            n.beyond(FaceDirection::PosX, 2, 1).map(|v| v.voxel_type),
            Some(VoxelType::Dirt)
        );
        n.set_face_neighbor(FaceDirection::NegX, &marked_buffer());
        assert_eq!(
            n.beyond(FaceDirection::NegX, 2, 1).map(|v| v.voxel_type),
            Some(VoxelType::Stone)
        );
    }

    #[test]
    fn test_run_slice_matches_flat_slice() {
        let mut flat = marked_buffer();
        let d = dims();
        flat[d.index(1, 2, 3)] = Voxel::new(VoxelType::Grass);
        flat[d.index(2, 5, 0)] = Voxel::new(VoxelType::Wood);
        let run = VoxelRun::from_flat(&flat);
        for face in FaceDirection::ALL {
            assert_eq!(
                extract_boundary_slice_from_run(&run, d, face),
                extract_boundary_slice(&flat, d, face),
                "{face:?}"
            );
        }

        let mut a = ChunkNeighborhood::new(d, vec![Voxel::AIR; d.volume()]);
        let mut b = a.clone();
        a.set_face_neighbor(FaceDirection::NegZ, &flat);
        b.set_run_neighbor(FaceDirection::NegZ, &run);
        assert_eq!(a.neighbor(FaceDirection::NegZ), b.neighbor(FaceDirection::NegZ));
    }

    #[test]
    fn test_slot_semantics() {
        let mut n = ChunkNeighborhood::new(dims(), vec![Voxel::AIR; dims().volume()]);
        assert_eq!(n.beyond(FaceDirection::PosY, 0, 0), None);
        n.set_neighbor(FaceDirection::PosY, NeighborSlot::OutsideWorld);
        assert_eq!(n.beyond(FaceDirection::PosY, 0, 0), Some(Voxel::AIR));

        let iso = ChunkNeighborhood::isolated(dims(), vec![Voxel::AIR; dims().volume()]);
        for dir in FaceDirection::ALL {
            assert_eq!(iso.neighbor(dir), &NeighborSlot::OutsideWorld);
        }
    }
}
