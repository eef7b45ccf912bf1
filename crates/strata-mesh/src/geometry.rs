//! Geometry buffer produced by meshing: positions, quad indices and colors.

use strata_voxel::VoxelType;

use crate::face_direction::FaceDirection;

/// Metadata for one emitted quad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuadInfo {
    /// Which way the quad faces.
    pub direction: FaceDirection,
    /// Voxel type the quad was cut from.
    pub voxel_type: VoxelType,
    /// Extent along the direction's u axis, in voxels.
    pub width: u32,
    /// Extent along the direction's v axis, in voxels.
    pub height: u32,
}

/// Renderable surface of one chunk.
///
/// Every quad owns four consecutive vertices and four consecutive colors;
/// `quad_indices` lists those four vertices in front-facing winding order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkGeometry {
    /// Chunk-local positions in world units.
    pub vertices: Vec<[f32; 3]>,
    /// Four indices per quad.
    pub quad_indices: Vec<u32>,
    /// One RGBA color per vertex.
    pub colors: Vec<[f32; 4]>,
    /// One entry per quad.
    pub quads: Vec<QuadInfo>,
}

impl ChunkGeometry {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a quad whose `corners` are already in front-facing order.
    pub fn push_quad(&mut self, corners: [[f32; 3]; 4], info: QuadInfo) {
        let base = self.vertices.len() as u32;
        let color = info.voxel_type.attributes().color;
        self.vertices.extend_from_slice(&corners);
        self.colors.extend_from_slice(&[color; 4]);
        self.quad_indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 3]);
        self.quads.push(info);
    }

    /// Returns `true` if no quads were emitted.
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Total number of quads.
    pub fn quad_count(&self) -> usize {
        self.quads.len()
    }

    /// Number of quads facing `direction`.
    pub fn count_quads_for_direction(&self, direction: FaceDirection) -> usize {
        self.quads
            .iter()
            .filter(|q| q.direction == direction)
            .count()
    }

    /// Splits each quad `(a, b, c, d)` into triangles `(a, b, c)` and `(a, c, d)`,
    /// preserving winding.
    pub fn triangle_indices(&self) -> Vec<u32> {
        self.quad_indices
            .chunks_exact(4)
            .flat_map(|q| [q[0], q[1], q[2], q[0], q[2], q[3]])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(direction: FaceDirection) -> QuadInfo {
        QuadInfo {
            direction,
            voxel_type: VoxelType::Stone,
            width: 1,
            height: 1,
        }
    }

    const UNIT: [[f32; 3]; 4] = [
        [0.0, 1.0, 0.0],
        [0.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, 0.0],
    ];

    #[test]
    fn test_empty_geometry() {
        let g = ChunkGeometry::new();
        assert!(g.is_empty());
        assert!(g.vertices.is_empty());
        assert!(g.triangle_indices().is_empty());
    }

    #[test]
    fn test_push_quad_parallel_buffers() {
        let mut g = ChunkGeometry::new();
        g.push_quad(UNIT, info(FaceDirection::PosY));
        g.push_quad(UNIT, info(FaceDirection::PosY));
        assert_eq!(g.vertices.len(), 8);
        assert_eq!(g.colors.len(), 8);
        assert_eq!(g.quad_indices, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(g.colors[5], VoxelType::Stone.attributes().color);
    }

    #[test]
    fn test_triangle_indices() {
        let mut g = ChunkGeometry::new();
        g.push_quad(UNIT, info(FaceDirection::PosY));
        assert_eq!(g.triangle_indices(), vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_count_quads_by_direction() {
        let mut g = ChunkGeometry::new();
        g.push_quad(UNIT, info(FaceDirection::PosY));
        g.push_quad(UNIT, info(FaceDirection::PosY));
        g.push_quad(UNIT, info(FaceDirection::NegY));
        assert_eq!(g.count_quads_for_direction(FaceDirection::PosY), 2);
        assert_eq!(g.count_quads_for_direction(FaceDirection::NegY), 1);
        assert_eq!(g.count_quads_for_direction(FaceDirection::PosX), 0);
    }
}
