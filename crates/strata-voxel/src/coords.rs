//! Chunk-grid coordinates and the per-chunk flattening order.

use serde::{Deserialize, Serialize};

/// Identifies a chunk's position in chunk-grid space (not world units).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkCoordinate {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Y coordinate (vertical).
    pub y: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
}

impl ChunkCoordinate {
    /// The six face-adjacent unit offsets, in `+X, -X, +Y, -Y, +Z, -Z` order.
    pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); 6] = [
        (1, 0, 0),
        (-1, 0, 0),
        (0, 1, 0),
        (0, -1, 0),
        (0, 0, 1),
        (0, 0, -1),
    ];

    /// Creates a new chunk coordinate.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinate offset by `(dx, dy, dz)`.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Returns the six face-adjacent coordinates in [`Self::NEIGHBOR_OFFSETS`] order.
    pub fn neighbors(self) -> [Self; 6] {
        Self::NEIGHBOR_OFFSETS.map(|(dx, dy, dz)| self.offset(dx, dy, dz))
    }

    /// Squared Euclidean distance in chunk units.
    pub fn distance_sq(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance in chunk units.
    pub fn distance(self, other: Self) -> f32 {
        (self.distance_sq(other) as f64).sqrt() as f32
    }
}

impl std::fmt::Display for ChunkCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Horizontal size and vertical height of a chunk, in voxels.
///
/// Chunks are `size × height × size`. The flat index of a local position is
/// `(x * height + y) * size + z`: x is the outermost axis and z varies fastest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkDims {
    /// Extent along X and Z.
    pub size: usize,
    /// Extent along Y.
    pub height: usize,
}

impl ChunkDims {
    /// Creates a new set of chunk dimensions.
    pub const fn new(size: usize, height: usize) -> Self {
        Self { size, height }
    }

    /// Total number of voxels in one chunk.
    pub const fn volume(self) -> usize {
        self.size * self.height * self.size
    }

    /// Extent along axis `0 = X`, `1 = Y`, `2 = Z`.
    pub const fn extent(self, axis: usize) -> usize {
        if axis == 1 { self.height } else { self.size }
    }

    /// Flat index of a local position.
    #[inline]
    pub fn index(self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(self.contains(x, y, z), "({x}, {y}, {z}) outside {self:?}");
        (x * self.height + y) * self.size + z
    }

    /// Inverse of [`index`](Self::index).
    pub fn position(self, index: usize) -> (usize, usize, usize) {
        let z = index % self.size;
        let rest = index / self.size;
        (rest / self.height, rest % self.height, z)
    }

    /// Whether a local position lies inside the chunk.
    pub fn contains(self, x: usize, y: usize, z: usize) -> bool {
        x < self.size && y < self.height && z < self.size
    }
}
