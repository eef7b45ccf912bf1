//! The six face directions of a voxel.

/// One of the six directions a voxel face can point.
///
/// Discriminant order matches [`strata_voxel::ChunkCoordinate::NEIGHBOR_OFFSETS`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FaceDirection {
    /// +X direction.
    PosX = 0,
    /// −X direction.
    NegX = 1,
    /// +Y direction.
    PosY = 2,
    /// −Y direction.
    NegY = 3,
    /// +Z direction.
    PosZ = 4,
    /// −Z direction.
    NegZ = 5,
}

impl FaceDirection {
    /// All six directions in order.
    pub const ALL: [FaceDirection; 6] = [
        Self::PosX,
        Self::NegX,
        Self::PosY,
        Self::NegY,
        Self::PosZ,
        Self::NegZ,
    ];

    /// The direction along `axis` (0 = X, 1 = Y, 2 = Z) with the given sign.
    pub fn from_axis(axis: usize, positive: bool) -> Self {
        match (axis, positive) {
            (0, true) => Self::PosX,
            (0, false) => Self::NegX,
            (1, true) => Self::PosY,
            (1, false) => Self::NegY,
            (_, true) => Self::PosZ,
            (_, false) => Self::NegZ,
        }
    }

    /// The axis this direction runs along.
    pub fn axis(self) -> usize {
        self.index() / 2
    }

    /// Whether this direction points towards increasing coordinates.
    pub fn is_positive(self) -> bool {
        self.index() % 2 == 0
    }

    /// Returns the sweep axes `(layer_axis, u_axis, v_axis)`.
    ///
    /// `u = (layer + 1) % 3` and `v = (layer + 2) % 3`, so `u × v` points along
    /// the positive layer axis.
    pub fn sweep_axes(self) -> (usize, usize, usize) {
        let d = self.axis();
        (d, (d + 1) % 3, (d + 2) % 3)
    }

    /// Returns the unit normal.
    pub fn normal(self) -> [f32; 3] {
        let mut n = [0.0; 3];
        n[self.axis()] = if self.is_positive() { 1.0 } else { -1.0 };
        n
    }

    /// Unit chunk-grid offset towards the neighbor on this side.
    pub fn offset(self) -> (i32, i32, i32) {
        strata_voxel::ChunkCoordinate::NEIGHBOR_OFFSETS[self.index()]
    }

    /// Returns the opposite face direction.
    pub fn opposite(self) -> Self {
        Self::from_axis(self.axis(), !self.is_positive())
    }

    /// Returns the direction index (0–5).
    pub fn index(self) -> usize {
        self as usize
    }
}
