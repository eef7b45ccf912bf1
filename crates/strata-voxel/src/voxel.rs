//! Voxel types and their static attribute table.
//!
//! [`VoxelType`] is a closed set. Air is discriminant 0 so that a zeroed mask
//! cell or a default voxel is always empty space.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Every kind of voxel the world can contain.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VoxelType {
    /// Empty space.
    #[default]
    Air = 0,
    /// Default ground cover.
    Grass = 1,
    /// Soil.
    Dirt = 2,
    /// Rock.
    Stone = 3,
    /// Beach and desert ground.
    Sand = 4,
    /// Snow cover.
    Snow = 5,
    /// Tree trunks and planks.
    Wood = 6,
    /// Foliage.
    Leaves = 7,
    /// Clear glass.
    Glass = 8,
    /// Still water.
    WaterSource = 9,
}

/// Static per-type data: display name, face color, and physical flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoxelAttributes {
    /// Lowercase name, matching the serde representation.
    pub name: &'static str,
    /// Linear RGBA color used for every face of this type.
    pub color: [f32; 4],
    /// Whether entities collide with this voxel and column-height queries
    /// stop on it.
    pub solid: bool,
    /// Whether light and sight pass (partially) through.
    pub transparent: bool,
}

const ATTRIBUTES: [VoxelAttributes; VoxelType::COUNT] = [
    VoxelAttributes {
        name: "air",
        color: [0.0, 0.0, 0.0, 0.0],
        solid: false,
        transparent: true,
    },
    VoxelAttributes {
        name: "grass",
        color: [0.33, 0.62, 0.24, 1.0],
        solid: true,
        transparent: false,
    },
    VoxelAttributes {
        name: "dirt",
        color: [0.47, 0.33, 0.21, 1.0],
        solid: true,
        transparent: false,
    },
    VoxelAttributes {
        name: "stone",
        color: [0.5, 0.5, 0.52, 1.0],
        solid: true,
        transparent: false,
    },
    VoxelAttributes {
        name: "sand",
        color: [0.86, 0.8, 0.55, 1.0],
        solid: true,
        transparent: false,
    },
    VoxelAttributes {
        name: "snow",
        color: [0.95, 0.96, 0.98, 1.0],
        solid: true,
        transparent: false,
    },
    VoxelAttributes {
        name: "wood",
        color: [0.4, 0.27, 0.14, 1.0],
        solid: true,
        transparent: false,
    },
    VoxelAttributes {
        name: "leaves",
        color: [0.2, 0.5, 0.16, 0.9],
        solid: true,
        transparent: true,
    },
    VoxelAttributes {
        name: "glass",
        color: [0.8, 0.9, 0.95, 0.3],
        solid: true,
        transparent: true,
    },
    VoxelAttributes {
        name: "water_source",
        color: [0.15, 0.35, 0.8, 0.6],
        solid: false,
        transparent: true,
    },
];

impl VoxelType {
    /// Number of variants.
    pub const COUNT: usize = 10;

    /// All variants in discriminant order.
    pub const ALL: [VoxelType; Self::COUNT] = [
        Self::Air,
        Self::Grass,
        Self::Dirt,
        Self::Stone,
        Self::Sand,
        Self::Snow,
        Self::Wood,
        Self::Leaves,
        Self::Glass,
        Self::WaterSource,
    ];

    /// Returns the attribute row for this type.
    pub fn attributes(self) -> &'static VoxelAttributes {
        &ATTRIBUTES[self as usize]
    }

    /// Returns `true` for [`VoxelType::Air`].
    pub fn is_air(self) -> bool {
        self == Self::Air
    }

    /// Converts a raw discriminant back into a type.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Looks a type up by its lowercase name (`"stone"`, `"water_source"`).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.attributes().name == name)
    }
}

impl std::fmt::Display for VoxelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.attributes().name)
    }
}

impl std::str::FromStr for VoxelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("unknown voxel type: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Voxel
// ---------------------------------------------------------------------------

/// A single cell of the world.
///
/// Equality compares [`voxel_type`](Self::voxel_type) only; the transparency
/// flag rides along but never splits or joins runs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Voxel {
    /// What the cell is made of.
    pub voxel_type: VoxelType,
    /// Whether the cell lets light through.
    pub has_transparency: bool,
}

impl Voxel {
    /// Empty space.
    pub const AIR: Voxel = Voxel {
        voxel_type: VoxelType::Air,
        has_transparency: true,
    };

    /// Creates a voxel of the given type with transparency from the attribute table.
    pub fn new(voxel_type: VoxelType) -> Self {
        Self {
            voxel_type,
            has_transparency: voxel_type.attributes().transparent,
        }
    }

    /// Returns `true` if this voxel is air.
    pub fn is_air(&self) -> bool {
        self.voxel_type.is_air()
    }

    /// Returns `true` if this voxel is solid for collision and height queries.
    pub fn is_solid(&self) -> bool {
        self.voxel_type.attributes().solid
    }
}

impl PartialEq for Voxel {
    fn eq(&self, other: &Self) -> bool {
        self.voxel_type == other.voxel_type
    }
}

impl Eq for Voxel {}

impl Default for Voxel {
    fn default() -> Self {
        Self::AIR
    }
}

impl From<VoxelType> for Voxel {
    fn from(voxel_type: VoxelType) -> Self {
        Self::new(voxel_type)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
