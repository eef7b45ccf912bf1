//! Procedural chunk contents from two remapped noise layers.
//!
//! For every `(x, z)` column the continentalness and erosion fields are
//! sampled, each is pushed through its spline, and the product is the column's
//! surface height in world units. Cells at or below the surface are ground,
//! cells above it but at or below the water level are water, everything else
//! is air.

use serde::{Deserialize, Serialize};
use strata_voxel::{ChunkCoordinate, Voxel, VoxelRun, VoxelType, WorldParameters};

use crate::noise::FractalNoise;
use crate::seed::{NoiseLayer, layer_offset};
use crate::spline::{Spline, SplinePoint};

/// Frequency and remap curve for one noise layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseLayerConfig {
    /// Frequency of the first octave, in cycles per world unit.
    pub frequency: f64,
    /// Noise-to-output remap.
    pub spline: Spline,
}

/// Tunables for [`TerrainGenerator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Layer whose spline outputs a base height in world units.
    pub continentalness: NoiseLayerConfig,
    /// Layer whose spline outputs a height multiplier.
    pub erosion: NoiseLayerConfig,
    /// Type used for every solid cell.
    pub ground: VoxelType,
    /// Replace terrain with a 3D checkerboard of ground and air.
    pub worst_case: bool,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            continentalness: NoiseLayerConfig {
                frequency: 0.02,
                spline: Spline::new(vec![
                    SplinePoint::new(0.0, 8.0),
                    SplinePoint::new(0.35, 18.0),
                    SplinePoint::new(0.5, 28.0),
                    SplinePoint::new(0.7, 44.0),
                    SplinePoint::new(1.0, 64.0),
                ])
                .unwrap_or_else(|_| Spline::constant(28.0)),
            },
            erosion: NoiseLayerConfig {
                frequency: 0.04,
                spline: Spline::new(vec![
                    SplinePoint::new(0.0, 1.25),
                    SplinePoint::new(0.4, 1.0),
                    SplinePoint::new(0.75, 0.7),
                    SplinePoint::new(1.0, 0.5),
                ])
                .unwrap_or_else(|_| Spline::constant(1.0)),
            },
            ground: VoxelType::Grass,
            worst_case: false,
        }
    }
}

/// Deterministic chunk generator for one world.
///
/// Holds the seeded noise fields so repeated calls only pay for sampling.
pub struct TerrainGenerator {
    params: WorldParameters,
    config: TerrainConfig,
    continentalness: FractalNoise,
    erosion: FractalNoise,
}

impl TerrainGenerator {
    /// Seeds both noise layers from `params.seed`.
    pub fn new(params: WorldParameters, config: TerrainConfig) -> Self {
        let perlin_seed = (params.seed ^ (params.seed >> 32)) as u32;
        let continentalness = FractalNoise::new(
            perlin_seed,
            config.continentalness.frequency,
            layer_offset(params.seed, NoiseLayer::Continentalness),
        );
        let erosion = FractalNoise::new(
            perlin_seed,
            config.erosion.frequency,
            layer_offset(params.seed, NoiseLayer::Erosion),
        );
        Self {
            params,
            config,
            continentalness,
            erosion,
        }
    }

    /// The world these chunks belong to.
    pub fn params(&self) -> &WorldParameters {
        &self.params
    }

    /// The active tunables.
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Surface height in world units of the column at world `(x, z)`.
    pub fn column_height(&self, x: f64, z: f64) -> f64 {
        let c = self.continentalness.sample(x, z);
        let e = self.erosion.sample(x, z);
        self.config.continentalness.spline.evaluate(c) * self.config.erosion.spline.evaluate(e)
    }

    /// Generates the full contents of one chunk.
    pub fn generate(&self, coord: ChunkCoordinate) -> VoxelRun {
        if self.config.worst_case {
            return self.generate_checkerboard(coord);
        }

        let dims = self.params.dims();
        let origin = self.params.chunk_origin_voxel(coord);
        let resolution = f64::from(self.params.resolution);
        let water_height = f64::from(self.params.water_height);
        let ground = Voxel::new(self.config.ground);
        let water = Voxel::new(VoxelType::WaterSource);

        let mut flat = vec![Voxel::AIR; dims.volume()];
        for x in 0..dims.size {
            let wx = f64::from(origin.x + x as i32) / resolution;
            for z in 0..dims.size {
                let wz = f64::from(origin.z + z as i32) / resolution;
                let surface = self.column_height(wx, wz);
                for y in 0..dims.height {
                    let wy = f64::from(origin.y + y as i32) / resolution;
                    let voxel = if wy <= surface {
                        ground
                    } else if wy <= water_height {
                        water
                    } else {
                        continue;
                    };
                    flat[dims.index(x, y, z)] = voxel;
                }
            }
        }
        VoxelRun::from_flat(&flat)
    }

    /// Alternating ground and air on global voxel parity: the most runs and
    /// the most faces a chunk can have.
    fn generate_checkerboard(&self, coord: ChunkCoordinate) -> VoxelRun {
        let dims = self.params.dims();
        let origin = self.params.chunk_origin_voxel(coord);
        let ground = Voxel::new(self.config.ground);

        let mut flat = vec![Voxel::AIR; dims.volume()];
        for (i, cell) in flat.iter_mut().enumerate() {
            let (x, y, z) = dims.position(i);
            let parity = (origin.x + x as i32) + (origin.y + y as i32) + (origin.z + z as i32);
            if parity.rem_euclid(2) == 0 {
                *cell = ground;
            }
        }
        VoxelRun::from_flat(&flat)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> WorldParameters {
        WorldParameters {
            seed: 1234,
            ..Default::default()
        }
    }

    fn flat_config(height: f64) -> TerrainConfig {
        TerrainConfig {
            continentalness: NoiseLayerConfig {
                frequency: 0.02,
                spline: Spline::constant(height),
            },
            erosion: NoiseLayerConfig {
                frequency: 0.02,
                spline: Spline::constant(1.0),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = TerrainGenerator::new(params(), TerrainConfig::default());
        let b = TerrainGenerator::new(params(), TerrainConfig::default());
        let coord = ChunkCoordinate::new(3, 1, -2);
        assert_eq!(a.generate(coord), b.generate(coord));
    }

    #[test]
    fn test_output_is_valid_run() {
        let g = TerrainGenerator::new(params(), TerrainConfig::default());
        for y in 0..4 {
            let run = g.generate(ChunkCoordinate::new(0, y, 0));
            assert_eq!(run.volume(), g.params().dims().volume());
            assert_eq!(run.validate(), Ok(()));
        }
    }

    #[test]
    fn test_flat_surface_layers() {
        // Surface at 5.0, water at 8.0, chunk 16 tall starting at y = 0.
        let p = WorldParameters {
            water_height: 8.0,
            ..params()
        };
        let g = TerrainGenerator::new(p.clone(), flat_config(5.0));
        let flat = g.generate(ChunkCoordinate::new(0, 0, 0)).to_flat();
        let dims = p.dims();
        for y in 0..dims.height {
            let expected = match y {
                0..=5 => VoxelType::Grass,
                6..=8 => VoxelType::WaterSource,
                _ => VoxelType::Air,
            };
            assert_eq!(flat[dims.index(4, y, 9)].voxel_type, expected, "y = {y}");
        }
    }

    #[test]
    fn test_high_chunk_is_air() {
        let g = TerrainGenerator::new(params(), flat_config(5.0));
        let run = g.generate(ChunkCoordinate::new(0, 6, 0));
        assert!(run.is_all_air());
    }

    #[test]
    fn test_column_height_is_product_of_splines() {
        let mut config = flat_config(20.0);
        config.erosion.spline = Spline::constant(0.5);
        let g = TerrainGenerator::new(params(), config);
        assert!((g.column_height(17.0, -3.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_column_height_varies_with_default_config() {
        let g = TerrainGenerator::new(params(), TerrainConfig::default());
        let heights: Vec<f64> = (0..32)
            .map(|i| g.column_height(i as f64 * 13.0, i as f64 * 7.0))
            .collect();
        let min = heights.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = heights.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(max > min, "terrain should not be flat");
    }

    #[test]
    fn test_worst_case_checkerboard() {
        let config = TerrainConfig {
            worst_case: true,
            ground: VoxelType::Stone,
            ..Default::default()
        };
        let p = params();
        let g = TerrainGenerator::new(p.clone(), config);
        let run = g.generate(ChunkCoordinate::new(1, 0, 0));
        // Rows alternate cell by cell; only row ends can join.
        assert!(run.run_count() > p.dims().volume() / 2);

        let flat = run.to_flat();
        let dims = p.dims();
        // Chunk x origin is 16 (even), so local (0,0,0) is ground.
        assert_eq!(flat[dims.index(0, 0, 0)].voxel_type, VoxelType::Stone);
        assert_eq!(flat[dims.index(0, 0, 1)].voxel_type, VoxelType::Air);
        assert_eq!(flat[dims.index(1, 1, 0)].voxel_type, VoxelType::Stone);
    }
}
