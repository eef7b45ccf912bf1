//! Deterministic per-layer randomness derived from the world seed.
//!
//! Every noise layer gets its own RNG stream so that adding a layer never
//! shifts the offsets of the others.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Identifies a procedural layer. The discriminant is mixed into the seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoiseLayer {
    /// Large-scale land/ocean distribution.
    Continentalness,
    /// How flattened or rugged the land is.
    Erosion,
}

impl NoiseLayer {
    fn salt(self) -> u64 {
        match self {
            Self::Continentalness => 0x636f_6e74,
            Self::Erosion => 0x6572_6f73,
        }
    }
}

/// Largest absolute offset applied to a layer's sample domain.
const MAX_OFFSET: f64 = 100_000.0;

/// Mixes the world seed with a layer salt.
pub fn derive_layer_seed(world_seed: u64, layer: NoiseLayer) -> u64 {
    let mut hasher = DefaultHasher::new();
    world_seed.hash(&mut hasher);
    layer.salt().hash(&mut hasher);
    hasher.finish()
}

/// RNG stream for one layer.
pub fn layer_rng(world_seed: u64, layer: NoiseLayer) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_layer_seed(world_seed, layer))
}

/// Domain offset for one layer, so that different layers sampled at the same
/// point read unrelated parts of the noise field.
pub fn layer_offset(world_seed: u64, layer: NoiseLayer) -> DVec2 {
    let mut rng = layer_rng(world_seed, layer);
    DVec2::new(
        rng.random_range(-MAX_OFFSET..MAX_OFFSET),
        rng.random_range(-MAX_OFFSET..MAX_OFFSET),
    )
}
