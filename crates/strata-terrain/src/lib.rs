//! Procedural terrain: fractal noise layers remapped through splines into
//! column heights, chunk generation, and the background generation pool.

pub mod async_generation;
pub mod generator;
pub mod noise;
pub mod seed;
pub mod spline;

pub use async_generation::{GeneratedChunk, GenerationError, GenerationPool, MAX_ATTEMPTS};
pub use generator::{NoiseLayerConfig, TerrainConfig, TerrainGenerator};
pub use noise::FractalNoise;
pub use seed::{NoiseLayer, layer_offset};
pub use spline::{Spline, SplineError, SplinePoint};
