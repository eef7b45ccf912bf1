//! Three-octave fractal Perlin noise normalized to `[0, 1]`.
//!
//! Each octave divides the frequency by the lacunarity and multiplies the
//! amplitude by the gain. With an initial amplitude of 4/7 and a gain of 0.5
//! the amplitudes are 4/7, 2/7 and 1/7, which sum to one, so remapping every
//! octave from `[-1, 1]` to `[0, 1]` keeps the total in `[0, 1]`.

use glam::DVec2;
use noise::{NoiseFn, Perlin};

/// Number of octaves composited per sample.
pub const OCTAVES: u32 = 3;
/// Frequency divisor between octaves.
pub const LACUNARITY: f64 = 2.0;
/// Amplitude multiplier between octaves.
pub const GAIN: f64 = 0.5;
/// Amplitude of the first octave.
pub const INITIAL_AMPLITUDE: f64 = 4.0 / 7.0;

/// A 2D fractal noise field with a fixed domain offset.
pub struct FractalNoise {
    perlin: Perlin,
    base_frequency: f64,
    offset: DVec2,
}

impl FractalNoise {
    /// Creates a field. `seed` selects the Perlin permutation table.
    pub fn new(seed: u32, base_frequency: f64, offset: DVec2) -> Self {
        Self {
            perlin: Perlin::new(seed),
            base_frequency,
            offset,
        }
    }

    /// Samples the field at world-space `(x, z)`. The result lies in `[0, 1]`.
    pub fn sample(&self, x: f64, z: f64) -> f64 {
        let p = DVec2::new(x, z) + self.offset;
        let mut total = 0.0;
        let mut frequency = self.base_frequency;
        let mut amplitude = INITIAL_AMPLITUDE;

        for _ in 0..OCTAVES {
            let value = self.perlin.get([p.x * frequency, p.y * frequency]);
            total += (value * 0.5 + 0.5) * amplitude;

            frequency /= LACUNARITY;
            amplitude *= GAIN;
        }

        total.clamp(0.0, 1.0)
    }
}
