//! Piecewise smoothstep spline that remaps noise to terrain height.

use serde::{Deserialize, Serialize};

/// One control point: noise input and height output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplinePoint {
    /// Noise value in `[0, 1]`.
    pub noise: f64,
    /// Output at that noise value.
    pub height: f64,
}

impl SplinePoint {
    /// Creates a control point.
    pub const fn new(noise: f64, height: f64) -> Self {
        Self { noise, height }
    }
}

/// Errors raised when building a [`Spline`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    /// No control points were given.
    #[error("spline needs at least one point")]
    Empty,
    /// Noise inputs must be strictly increasing.
    #[error("spline point {index} has noise {noise}, not greater than the previous point")]
    NotIncreasing {
        /// Offending point.
        index: usize,
        /// Its noise value.
        noise: f64,
    },
}

/// A validated, monotonically increasing list of control points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SplinePoint>", into = "Vec<SplinePoint>")]
pub struct Spline {
    points: Vec<SplinePoint>,
}

impl Spline {
    /// Builds a spline, rejecting empty or non-increasing input.
    pub fn new(points: Vec<SplinePoint>) -> Result<Self, SplineError> {
        if points.is_empty() {
            return Err(SplineError::Empty);
        }
        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].noise <= pair[0].noise || pair[1].noise.is_nan() {
                return Err(SplineError::NotIncreasing {
                    index: index + 1,
                    noise: pair[1].noise,
                });
            }
        }
        Ok(Self { points })
    }

    /// A spline that returns `height` everywhere.
    pub fn constant(height: f64) -> Self {
        Self {
            points: vec![SplinePoint::new(0.0, height)],
        }
    }

    /// Control points in increasing noise order.
    pub fn points(&self) -> &[SplinePoint] {
        &self.points
    }

    /// Maps a noise value to a height.
    ///
    /// Inside a segment the height is a smoothstep-weighted interpolation of
    /// the segment's endpoints; outside the covered range it clamps to the
    /// first or last height. NaN maps to the first height.
    pub fn evaluate(&self, noise: f64) -> f64 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };
        if noise.is_nan() || noise <= first.noise {
            return first.height;
        }
        if noise >= last.noise {
            return last.height;
        }

        // First point strictly above `noise`; exists because noise < last.noise.
        let upper = self.points.partition_point(|p| p.noise <= noise);
        let a = self.points[upper - 1];
        let b = self.points[upper];
        let t = smoothstep((noise - a.noise) / (b.noise - a.noise));
        a.height + (b.height - a.height) * t
    }
}

impl TryFrom<Vec<SplinePoint>> for Spline {
    type Error = SplineError;

    fn try_from(points: Vec<SplinePoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Spline> for Vec<SplinePoint> {
    fn from(spline: Spline) -> Self {
        spline.points
    }
}

/// Hermite smoothstep of `t` clamped to `[0, 1]`.
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
