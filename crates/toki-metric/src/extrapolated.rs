//! Moving-point metrics: distance between predicted positions.
//!
//! Points carry their own motion state in the vector layout
//! `[pos(k), vel(k), t0]`, giving an index dimensionality of `2k + 1`.
//! At query time the metric reads a clock once and measures squared
//! Euclidean distance between the positions each point will have reached:
//! `pos + vel * (now - t0)`.
//!
//! The box variant extrapolates the stored box corners the same way, each
//! corner by the start time sitting in its own `t0` slot. Stored bounds
//! cover the un-extrapolated coordinates of everything beneath them, so the
//! translated corners give a bound that may under-prune but never
//! over-prunes.

use std::fmt;

use crate::euclidean::axis_excess;
use crate::traits::DistanceFunction;
use crate::MetricError;

/// Squared Euclidean distance between extrapolated positions of moving
/// points.
///
/// The clock is read exactly once per `distance` or `distance_to_box` call
/// and never at construction. It must be monotone within a single query;
/// pass a constant closure for deterministic results.
///
/// # Example
///
/// ```
/// use toki_metric::{DistanceFunction, ExtrapolatedSquaredEuclidean};
///
/// // One spatial dimension: [pos, vel, t0].
/// let metric = ExtrapolatedSquaredEuclidean::new(1, || 10.0).unwrap();
///
/// // Launched at t=0 with velocity 2, the point sits at 20 by t=10.
/// let moving = [0.0, 2.0, 0.0];
/// let still = [20.0, 0.0, 0.0];
/// assert_eq!(metric.distance(&moving, &still), 0.0);
/// ```
#[derive(Clone)]
pub struct ExtrapolatedSquaredEuclidean<F> {
    spatial: usize,
    clock: F,
}

impl<F: Fn() -> f64> ExtrapolatedSquaredEuclidean<F> {
    /// Create a moving-point metric over `spatial_dimensions` position
    /// axes. Fails when no spatial dimensions are given.
    pub fn new(spatial_dimensions: usize, clock: F) -> Result<Self, MetricError> {
        if spatial_dimensions == 0 {
            return Err(MetricError::InvalidDimensionality(0));
        }
        Ok(Self {
            spatial: spatial_dimensions,
            clock,
        })
    }

    /// Number of spatial dimensions `k`.
    pub fn spatial_dimensions(&self) -> usize {
        self.spatial
    }

    /// The index dimensionality this metric expects, `2k + 1`.
    pub fn point_dimensions(&self) -> usize {
        2 * self.spatial + 1
    }
}

impl<F: Fn() -> f64> DistanceFunction for ExtrapolatedSquaredEuclidean<F> {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let now = (self.clock)();
        let k = self.spatial;
        let elapsed_a = now - a[2 * k];
        let elapsed_b = now - b[2 * k];

        let mut sum = 0.0;
        for i in 0..k {
            let d = (a[i] + a[k + i] * elapsed_a) - (b[i] + b[k + i] * elapsed_b);
            sum += d * d;
        }
        sum
    }

    fn distance_to_box(&self, point: &[f64], min: &[f64], max: &[f64]) -> f64 {
        let now = (self.clock)();
        let k = self.spatial;
        let elapsed_point = now - point[2 * k];
        let elapsed_min = now - min[2 * k];
        let elapsed_max = now - max[2 * k];

        let mut sum = 0.0;
        for i in 0..k {
            let p = point[i] + point[k + i] * elapsed_point;
            let lo = min[i] + min[k + i] * elapsed_min;
            let hi = max[i] + max[k + i] * elapsed_max;
            let d = axis_excess(p, lo, hi);
            sum += d * d;
        }
        sum
    }

    fn validate_dimensions(&self, dimensions: usize) -> Result<(), MetricError> {
        let expected = self.point_dimensions();
        if dimensions != expected {
            return Err(MetricError::ExtrapolatedDimensionality {
                expected,
                dimensions,
            });
        }
        Ok(())
    }
}

impl<F> fmt::Debug for ExtrapolatedSquaredEuclidean<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtrapolatedSquaredEuclidean")
            .field("spatial", &self.spatial)
            .finish_non_exhaustive()
    }
}

/// Extrapolated squared Euclidean distance with per-axis weights applied
/// after the positions are predicted.
///
/// The weight vector covers the `k` spatial axes; its length fixes `k`, so
/// the expected index dimensionality is `2 * weights.len() + 1`.
#[derive(Clone)]
pub struct WeightedExtrapolatedSquaredEuclidean<F> {
    weights: Vec<f64>,
    clock: F,
}

impl<F: Fn() -> f64> WeightedExtrapolatedSquaredEuclidean<F> {
    /// Create a weighted moving-point metric. Fails on an empty weight
    /// vector.
    pub fn new(weights: Vec<f64>, clock: F) -> Result<Self, MetricError> {
        if weights.is_empty() {
            return Err(MetricError::InvalidDimensionality(0));
        }
        Ok(Self { weights, clock })
    }

    /// The per-axis weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The index dimensionality this metric expects, `2k + 1`.
    pub fn point_dimensions(&self) -> usize {
        2 * self.weights.len() + 1
    }
}

impl<F: Fn() -> f64> DistanceFunction for WeightedExtrapolatedSquaredEuclidean<F> {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        let now = (self.clock)();
        let k = self.weights.len();
        let elapsed_a = now - a[2 * k];
        let elapsed_b = now - b[2 * k];

        let mut sum = 0.0;
        for i in 0..k {
            let d = ((a[i] + a[k + i] * elapsed_a) - (b[i] + b[k + i] * elapsed_b))
                * self.weights[i];
            sum += d * d;
        }
        sum
    }

    fn distance_to_box(&self, point: &[f64], min: &[f64], max: &[f64]) -> f64 {
        let now = (self.clock)();
        let k = self.weights.len();
        let elapsed_point = now - point[2 * k];
        let elapsed_min = now - min[2 * k];
        let elapsed_max = now - max[2 * k];

        let mut sum = 0.0;
        for i in 0..k {
            let p = point[i] + point[k + i] * elapsed_point;
            let lo = min[i] + min[k + i] * elapsed_min;
            let hi = max[i] + max[k + i] * elapsed_max;
            let d = axis_excess(p, lo, hi) * self.weights[i];
            sum += d * d;
        }
        sum
    }

    fn validate_dimensions(&self, dimensions: usize) -> Result<(), MetricError> {
        let expected = self.point_dimensions();
        if dimensions != expected {
            return Err(MetricError::ExtrapolatedDimensionality {
                expected,
                dimensions,
            });
        }
        Ok(())
    }
}

impl<F> fmt::Debug for WeightedExtrapolatedSquaredEuclidean<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightedExtrapolatedSquaredEuclidean")
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}
