//! The metric seam between point storage and tree search.

use crate::MetricError;

/// A distance model over fixed-dimension points.
///
/// Implementations must satisfy the lower-bound contract: for any point `p`
/// and any point `q` inside the axis-aligned box `[min, max]`,
/// `distance_to_box(p, min, max) <= distance(p, q)`. Search uses the box
/// distance to discard whole subtrees, so breaking the contract silently
/// drops results.
///
/// Distances are not required to be true metrics (no triangle inequality is
/// assumed); they only need to be non-negative and consistent between the
/// two methods.
pub trait DistanceFunction {
    /// Distance between two points of equal dimensionality.
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;

    /// Lower bound on the distance from `point` to any point inside the
    /// axis-aligned box spanned by `min` and `max`.
    fn distance_to_box(&self, point: &[f64], min: &[f64], max: &[f64]) -> f64;

    /// Check that this metric can serve an index of the given
    /// dimensionality. Called once per query, before anything is mutated
    /// or allocated.
    fn validate_dimensions(&self, dimensions: usize) -> Result<(), MetricError> {
        let _ = dimensions;
        Ok(())
    }
}

impl<F: DistanceFunction + ?Sized> DistanceFunction for &F {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        (**self).distance(a, b)
    }

    fn distance_to_box(&self, point: &[f64], min: &[f64], max: &[f64]) -> f64 {
        (**self).distance_to_box(point, min, max)
    }

    fn validate_dimensions(&self, dimensions: usize) -> Result<(), MetricError> {
        (**self).validate_dimensions(dimensions)
    }
}

impl<F: DistanceFunction + ?Sized> DistanceFunction for Box<F> {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        (**self).distance(a, b)
    }

    fn distance_to_box(&self, point: &[f64], min: &[f64], max: &[f64]) -> f64 {
        (**self).distance_to_box(point, min, max)
    }

    fn validate_dimensions(&self, dimensions: usize) -> Result<(), MetricError> {
        (**self).validate_dimensions(dimensions)
    }
}
