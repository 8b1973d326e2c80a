//! Distance functions for spatial search.
//!
//! This crate provides the metric abstraction used by the k-d index, plus
//! four implementations:
//!
//! - **[`SquaredEuclidean`]**: plain `sum((a[i] - b[i])^2)`, the default
//! - **[`WeightedSquaredEuclidean`]**: per-dimension weights applied before
//!   squaring
//! - **[`ExtrapolatedSquaredEuclidean`]**: squared Euclidean between
//!   *predicted* positions of moving points (`pos + vel * elapsed`)
//! - **[`WeightedExtrapolatedSquaredEuclidean`]**: extrapolation composed
//!   with per-axis weights
//!
//! Every metric answers two questions: the distance between two points, and
//! a lower bound on the distance from a point to anything inside an
//! axis-aligned box. The box bound is what makes best-first tree search
//! prune correctly, so implementations of [`DistanceFunction`] must keep it
//! monotone: `distance_to_box(p, min, max) <= distance(p, q)` for every `q`
//! inside `[min, max]`.
//!
//! # Example
//!
//! ```
//! use toki_metric::{DistanceFunction, SquaredEuclidean};
//!
//! let metric = SquaredEuclidean;
//! assert_eq!(metric.distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
//! assert_eq!(metric.distance_to_box(&[0.0, 5.0], &[1.0, 1.0], &[4.0, 4.0]), 2.0);
//! ```

mod euclidean;
mod extrapolated;
mod traits;

pub use euclidean::{squared_distance, SquaredEuclidean, WeightedSquaredEuclidean};
pub use extrapolated::{ExtrapolatedSquaredEuclidean, WeightedExtrapolatedSquaredEuclidean};
pub use traits::DistanceFunction;

/// Error type for metric construction and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    /// A dimensionality below the minimum the metric can operate on.
    #[error("invalid dimensionality {0}: must be at least 1")]
    InvalidDimensionality(usize),

    /// The weight vector does not cover the index dimensionality.
    #[error("weight vector has length {weights}, index dimensionality is {dimensions}")]
    WeightLength { weights: usize, dimensions: usize },

    /// An extrapolated metric paired with an index whose dimensionality is
    /// not `2k + 1` for its `k` spatial dimensions.
    #[error("extrapolated metric expects dimensionality {expected}, got {dimensions}")]
    ExtrapolatedDimensionality { expected: usize, dimensions: usize },
}

/// Result type for metric operations.
pub type Result<T> = std::result::Result<T, MetricError>;
