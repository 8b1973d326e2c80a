//! Dynamic bucketed k-d tree with in-place point motion and bounded k-NN
//! search.
//!
//! The tree indexes `(point, payload)` pairs under a pluggable distance
//! model and supports the full life of a moving data set: insertion,
//! removal, in-place relocation, and an explicit rebuild to shed the
//! imbalance that motion accumulates.
//!
//! # Architecture
//!
//! ```text
//! KdTree<V>                 stable-index point store + rebuild policy hook
//!   └── KdNode              bucketed leaves, widest-dimension splits,
//!                           grow-only bounding boxes
//! nearest_neighbors()       best-first search driver
//!   ├── toki_heap           pending-subtree min-heap + best-k interval heap
//!   └── toki_metric         distance + box lower bound (pluggable)
//! ```
//!
//! Searches are exact for the supplied metric: the box distance is a lower
//! bound, so a subtree is only skipped when nothing inside it can beat the
//! current best-k.
//!
//! # Example
//!
//! ```
//! use toki_kdtree::KdTree;
//!
//! let mut tree = KdTree::new(3).unwrap();
//! tree.add(&[0.0, 0.0, 0.0], "origin").unwrap();
//! tree.add(&[1.0, 0.0, 0.0], "x").unwrap();
//! tree.add(&[9.0, 9.0, 9.0], "far").unwrap();
//!
//! let names: Vec<_> = tree
//!     .nearest_neighbors(&[0.2, 0.0, 0.0], 2)
//!     .unwrap()
//!     .map(|n| *n.payload)
//!     .collect();
//! assert_eq!(names, vec!["origin", "x"]);
//! ```
//!
//! Moving points use the vector layout `[pos(k), vel(k), t0]` together
//! with the extrapolated metrics from `toki_metric`; see
//! [`KdTree::nearest_neighbors_with`].

mod node;
mod search;
mod tree;

pub use node::KdNode;
pub use search::{NearestNeighbors, Neighbor};
pub use tree::{KdTree, KdTreeConfig, DEFAULT_BUCKET_CAPACITY};

/// Error type for tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KdTreeError {
    /// A point or query whose length differs from the tree dimensionality.
    #[error("point has {actual} dimensions, tree expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Tree dimensionality below 1.
    #[error("invalid dimensionality {0}: must be at least 1")]
    InvalidDimensionality(usize),

    /// Bucket capacity below 1.
    #[error("invalid bucket capacity {0}: must be at least 1")]
    InvalidBucketCapacity(usize),

    /// An index that is out of bounds or names a vacated slot.
    #[error("index {index} is out of range or vacant")]
    IndexOutOfRange { index: usize },

    /// An operation this structure does not support.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A metric rejected this tree's dimensionality.
    #[error("metric error: {0}")]
    Metric(#[from] toki_metric::MetricError),
}

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, KdTreeError>;
