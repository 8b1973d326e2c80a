//! Priority queues for best-first spatial search.
//!
//! This crate provides the two queue shapes a best-first k-NN driver needs:
//!
//! - **[`BinaryMinHeap`]**: smallest-key-first queue of pending work
//!   (subtree frontiers, ordered by lower-bound distance)
//! - **[`IntervalHeap`]**: double-ended queue of the current best-k
//!   candidates, with O(log n) access to both the nearest and the
//!   farthest entry
//!
//! Both heaps key entries by `f64` and carry an opaque value. Keys are
//! compared with the raw `<`/`>` operators; NaN keys are tolerated (they
//! never win a comparison) but make the ordering meaningless, so callers
//! that can produce NaN keys should not rely on extraction order for them.
//!
//! # Example
//!
//! ```
//! use toki_heap::IntervalHeap;
//!
//! let mut heap = IntervalHeap::new();
//! heap.insert(3.0, "c");
//! heap.insert(1.0, "a");
//! heap.insert(2.0, "b");
//!
//! assert_eq!(heap.min().unwrap(), &"a");
//! assert_eq!(heap.max().unwrap(), &"c");
//!
//! // Cap the heap at two entries by evicting the current maximum.
//! heap.replace_max(0.5, "d").unwrap();
//! assert_eq!(heap.max().unwrap(), &"b");
//! ```

mod binary_heap;
mod interval_heap;

pub use binary_heap::BinaryMinHeap;
pub use interval_heap::IntervalHeap;

/// Error type for heap operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    /// A read, removal, or replacement was attempted on an empty heap.
    #[error("operation requires a non-empty heap")]
    Empty,
}

/// Result type for heap operations.
pub type Result<T> = std::result::Result<T, HeapError>;
