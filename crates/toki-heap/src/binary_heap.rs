//! `f64`-keyed binary min-heap.

use crate::{HeapError, Result};

/// Initial slot count for heaps created with [`BinaryMinHeap::new`].
const DEFAULT_CAPACITY: usize = 64;

/// A binary min-heap keyed by `f64`.
///
/// Keys and values live in parallel vectors; sifting swaps both in lockstep.
/// The heap is not stable: entries with equal keys come out in an
/// unspecified order. Capacity grows geometrically on overflow.
#[derive(Debug, Clone)]
pub struct BinaryMinHeap<V> {
    keys: Vec<f64>,
    values: Vec<V>,
}

impl<V> BinaryMinHeap<V> {
    /// Create an empty heap with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty heap with room for `capacity` entries before
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Number of entries currently in the heap.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the heap holds no entries.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Remove all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// Insert an entry.
    pub fn insert(&mut self, key: f64, value: V) {
        self.keys.push(key);
        self.values.push(value);
        self.sift_up(self.keys.len() - 1);
    }

    /// The value with the smallest key.
    pub fn min(&self) -> Result<&V> {
        self.values.first().ok_or(HeapError::Empty)
    }

    /// The smallest key.
    pub fn min_key(&self) -> Result<f64> {
        self.keys.first().copied().ok_or(HeapError::Empty)
    }

    /// Remove and return the entry with the smallest key.
    pub fn remove_min(&mut self) -> Result<(f64, V)> {
        if self.keys.is_empty() {
            return Err(HeapError::Empty);
        }
        let last = self.keys.len() - 1;
        self.keys.swap(0, last);
        self.values.swap(0, last);
        let key = self.keys.pop().ok_or(HeapError::Empty)?;
        let value = self.values.pop().ok_or(HeapError::Empty)?;
        if !self.keys.is_empty() {
            self.sift_down(0);
        }
        Ok((key, value))
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.keys[slot] < self.keys[parent] {
                self.swap(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut smallest = slot;
            if left < self.keys.len() && self.keys[left] < self.keys[smallest] {
                smallest = left;
            }
            if right < self.keys.len() && self.keys[right] < self.keys[smallest] {
                smallest = right;
            }
            if smallest == slot {
                break;
            }
            self.swap(slot, smallest);
            slot = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.keys.swap(a, b);
        self.values.swap(a, b);
    }
}

impl<V> Default for BinaryMinHeap<V> {
    fn default() -> Self {
        Self::new()
    }
}
