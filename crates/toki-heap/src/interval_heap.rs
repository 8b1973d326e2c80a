//! Double-ended priority queue backed by an interval heap.
//!
//! Entries are stored in paired slots: even slots form a min-heap, odd
//! slots a max-heap, and within a complete pair `keys[2q] <= keys[2q + 1]`.
//! Every pair's interval is contained in its parent pair's interval, which
//! gives O(log n) insert, remove-min, remove-max, replace-min and
//! replace-max while both ends stay readable in O(1).

use crate::{HeapError, Result};

/// Initial slot count for heaps created with [`IntervalHeap::new`].
const DEFAULT_CAPACITY: usize = 64;

/// A double-ended priority queue keyed by `f64`.
///
/// The common use is to bound a best-k candidate set: fill the heap to its
/// budget with [`insert`](IntervalHeap::insert), then evict through
/// [`replace_max`](IntervalHeap::replace_max) whenever a better candidate
/// shows up, and drain results from the min end.
#[derive(Debug, Clone)]
pub struct IntervalHeap<V> {
    keys: Vec<f64>,
    values: Vec<V>,
}

impl<V> IntervalHeap<V> {
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
        self.sift_up_inserted();
    }

    /// The value with the smallest key.
    pub fn min(&self) -> Result<&V> {
        self.values.first().ok_or(HeapError::Empty)
    }

    /// The value with the largest key.
    pub fn max(&self) -> Result<&V> {
        match self.keys.len() {
            0 => Err(HeapError::Empty),
            1 => Ok(&self.values[0]),
            _ => Ok(&self.values[1]),
        }
    }

    /// The smallest key.
    pub fn min_key(&self) -> Result<f64> {
        self.keys.first().copied().ok_or(HeapError::Empty)
    }

    /// The largest key.
    pub fn max_key(&self) -> Result<f64> {
        match self.keys.len() {
            0 => Err(HeapError::Empty),
            1 => Ok(self.keys[0]),
            _ => Ok(self.keys[1]),
        }
    }

    /// Remove and return the entry with the smallest key.
    pub fn remove_min(&mut self) -> Result<(f64, V)> {
        match self.keys.len() {
            0 => Err(HeapError::Empty),
            1 | 2 => {
                // The min lives at slot 0; the survivor, if any, is
                // already a valid single-entry heap once moved there.
                self.swap(0, self.keys.len() - 1);
                self.pop_last()
            }
            _ => {
                let last = self.keys.len() - 1;
                self.swap(0, last);
                let popped = self.pop_last()?;
                self.sift_down_min(0);
                Ok(popped)
            }
        }
    }

    /// Remove and return the entry with the largest key.
    pub fn remove_max(&mut self) -> Result<(f64, V)> {
        match self.keys.len() {
            0 => Err(HeapError::Empty),
            1 | 2 => self.pop_last(),
            _ => {
                let last = self.keys.len() - 1;
                self.swap(1, last);
                let popped = self.pop_last()?;
                self.sift_down_max(1);
                Ok(popped)
            }
        }
    }

    /// Replace the entry with the smallest key, restoring the heap in a
    /// single top-down pass.
    pub fn replace_min(&mut self, key: f64, value: V) -> Result<()> {
        if self.keys.is_empty() {
            return Err(HeapError::Empty);
        }
        self.keys[0] = key;
        self.values[0] = value;
        if self.keys.len() > 1 {
            if self.keys[1] < self.keys[0] {
                self.swap(0, 1);
            }
            self.sift_down_min(0);
        }
        Ok(())
    }

    /// Replace the entry with the largest key, restoring the heap in a
    /// single top-down pass.
    pub fn replace_max(&mut self, key: f64, value: V) -> Result<()> {
        match self.keys.len() {
            0 => Err(HeapError::Empty),
            1 => self.replace_min(key, value),
            _ => {
                self.keys[1] = key;
                self.values[1] = value;
                if self.keys[1] < self.keys[0] {
                    self.swap(0, 1);
                }
                self.sift_down_max(1);
                Ok(())
            }
        }
    }

    fn pop_last(&mut self) -> Result<(f64, V)> {
        let key = self.keys.pop().ok_or(HeapError::Empty)?;
        let value = self.values.pop().ok_or(HeapError::Empty)?;
        Ok((key, value))
    }

    /// Restore invariants after a push to the tail slot.
    fn sift_up_inserted(&mut self) {
        let slot = self.keys.len() - 1;
        if slot == 0 {
            return;
        }
        if slot % 2 == 1 {
            // Completed the pair at slot - 1.
            if self.keys[slot] < self.keys[slot - 1] {
                self.swap(slot, slot - 1);
                self.sift_up_min(slot - 1);
            } else {
                self.sift_up_max(slot);
            }
        } else {
            // Opened a new single-slot pair; place against the parent
            // pair's interval.
            let parent_min = ((slot / 2 - 1) / 2) * 2;
            if self.keys[slot] < self.keys[parent_min] {
                self.swap(slot, parent_min);
                self.sift_up_min(parent_min);
            } else if self.keys[slot] > self.keys[parent_min + 1] {
                self.swap(slot, parent_min + 1);
                self.sift_up_max(parent_min + 1);
            }
        }
    }

    /// Bubble a min-layer entry (even slot) toward the root.
    fn sift_up_min(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = ((slot / 2 - 1) / 2) * 2;
            if self.keys[slot] < self.keys[parent] {
                self.swap(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
    }

    /// Bubble a max-layer entry (odd slot) toward the root.
    fn sift_up_max(&mut self, mut slot: usize) {
        while slot > 1 {
            let parent = ((slot / 2 - 1) / 2) * 2 + 1;
            if self.keys[slot] > self.keys[parent] {
                self.swap(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
    }

    /// Sink a min-layer entry (even slot) away from the root.
    fn sift_down_min(&mut self, mut slot: usize) {
        loop {
            let len = self.keys.len();
            let pair = slot / 2;
            let mut best = slot;
            for child_pair in [2 * pair + 1, 2 * pair + 2] {
                let child = 2 * child_pair;
                if child >= len {
                    break;
                }
                if self.keys[child] < self.keys[best] {
                    best = child;
                }
            }
            if best == slot {
                return;
            }
            self.swap(slot, best);
            // The displaced entry may belong on the max side of its pair.
            if best + 1 < len && self.keys[best] > self.keys[best + 1] {
                self.swap(best, best + 1);
            }
            slot = best;
        }
    }

    /// Sink a max-layer entry (odd slot) away from the root.
    fn sift_down_max(&mut self, mut slot: usize) {
        loop {
            let len = self.keys.len();
            let pair = slot / 2;
            let mut best = slot;
            for child_pair in [2 * pair + 1, 2 * pair + 2] {
                let lo = 2 * child_pair;
                if lo >= len {
                    break;
                }
                // A single-slot tail pair stands in for its own maximum.
                let child = if lo + 1 < len { lo + 1 } else { lo };
                if self.keys[child] > self.keys[best] {
                    best = child;
                }
            }
            if best == slot {
                return;
            }
            self.swap(slot, best);
            if best % 2 == 1 {
                if self.keys[best - 1] > self.keys[best] {
                    self.swap(best - 1, best);
                }
                slot = best;
            } else {
                // Landed in the single-slot tail pair; nothing below it.
                return;
            }
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.keys.swap(a, b);
        self.values.swap(a, b);
    }
}

impl<V> Default for IntervalHeap<V> {
    fn default() -> Self {
        Self::new()
    }
}
