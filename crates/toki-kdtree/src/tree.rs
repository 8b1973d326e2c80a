//! The tree container: stable-index point storage over a k-d node tree.

use serde::{Deserialize, Serialize};

use toki_metric::{DistanceFunction, SquaredEuclidean};

use crate::node::KdNode;
use crate::search::NearestNeighbors;
use crate::{KdTreeError, Result};

/// Default number of slots in a fresh leaf bucket.
pub const DEFAULT_BUCKET_CAPACITY: usize = 24;

/// Construction parameters for a [`KdTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdTreeConfig {
    /// Dimensionality of every point in the tree. Must be at least 1.
    pub dimensions: usize,
    /// Initial leaf bucket size; also the growth step for leaves that
    /// cannot split. Must be at least 1.
    pub bucket_capacity: usize,
}

impl KdTreeConfig {
    /// Config with the default bucket capacity.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            bucket_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }

    /// Override the bucket capacity.
    pub fn with_bucket_capacity(mut self, bucket_capacity: usize) -> Self {
        self.bucket_capacity = bucket_capacity;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.dimensions < 1 {
            return Err(KdTreeError::InvalidDimensionality(self.dimensions));
        }
        if self.bucket_capacity < 1 {
            return Err(KdTreeError::InvalidBucketCapacity(self.bucket_capacity));
        }
        Ok(())
    }
}

/// A dynamic k-d tree over `(point, payload)` pairs.
///
/// Points are fixed-length `f64` vectors; payloads are opaque values
/// returned by searches. Each insertion claims a *stable index* that
/// survives unrelated removals; vacated slots are reused highest-first by
/// later insertions.
///
/// Points may be moved in place through [`move_point`](KdTree::move_point),
/// which re-routes them without a full reinsert when possible. Motion and
/// removal leave node bounding boxes loose, so heavy churn degrades pruning
/// until [`rebuild`](KdTree::rebuild) is called;
/// [`removal_count`](KdTree::removal_count) is the caller's signal for when
/// that is worth doing.
///
/// The structure is single-owner: no interior locking, and a live search
/// iterator borrows the tree shared for its whole lifetime.
///
/// # Example
///
/// ```
/// use toki_kdtree::KdTree;
///
/// let mut tree = KdTree::new(2).unwrap();
/// tree.add(&[0.0, 0.0], "origin").unwrap();
/// tree.add(&[3.0, 4.0], "corner").unwrap();
///
/// let nearest: Vec<_> = tree
///     .nearest_neighbors(&[1.0, 0.0], 1)
///     .unwrap()
///     .map(|n| *n.payload)
///     .collect();
/// assert_eq!(nearest, vec!["origin"]);
/// ```
#[derive(Debug, Clone)]
pub struct KdTree<V> {
    pub(crate) dimensions: usize,
    bucket_capacity: usize,
    pub(crate) root: KdNode,
    pub(crate) points: Vec<Vec<f64>>,
    pub(crate) payloads: Vec<Option<V>>,
    /// Vacated stable indices, kept sorted ascending; reuse pops the
    /// highest.
    holes: Vec<usize>,
    removal_count: usize,
}

impl<V> KdTree<V> {
    /// Create a tree with the default bucket capacity.
    pub fn new(dimensions: usize) -> Result<Self> {
        Self::with_config(KdTreeConfig::new(dimensions))
    }

    /// Create a tree from an explicit config.
    pub fn with_config(config: KdTreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dimensions: config.dimensions,
            bucket_capacity: config.bucket_capacity,
            root: KdNode::new(config.dimensions, config.bucket_capacity),
            points: Vec::new(),
            payloads: Vec::new(),
            holes: Vec::new(),
            removal_count: 0,
        })
    }

    /// Dimensionality of every point in this tree.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Leaf bucket capacity this tree was built with.
    pub fn bucket_capacity(&self) -> usize {
        self.bucket_capacity
    }

    /// Number of live points.
    pub fn len(&self) -> usize {
        self.root.size()
    }

    /// Whether the tree holds no live points.
    pub fn is_empty(&self) -> bool {
        self.root.size() == 0
    }

    /// Removals plus cross-leaf moves since the last
    /// [`rebuild`](KdTree::rebuild). A common policy rebuilds once this
    /// exceeds about twice [`len`](KdTree::len).
    pub fn removal_count(&self) -> usize {
        self.removal_count
    }

    /// The root node, for structural inspection.
    pub fn root(&self) -> &KdNode {
        &self.root
    }

    /// Insert a point with its payload, returning the claimed stable index.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::DimensionMismatch`] when the point length differs
    /// from the tree dimensionality; the tree is untouched.
    pub fn add(&mut self, point: &[f64], payload: V) -> Result<usize> {
        self.check_dimensions(point)?;
        let index = match self.holes.pop() {
            Some(index) => {
                self.points[index] = point.to_vec();
                self.payloads[index] = Some(payload);
                index
            }
            None => {
                self.points.push(point.to_vec());
                self.payloads.push(Some(payload));
                self.points.len() - 1
            }
        };
        self.root.add_point(index, &self.points);
        Ok(index)
    }

    /// Remove the first payload equal to `payload`. Returns whether a
    /// match was found.
    pub fn remove(&mut self, payload: &V) -> bool
    where
        V: PartialEq,
    {
        match self.find(payload) {
            Some(index) => {
                self.remove_live(index);
                true
            }
            None => false,
        }
    }

    /// Remove the point at a stable index.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::IndexOutOfRange`] when the index is out of bounds or
    /// names a vacated slot; the tree is untouched.
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        self.check_live(index)?;
        self.remove_live(index);
        Ok(())
    }

    /// Update the coordinates of the point carrying `payload`, re-routing
    /// it inside the tree. Returns whether a match was found.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::DimensionMismatch`] on a wrong-length point; the
    /// tree is untouched.
    pub fn move_point(&mut self, new_point: &[f64], payload: &V) -> Result<bool>
    where
        V: PartialEq,
    {
        self.check_dimensions(new_point)?;
        let Some(index) = self.find(payload) else {
            return Ok(false);
        };
        let old_point = std::mem::replace(&mut self.points[index], new_point.to_vec());
        let stayed = self.root.move_point(&old_point, index, &self.points);
        if !stayed {
            self.removal_count += 1;
        }
        Ok(true)
    }

    /// Copy of the point carrying `payload`, if present.
    pub fn get_point(&self, payload: &V) -> Option<Vec<f64>>
    where
        V: PartialEq,
    {
        self.find(payload).map(|index| self.points[index].clone())
    }

    /// Copy of the point at a stable index.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::IndexOutOfRange`] for out-of-bounds or vacated slots.
    pub fn get_point_at(&self, index: usize) -> Result<Vec<f64>> {
        self.check_live(index)?;
        Ok(self.points[index].clone())
    }

    /// Payload at a stable index.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::IndexOutOfRange`] for out-of-bounds or vacated slots.
    pub fn payload_at(&self, index: usize) -> Result<&V> {
        self.check_live(index)?;
        self.payloads[index]
            .as_ref()
            .ok_or(KdTreeError::IndexOutOfRange { index })
    }

    /// Iterate live `(stable index, point, payload)` entries in ascending
    /// index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f64], &V)> {
        self.payloads.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|payload| (index, self.points[index].as_slice(), payload))
        })
    }

    /// Rebuild the node tree from the live points.
    ///
    /// Discards the accumulated structure (and its loose bounding boxes),
    /// resets [`removal_count`](KdTree::removal_count) to zero, and
    /// reinserts every live index in ascending order. Stable indices are
    /// unchanged.
    pub fn rebuild(&mut self) {
        self.root.clear();
        self.removal_count = 0;
        for index in 0..self.points.len() {
            if self.payloads[index].is_some() {
                self.root.add_point(index, &self.points);
            }
        }
        tracing::debug!(live = self.root.size(), "rebuilt k-d index");
    }

    /// Best-first k-NN search under squared Euclidean distance, unbounded.
    ///
    /// Yields up to `k` payloads in non-decreasing distance order. The
    /// returned iterator borrows the tree; results are exact for the
    /// metric.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::DimensionMismatch`] on a wrong-length query.
    pub fn nearest_neighbors(
        &self,
        query: &[f64],
        k: usize,
    ) -> Result<NearestNeighbors<'_, V, SquaredEuclidean>> {
        self.nearest_neighbors_with(query, k, None, SquaredEuclidean)
    }

    /// Best-first k-NN search under a caller-supplied metric, optionally
    /// bounded by a maximum distance.
    ///
    /// With `threshold` set, only payloads at `distance <= threshold` are
    /// yielded and subtrees provably beyond it are never visited. Metrics
    /// that read a clock evaluate the whole query at whatever times the
    /// clock returns during iteration; pass a fixed clock for a
    /// deterministic snapshot.
    ///
    /// # Errors
    ///
    /// [`KdTreeError::DimensionMismatch`] on a wrong-length query, or the
    /// metric's own validation error when it cannot serve this tree's
    /// dimensionality.
    pub fn nearest_neighbors_with<F: DistanceFunction>(
        &self,
        query: &[f64],
        k: usize,
        threshold: Option<f64>,
        metric: F,
    ) -> Result<NearestNeighbors<'_, V, F>> {
        self.check_dimensions(query)?;
        metric.validate_dimensions(self.dimensions)?;
        Ok(NearestNeighbors::new(self, query, k, threshold, metric))
    }

    fn find(&self, payload: &V) -> Option<usize>
    where
        V: PartialEq,
    {
        self.payloads
            .iter()
            .position(|slot| slot.as_ref() == Some(payload))
    }

    fn check_dimensions(&self, point: &[f64]) -> Result<()> {
        if point.len() != self.dimensions {
            return Err(KdTreeError::DimensionMismatch {
                expected: self.dimensions,
                actual: point.len(),
            });
        }
        Ok(())
    }

    fn check_live(&self, index: usize) -> Result<()> {
        if index >= self.payloads.len() || self.payloads[index].is_none() {
            return Err(KdTreeError::IndexOutOfRange { index });
        }
        Ok(())
    }

    /// Remove a validated live index and recycle its slot.
    fn remove_live(&mut self, index: usize) {
        self.root.remove_point(index, &self.points[index]);
        self.points[index] = Vec::new();
        self.payloads[index] = None;
        self.removal_count += 1;

        if index + 1 == self.points.len() {
            // Contract the used range, absorbing any trailing holes.
            self.points.pop();
            self.payloads.pop();
            while let Some(&hole) = self.holes.last() {
                if hole + 1 == self.points.len() {
                    self.holes.pop();
                    self.points.pop();
                    self.payloads.pop();
                } else {
                    break;
                }
            }
        } else if let Err(slot) = self.holes.binary_search(&index) {
            self.holes.insert(slot, index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_validation() {
        assert!(matches!(
            KdTree::<u32>::new(0),
            Err(KdTreeError::InvalidDimensionality(0))
        ));
        assert!(matches!(
            KdTree::<u32>::with_config(KdTreeConfig::new(3).with_bucket_capacity(0)),
            Err(KdTreeError::InvalidBucketCapacity(0))
        ));

        let tree = KdTree::<u32>::new(3).unwrap();
        assert_eq!(tree.dimensions(), 3);
        assert_eq!(tree.bucket_capacity(), DEFAULT_BUCKET_CAPACITY);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_add_assigns_sequential_indices() {
        let mut tree = KdTree::new(2).unwrap();
        assert_eq!(tree.add(&[0.0, 0.0], 'a').unwrap(), 0);
        assert_eq!(tree.add(&[1.0, 1.0], 'b').unwrap(), 1);
        assert_eq!(tree.add(&[2.0, 2.0], 'c').unwrap(), 2);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_dimension_mismatch_leaves_tree_untouched() {
        let mut tree = KdTree::new(3).unwrap();
        assert!(matches!(
            tree.add(&[1.0, 2.0], 'x'),
            Err(KdTreeError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(tree.is_empty());

        tree.add(&[1.0, 2.0, 3.0], 'a').unwrap();
        assert!(tree.move_point(&[1.0], &'a').is_err());
        assert_eq!(tree.get_point(&'a').unwrap(), vec![1.0, 2.0, 3.0]);

        assert!(tree.nearest_neighbors(&[0.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_remove_by_payload() {
        let mut tree = KdTree::new(1).unwrap();
        tree.add(&[1.0], "one").unwrap();
        tree.add(&[2.0], "two").unwrap();

        assert!(tree.remove(&"one"));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.removal_count(), 1);

        assert!(!tree.remove(&"one"));
        assert_eq!(tree.removal_count(), 1);
    }

    #[test]
    fn test_remove_at_validation() {
        let mut tree = KdTree::new(1).unwrap();
        tree.add(&[1.0], 'a').unwrap();
        tree.add(&[2.0], 'b').unwrap();
        tree.add(&[3.0], 'c').unwrap();

        assert!(matches!(
            tree.remove_at(9),
            Err(KdTreeError::IndexOutOfRange { index: 9 })
        ));

        tree.remove_at(1).unwrap();
        // Slot 1 is now a hole.
        assert!(matches!(
            tree.remove_at(1),
            Err(KdTreeError::IndexOutOfRange { index: 1 })
        ));
        assert!(tree.get_point_at(1).is_err());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_holes_reused_highest_first() {
        let mut tree = KdTree::new(1).unwrap();
        for i in 0..5 {
            tree.add(&[f64::from(i)], i).unwrap();
        }
        tree.remove_at(1).unwrap();
        tree.remove_at(3).unwrap();

        // Highest hole first, then the next one down, then fresh slots.
        assert_eq!(tree.add(&[10.0], 10).unwrap(), 3);
        assert_eq!(tree.add(&[11.0], 11).unwrap(), 1);
        assert_eq!(tree.add(&[12.0], 12).unwrap(), 5);
    }

    #[test]
    fn test_trailing_removal_contracts() {
        let mut tree = KdTree::new(1).unwrap();
        for i in 0..4 {
            tree.add(&[f64::from(i)], i).unwrap();
        }
        // Punch a hole at 2, then remove the tail at 3: both slots must be
        // reclaimed, so the next insert claims index 2.
        tree.remove_at(2).unwrap();
        tree.remove_at(3).unwrap();
        assert_eq!(tree.add(&[9.0], 9).unwrap(), 2);
        assert_eq!(tree.add(&[10.0], 10).unwrap(), 3);
    }

    #[test]
    fn test_get_point_defensive_copies() {
        let mut tree = KdTree::new(2).unwrap();
        tree.add(&[1.0, 2.0], 'a').unwrap();

        let mut copy = tree.get_point(&'a').unwrap();
        copy[0] = 99.0;
        assert_eq!(tree.get_point_at(0).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_move_point_same_leaf_keeps_count() {
        let mut tree = KdTree::new(2).unwrap();
        tree.add(&[1.0, 1.0], 'a').unwrap();
        tree.add(&[2.0, 2.0], 'b').unwrap();

        assert!(tree.move_point(&[1.1, 1.1], &'a').unwrap());
        assert_eq!(tree.removal_count(), 0);
        assert_eq!(tree.get_point(&'a').unwrap(), vec![1.1, 1.1]);
    }

    #[test]
    fn test_move_point_cross_leaf_counts() {
        let mut tree = KdTree::with_config(KdTreeConfig::new(1).with_bucket_capacity(2))
            .unwrap();
        for i in 0..8 {
            tree.add(&[f64::from(i)], i).unwrap();
        }
        assert_eq!(tree.removal_count(), 0);

        // Throw the smallest point past the largest; it must change leaves.
        assert!(tree.move_point(&[100.0], &0).unwrap());
        assert_eq!(tree.removal_count(), 1);
        assert_eq!(tree.len(), 8);
    }

    #[test]
    fn test_move_point_missing_payload() {
        let mut tree = KdTree::new(1).unwrap();
        tree.add(&[1.0], 'a').unwrap();
        assert!(!tree.move_point(&[2.0], &'z').unwrap());
    }

    #[test]
    fn test_iter_ascending_skipping_holes() {
        let mut tree = KdTree::new(1).unwrap();
        for i in 0..5 {
            tree.add(&[f64::from(i)], i).unwrap();
        }
        tree.remove_at(1).unwrap();
        tree.remove_at(3).unwrap();

        let seen: Vec<(usize, i32)> = tree.iter().map(|(i, _, &v)| (i, v)).collect();
        assert_eq!(seen, vec![(0, 0), (2, 2), (4, 4)]);
    }

    #[test]
    fn test_rebuild_resets_count_and_keeps_points() {
        let mut tree = KdTree::with_config(KdTreeConfig::new(1).with_bucket_capacity(2))
            .unwrap();
        for i in 0..10 {
            tree.add(&[f64::from(i)], i).unwrap();
        }
        tree.remove_at(0).unwrap();
        tree.remove_at(9).unwrap();
        assert_eq!(tree.removal_count(), 2);

        tree.rebuild();
        assert_eq!(tree.removal_count(), 0);
        assert_eq!(tree.len(), 8);

        let payloads: Vec<i32> = tree.iter().map(|(_, _, &v)| v).collect();
        assert_eq!(payloads, (1..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_payload_at() {
        let mut tree = KdTree::new(1).unwrap();
        tree.add(&[1.0], "hello").unwrap();
        assert_eq!(tree.payload_at(0).unwrap(), &"hello");
        assert!(tree.payload_at(1).is_err());
    }
}
