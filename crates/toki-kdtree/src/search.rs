//! Best-first k-nearest-neighbor search.
//!
//! The driver keeps two queues: a min-heap of subtrees keyed by their
//! lower-bound distance to the query, and an interval heap of the best
//! candidates found so far, bounded at the number of results still owed.
//! A subtree is expanded only while its lower bound beats the best
//! unclaimed candidate, so emission can start before the whole tree has
//! been inspected and stops expanding as soon as the bound proves nothing
//! closer remains.

use toki_heap::{BinaryMinHeap, IntervalHeap};
use toki_metric::DistanceFunction;

use crate::node::KdNode;
use crate::tree::KdTree;

/// A single search result: the payload and its distance from the query
/// under the search metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'t, V> {
    /// Distance from the query point under the search metric.
    pub distance: f64,
    /// Stable index of the matched point.
    pub index: usize,
    /// The payload stored with the matched point.
    pub payload: &'t V,
}

/// Iterator over nearest neighbors in non-decreasing distance order.
///
/// Created by [`KdTree::nearest_neighbors`] and
/// [`KdTree::nearest_neighbors_with`]. Yields at most `min(k, live)`
/// results, all within the threshold when one was given. The iterator
/// borrows the tree shared for its whole lifetime; collect eagerly if the
/// tree must be mutated before iteration finishes.
pub struct NearestNeighbors<'t, V, F> {
    tree: &'t KdTree<V>,
    query: Vec<f64>,
    metric: F,
    /// Negative means unbounded.
    threshold: f64,
    requested: usize,
    remaining: usize,
    /// Subtrees not yet expanded, keyed by lower-bound distance.
    pending: BinaryMinHeap<&'t KdNode>,
    /// Best candidates so far, keyed by exact distance, holding stable
    /// indices.
    evaluated: IntervalHeap<usize>,
}

impl<'t, V, F: DistanceFunction> NearestNeighbors<'t, V, F> {
    pub(crate) fn new(
        tree: &'t KdTree<V>,
        query: &[f64],
        k: usize,
        threshold: Option<f64>,
        metric: F,
    ) -> Self {
        let remaining = k.min(tree.root.size());
        let mut pending = BinaryMinHeap::new();
        pending.insert(0.0, &tree.root);
        Self {
            tree,
            query: query.to_vec(),
            metric,
            threshold: threshold.unwrap_or(-1.0),
            requested: k,
            remaining,
            pending,
            evaluated: IntervalHeap::with_capacity(remaining),
        }
    }

    /// Return the iterator to its initial state. The query copy, the
    /// metric, and the heap allocations are all retained.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.evaluated.clear();
        self.remaining = self.requested.min(self.tree.root.size());
        self.pending.insert(0.0, &self.tree.root);
    }

    fn passes_threshold(&self, distance: f64) -> bool {
        self.threshold < 0.0 || distance <= self.threshold
    }

    /// Expand pending subtrees until the nearest unclaimed candidate is
    /// provably closer than every unexpanded subtree.
    fn gather(&mut self) {
        loop {
            let Ok(pending_bound) = self.pending.min_key() else {
                break;
            };
            if let Ok(best) = self.evaluated.min_key() {
                if pending_bound >= best {
                    break;
                }
            }
            let Ok((_, node)) = self.pending.remove_min() else {
                break;
            };
            let leaf = self.descend(node);
            self.evaluate_leaf(leaf);
        }
    }

    /// Walk from `node` to the leaf nearest the query, queueing every
    /// sibling subtree that could still matter.
    fn descend(&mut self, mut node: &'t KdNode) -> &'t KdNode {
        while let Some((dimension, value, left, right)) = node.stem_parts() {
            let (nearer, other) = if self.query[dimension] > value {
                (right, left)
            } else {
                (left, right)
            };
            let bound =
                self.metric
                    .distance_to_box(&self.query, other.min_bound_ref(), other.max_bound_ref());
            if self.passes_threshold(bound) {
                if self.evaluated.len() < self.remaining {
                    self.pending.insert(bound, other);
                } else if let Ok(worst) = self.evaluated.max_key() {
                    if bound <= worst {
                        self.pending.insert(bound, other);
                    }
                }
            }
            node = nearer;
        }
        node
    }

    fn evaluate_leaf(&mut self, leaf: &'t KdNode) {
        let indices = leaf.bucket_slice();
        if leaf.single_point() {
            // Every point in the leaf shares one distance; compute it once.
            let Some(&first) = indices.first() else {
                return;
            };
            let distance = self.metric.distance(&self.tree.points[first], &self.query);
            if !self.passes_threshold(distance) {
                return;
            }
            let admit = self.evaluated.len() < self.remaining
                || self
                    .evaluated
                    .max_key()
                    .map(|worst| distance <= worst)
                    .unwrap_or(true);
            if !admit {
                return;
            }
            for &index in indices {
                if self.evaluated.len() == self.remaining {
                    let _ = self.evaluated.replace_max(distance, index);
                } else {
                    self.evaluated.insert(distance, index);
                }
            }
        } else {
            for &index in indices {
                let distance = self.metric.distance(&self.tree.points[index], &self.query);
                if !self.passes_threshold(distance) {
                    continue;
                }
                if self.evaluated.len() < self.remaining {
                    self.evaluated.insert(distance, index);
                } else if let Ok(worst) = self.evaluated.max_key() {
                    if distance < worst {
                        let _ = self.evaluated.replace_max(distance, index);
                    }
                }
            }
        }
    }
}

impl<'t, V, F: DistanceFunction> Iterator for NearestNeighbors<'t, V, F> {
    type Item = Neighbor<'t, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.gather();
        let (distance, index) = self.evaluated.remove_min().ok()?;
        self.remaining -= 1;
        let payload = self.tree.payloads[index].as_ref()?;
        Some(Neighbor {
            distance,
            index,
            payload,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        // Thresholds can cut the yield anywhere between zero and the
        // remaining budget.
        (0, Some(self.remaining))
    }
}

impl<'t, V, F: DistanceFunction> std::iter::FusedIterator for NearestNeighbors<'t, V, F> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::KdTreeConfig;
    use toki_metric::{SquaredEuclidean, WeightedSquaredEuclidean};

    fn line_tree(n: usize, bucket: usize) -> KdTree<usize> {
        let mut tree =
            KdTree::with_config(KdTreeConfig::new(1).with_bucket_capacity(bucket)).unwrap();
        for i in 0..n {
            tree.add(&[i as f64], i).unwrap();
        }
        tree
    }

    #[test]
    fn test_orders_by_distance() {
        let tree = line_tree(100, 4);
        let got: Vec<usize> = tree
            .nearest_neighbors(&[41.4], 5)
            .unwrap()
            .map(|n| *n.payload)
            .collect();
        assert_eq!(got, vec![41, 42, 40, 43, 39]);
    }

    #[test]
    fn test_distances_are_exact() {
        let tree = line_tree(10, 4);
        let neighbors: Vec<_> = tree.nearest_neighbors(&[3.0], 3).unwrap().collect();
        assert_eq!(neighbors[0].distance, 0.0);
        assert_eq!(neighbors[0].index, 3);
        assert_eq!(neighbors[1].distance, 1.0);
        assert_eq!(neighbors[2].distance, 1.0);
    }

    #[test]
    fn test_yields_at_most_live_count() {
        let tree = line_tree(3, 4);
        let got: Vec<_> = tree.nearest_neighbors(&[0.0], 10).unwrap().collect();
        assert_eq!(got.len(), 3);
    }

    #[test]
    fn test_k_zero_yields_nothing() {
        let tree = line_tree(5, 4);
        assert_eq!(tree.nearest_neighbors(&[0.0], 0).unwrap().count(), 0);
    }

    #[test]
    fn test_threshold_cuts_results() {
        let tree = line_tree(100, 4);
        // Squared distance 4 covers offsets up to 2.
        let got: Vec<usize> = tree
            .nearest_neighbors_with(&[50.0], 100, Some(4.0), SquaredEuclidean)
            .unwrap()
            .map(|n| *n.payload)
            .collect();
        assert_eq!(got.len(), 5);
        assert!(got.contains(&48) && got.contains(&52));
    }

    #[test]
    fn test_negative_threshold_means_unbounded() {
        let tree = line_tree(10, 4);
        let got: Vec<_> = tree
            .nearest_neighbors_with(&[0.0], 10, Some(-1.0), SquaredEuclidean)
            .unwrap()
            .collect();
        assert_eq!(got.len(), 10);
    }

    #[test]
    fn test_weighted_metric_changes_order() {
        let mut tree = KdTree::new(2).unwrap();
        tree.add(&[3.0, 0.0], 'x').unwrap();
        tree.add(&[0.0, 4.0], 'y').unwrap();

        // Unweighted, 'x' is nearer to the origin.
        let first = tree
            .nearest_neighbors(&[0.0, 0.0], 1)
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(*first.payload, 'x');

        // Penalize the x axis and 'y' wins.
        let metric = WeightedSquaredEuclidean::new(vec![10.0, 1.0]).unwrap();
        let first = tree
            .nearest_neighbors_with(&[0.0, 0.0], 1, None, metric)
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(*first.payload, 'y');
    }

    #[test]
    fn test_metric_validation_runs_before_search() {
        let tree = line_tree(4, 4);
        let metric = WeightedSquaredEuclidean::new(vec![1.0, 1.0]).unwrap();
        assert!(tree
            .nearest_neighbors_with(&[0.0], 1, None, metric)
            .is_err());
    }

    #[test]
    fn test_reset_replays_results() {
        let tree = line_tree(50, 4);
        let mut iter = tree.nearest_neighbors(&[10.0], 4).unwrap();
        let first: Vec<usize> = iter.by_ref().map(|n| *n.payload).collect();

        iter.reset();
        let second: Vec<usize> = iter.map(|n| *n.payload).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exhausted_iterator_stays_exhausted() {
        let tree = line_tree(2, 4);
        let mut iter = tree.nearest_neighbors(&[0.0], 5).unwrap();
        assert!(iter.next().is_some());
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_duplicate_positions_all_emitted() {
        let mut tree = KdTree::with_config(KdTreeConfig::new(2).with_bucket_capacity(2))
            .unwrap();
        for i in 0..6 {
            tree.add(&[7.0, 7.0], i).unwrap();
        }
        tree.add(&[9.0, 9.0], 100).unwrap();

        let mut got: Vec<i32> = tree
            .nearest_neighbors(&[7.0, 7.0], 6)
            .unwrap()
            .map(|n| *n.payload)
            .collect();
        got.sort_unstable();
        assert_eq!(got, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_nan_point_does_not_crash_search() {
        let mut tree = KdTree::new(2).unwrap();
        tree.add(&[f64::NAN, 1.0], 'n').unwrap();
        tree.add(&[1.0, 1.0], 'a').unwrap();
        tree.add(&[2.0, 2.0], 'b').unwrap();

        let got: Vec<char> = tree
            .nearest_neighbors_with(&[0.0, 0.0], 3, Some(100.0), SquaredEuclidean)
            .unwrap()
            .map(|n| *n.payload)
            .collect();
        // The NaN point never passes a finite threshold.
        assert_eq!(got, vec!['a', 'b']);
    }
}
