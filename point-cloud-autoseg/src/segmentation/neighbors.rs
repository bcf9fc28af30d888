/// Fixed-radius neighbourhood queries over attribute rows
use crate::control::FitControl;
use crate::error::{Result, SegmentationError};
use crate::segmentation::matrix::{AttributeMatrix, squared_distance};
use kiddo::float::distance::SquaredEuclidean;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use rayon::prelude::*;
use std::num::NonZero;

/// Rows queried between cancellation checks.
const QUERY_BATCH: usize = 2048;

/// Neighbour lookup: a kd-tree for 3 columns, a linear scan otherwise.
pub struct NeighborIndex<'a> {
    matrix: &'a AttributeMatrix,
    tree: Option<ImmutableKdTree<f64, u32, 3, 32>>,
}

impl<'a> NeighborIndex<'a> {
    pub fn build(matrix: &'a AttributeMatrix) -> Self {
        let tree = (matrix.dims() == 3 && !matrix.is_empty()).then(|| {
            let points: Vec<[f64; 3]> = matrix
                .iter_rows()
                .map(|r| [r[0], r[1], r[2]])
                .collect();
            ImmutableKdTree::new_from_slice(&points)
        });
        Self { matrix, tree }
    }

    pub fn len(&self) -> usize {
        self.matrix.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// Rows within Euclidean `radius` of row `i` (inclusive, row `i`
    /// itself included), sorted by row index, with their distances.
    pub fn within(&self, i: usize, radius: f64) -> Vec<(usize, f64)> {
        let query = self.matrix.row(i);
        let radius_sq = radius * radius;

        let mut found: Vec<(usize, f64)> = match &self.tree {
            Some(tree) if radius.is_finite() => {
                // kiddo's radius test is strict; widen it slightly and filter
                // back to `<=` on the exact distance.
                let widened = radius_sq + f64::EPSILON * radius_sq.max(1.0);
                tree.within_unsorted::<SquaredEuclidean>(&[query[0], query[1], query[2]], widened)
                    .into_iter()
                    .map(|nn| nn.item as usize)
                    .map(|j| (j, squared_distance(query, self.matrix.row(j))))
                    .filter(|(_, d)| *d <= radius_sq)
                    .collect()
            }
            _ => (0..self.matrix.rows())
                .map(|j| (j, squared_distance(query, self.matrix.row(j))))
                .filter(|(_, d)| *d <= radius_sq)
                .collect(),
        };
        found.sort_unstable_by_key(|(j, _)| *j);
        found.into_iter().map(|(j, d)| (j, d.sqrt())).collect()
    }

    /// Distance from row `i` to its `k`-th nearest row, counting row `i`
    /// itself as the first. Infinite when fewer than `k` rows exist.
    pub fn kth_distance(&self, i: usize, k: usize) -> f64 {
        let Some(nz_k) = NonZero::new(k) else {
            return 0.0;
        };
        let query = self.matrix.row(i);
        let kth_sq = match &self.tree {
            Some(tree) => tree
                .nearest_n::<SquaredEuclidean>(&[query[0], query[1], query[2]], nz_k)
                .into_iter()
                .map(|nn| squared_distance(query, self.matrix.row(nn.item as usize)))
                .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.max(d))))
                .filter(|_| self.len() >= k),
            None => {
                let mut distances: Vec<f64> = (0..self.len())
                    .map(|j| squared_distance(query, self.matrix.row(j)))
                    .collect();
                distances.sort_unstable_by(f64::total_cmp);
                distances.get(k - 1).copied()
            }
        };
        kth_sq.map_or(f64::INFINITY, f64::sqrt)
    }

    /// Neighbourhoods of every row, computed in parallel batches.
    pub fn all_within(&self, radius: f64, control: &FitControl) -> Result<Vec<Vec<(usize, f64)>>> {
        let n = self.len();
        control.begin(n, "Querying neighbourhoods");
        let mut neighbourhoods = Vec::with_capacity(n);
        let indices: Vec<usize> = (0..n).collect();
        for batch in indices.chunks(QUERY_BATCH) {
            if control.is_cancelled() {
                return Err(SegmentationError::Cancelled);
            }
            let found: Vec<_> = batch.par_iter().map(|&i| self.within(i, radius)).collect();
            neighbourhoods.extend(found);
            control.advance(batch.len());
        }
        Ok(neighbourhoods)
    }
}
