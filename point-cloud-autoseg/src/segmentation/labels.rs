/// Compacted per-row cluster labels
use constants::segmentation::NOISE_LABEL;
use serde::Serialize;
use std::collections::BTreeMap;

/// One label per input row; `-1` is noise and the other labels are
/// contiguous from 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterLabeling {
    labels: Vec<i64>,
}

impl ClusterLabeling {
    /// Renumbers arbitrary method output: every negative label becomes noise
    /// and the remaining labels are mapped to `0..k` in order of their
    /// first appearance.
    pub fn from_raw(raw: Vec<i64>) -> Self {
        let mut remap = BTreeMap::new();
        let labels = raw
            .into_iter()
            .map(|label| {
                if label < 0 {
                    return NOISE_LABEL;
                }
                let next = remap.len() as i64;
                *remap.entry(label).or_insert(next)
            })
            .collect();
        Self { labels }
    }

    /// Labels for `rows` rows where only `kept` rows were clustered; every
    /// other row is noise.
    pub fn scatter(rows: usize, kept: &[usize], fitted: Self) -> Self {
        let mut labels = vec![NOISE_LABEL; rows];
        for (&row, label) in kept.iter().zip(fitted.labels) {
            labels[row] = label;
        }
        Self { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.labels
    }

    pub fn into_inner(self) -> Vec<i64> {
        self.labels
    }

    /// `max(label) + 1`, or 0 when every row is noise.
    pub fn subset_count(&self) -> usize {
        self.labels
            .iter()
            .copied()
            .filter(|l| *l >= 0)
            .max()
            .map_or(0, |m| m as usize + 1)
    }

    pub fn noise_count(&self) -> usize {
        self.labels.iter().filter(|l| **l == NOISE_LABEL).count()
    }

    /// Row count per label in `0..subset_count`.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.subset_count()];
        for label in self.labels.iter().filter(|l| **l >= 0) {
            sizes[*label as usize] += 1;
        }
        sizes
    }
}
