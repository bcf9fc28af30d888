/// DBSCAN density clustering
use crate::control::FitControl;
use crate::error::{ParameterError, Result, SegmentationError};
use crate::segmentation::matrix::AttributeMatrix;
use crate::segmentation::neighbors::NeighborIndex;
use crate::segmentation::params::{ParameterSpec, ParameterValues};
use bevy::log::debug;
use constants::segmentation::{DBSCAN_EPS, DBSCAN_MIN_SAMPLES, NOISE_LABEL};
use std::collections::VecDeque;

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::real("eps", "Neighbourhood radius", DBSCAN_EPS),
    ParameterSpec::integer("min_samples", "Minimum neighbours", DBSCAN_MIN_SAMPLES),
];

/// A row is core when at least `min_samples` rows (itself included) lie
/// within `eps`. Clusters grow from core rows in row order and border rows
/// join the first cluster that reaches them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    pub eps: f64,
    pub min_samples: usize,
}

impl Default for Dbscan {
    fn default() -> Self {
        Self {
            eps: DBSCAN_EPS,
            min_samples: DBSCAN_MIN_SAMPLES as usize,
        }
    }
}

impl TryFrom<&ParameterValues> for Dbscan {
    type Error = ParameterError;

    fn try_from(params: &ParameterValues) -> std::result::Result<Self, Self::Error> {
        let eps = params.real("eps")?;
        if !(eps.is_finite() && eps > 0.0) {
            return Err(ParameterError::OutOfRange {
                name: "eps".to_string(),
                reason: format!("must be a positive finite radius, got {}", eps),
            });
        }
        let min_samples = params.integer("min_samples")?;
        if min_samples < 1 {
            return Err(ParameterError::OutOfRange {
                name: "min_samples".to_string(),
                reason: format!("must be at least 1, got {}", min_samples),
            });
        }
        Ok(Self {
            eps,
            min_samples: min_samples as usize,
        })
    }
}

impl Dbscan {
    pub fn fit(&self, matrix: &AttributeMatrix, control: &FitControl) -> Result<Vec<i64>> {
        let n = matrix.rows();
        let index = NeighborIndex::build(matrix);
        let neighbourhoods = index.all_within(self.eps, control)?;
        let is_core: Vec<bool> = neighbourhoods
            .iter()
            .map(|hood| hood.len() >= self.min_samples)
            .collect();

        let mut labels = vec![NOISE_LABEL; n];
        let mut cluster = 0i64;
        let mut queue = VecDeque::new();

        control.begin(n, "Expanding clusters");
        for seed in 0..n {
            if labels[seed] != NOISE_LABEL || !is_core[seed] {
                continue;
            }
            if control.is_cancelled() {
                return Err(SegmentationError::Cancelled);
            }

            labels[seed] = cluster;
            queue.push_back(seed);
            while let Some(row) = queue.pop_front() {
                control.advance(1);
                if !is_core[row] {
                    continue;
                }
                for &(neighbour, _) in &neighbourhoods[row] {
                    if labels[neighbour] == NOISE_LABEL {
                        labels[neighbour] = cluster;
                        queue.push_back(neighbour);
                    }
                }
            }
            cluster += 1;
        }
        control.finish("Clusters expanded");

        debug!(
            "DBSCAN(eps={}, min_samples={}) found {} clusters over {} rows",
            self.eps, self.min_samples, cluster, n
        );
        Ok(labels)
    }
}

/// Range checks run at commit time, before any clustering.
pub fn check(params: &ParameterValues) -> std::result::Result<(), ParameterError> {
    Dbscan::try_from(params).map(|_| ())
}

pub fn fit(matrix: &AttributeMatrix, params: &ParameterValues, control: &FitControl) -> Result<Vec<i64>> {
    Dbscan::try_from(params)?.fit(matrix, control)
}
