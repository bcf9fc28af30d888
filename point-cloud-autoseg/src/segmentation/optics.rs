/// OPTICS ordering with DBSCAN-style cluster extraction
use crate::control::FitControl;
use crate::error::{ParameterError, Result, SegmentationError};
use crate::segmentation::matrix::AttributeMatrix;
use crate::segmentation::neighbors::NeighborIndex;
use crate::segmentation::params::{ParameterSpec, ParameterValues};
use bevy::log::debug;
use constants::segmentation::{NOISE_LABEL, OPTICS_EPS, OPTICS_MAX_EPS, OPTICS_MIN_SAMPLES};
use rayon::prelude::*;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

pub const PARAMETERS: &[ParameterSpec] = &[
    ParameterSpec::integer("min_samples", "Minimum samples", OPTICS_MIN_SAMPLES),
    ParameterSpec::real("max_eps", "Maximum radius", OPTICS_MAX_EPS),
    ParameterSpec::real("eps", "Extraction radius", OPTICS_EPS),
];

const CORE_BATCH: usize = 2048;

/// Expands the unprocessed row with the smallest reachability, lowest row
/// first on ties. Flat clusters are cut at `eps`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Optics {
    pub min_samples: usize,
    pub max_eps: f64,
    pub eps: f64,
}

impl Default for Optics {
    fn default() -> Self {
        Self {
            min_samples: OPTICS_MIN_SAMPLES as usize,
            max_eps: OPTICS_MAX_EPS,
            eps: OPTICS_EPS,
        }
    }
}

impl TryFrom<&ParameterValues> for Optics {
    type Error = ParameterError;

    fn try_from(params: &ParameterValues) -> std::result::Result<Self, Self::Error> {
        let min_samples = params.integer("min_samples")?;
        if min_samples < 2 {
            return Err(ParameterError::OutOfRange {
                name: "min_samples".to_string(),
                reason: format!("must be at least 2, got {}", min_samples),
            });
        }
        let max_eps = params.real("max_eps")?;
        if max_eps.is_nan() || max_eps <= 0.0 {
            return Err(ParameterError::OutOfRange {
                name: "max_eps".to_string(),
                reason: format!("must be positive, got {}", max_eps),
            });
        }
        let eps = params.real("eps")?;
        if !(eps.is_finite() && eps > 0.0 && eps <= max_eps) {
            return Err(ParameterError::OutOfRange {
                name: "eps".to_string(),
                reason: format!("must be positive and at most max_eps ({}), got {}", max_eps, eps),
            });
        }
        Ok(Self {
            min_samples: min_samples as usize,
            max_eps,
            eps,
        })
    }
}

/// Seed queue entry ordered by reachability, then row index.
#[derive(Debug, Clone, Copy)]
struct Seed {
    reach: f64,
    row: usize,
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Seed {}

impl PartialOrd for Seed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Seed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.reach
            .total_cmp(&other.reach)
            .then(self.row.cmp(&other.row))
    }
}

/// Cluster ordering with per-row reachability and core distances.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticsGraph {
    pub ordering: Vec<usize>,
    pub reachability: Vec<f64>,
    pub core_distances: Vec<f64>,
}

impl Optics {
    fn core_distances(&self, index: &NeighborIndex, control: &FitControl) -> Result<Vec<f64>> {
        let n = index.len();
        control.begin(n, "Computing core distances");
        let rows: Vec<usize> = (0..n).collect();
        let mut core = Vec::with_capacity(n);
        for batch in rows.chunks(CORE_BATCH) {
            if control.is_cancelled() {
                return Err(SegmentationError::Cancelled);
            }
            let distances: Vec<f64> = batch
                .par_iter()
                .map(|&i| {
                    let d = index.kth_distance(i, self.min_samples);
                    if d <= self.max_eps { d } else { f64::INFINITY }
                })
                .collect();
            core.extend(distances);
            control.advance(batch.len());
        }
        Ok(core)
    }

    /// Computes the reachability ordering.
    pub fn graph(&self, matrix: &AttributeMatrix, control: &FitControl) -> Result<OpticsGraph> {
        let n = matrix.rows();
        let index = NeighborIndex::build(matrix);
        let core_distances = self.core_distances(&index, control)?;

        let mut reachability = vec![f64::INFINITY; n];
        let mut processed = vec![false; n];
        let mut ordering = Vec::with_capacity(n);
        let mut seeds = BinaryHeap::new();
        let mut next_unprocessed = 0;

        control.begin(n, "Ordering rows");
        while ordering.len() < n {
            if control.is_cancelled() {
                return Err(SegmentationError::Cancelled);
            }

            // Stale heap entries are skipped lazily.
            let mut picked = None;
            while let Some(Reverse(seed)) = seeds.pop() {
                let Seed { reach, row } = seed;
                if !processed[row] && reach == reachability[row] {
                    picked = Some(row);
                    break;
                }
            }
            let row = match picked {
                Some(row) => row,
                None => {
                    while processed[next_unprocessed] {
                        next_unprocessed += 1;
                    }
                    next_unprocessed
                }
            };

            processed[row] = true;
            ordering.push(row);
            control.advance(1);

            let core = core_distances[row];
            if core.is_infinite() {
                continue;
            }
            for (neighbour, distance) in index.within(row, self.max_eps) {
                if processed[neighbour] {
                    continue;
                }
                let reach = core.max(distance);
                if reach < reachability[neighbour] {
                    reachability[neighbour] = reach;
                    seeds.push(Reverse(Seed {
                        reach,
                        row: neighbour,
                    }));
                }
            }
        }
        control.finish("Rows ordered");

        Ok(OpticsGraph {
            ordering,
            reachability,
            core_distances,
        })
    }

    /// Flat labels cut from `graph` at `self.eps`.
    pub fn extract(&self, graph: &OpticsGraph) -> Vec<i64> {
        let mut labels = vec![NOISE_LABEL; graph.ordering.len()];
        let mut cluster = NOISE_LABEL;
        for &row in &graph.ordering {
            let far = graph.reachability[row] > self.eps;
            let near_core = graph.core_distances[row] <= self.eps;
            if far && near_core {
                cluster += 1;
            }
            labels[row] = if far && !near_core { NOISE_LABEL } else { cluster };
        }
        labels
    }

    pub fn fit(&self, matrix: &AttributeMatrix, control: &FitControl) -> Result<Vec<i64>> {
        let graph = self.graph(matrix, control)?;
        let labels = self.extract(&graph);
        debug!(
            "OPTICS(min_samples={}, max_eps={}, eps={}) found {} clusters over {} rows",
            self.min_samples,
            self.max_eps,
            self.eps,
            labels.iter().max().map_or(0, |m| m + 1),
            matrix.rows()
        );
        Ok(labels)
    }
}

pub fn check(params: &ParameterValues) -> std::result::Result<(), ParameterError> {
    Optics::try_from(params).map(|_| ())
}

pub fn fit(matrix: &AttributeMatrix, params: &ParameterValues, control: &FitControl) -> Result<Vec<i64>> {
    Optics::try_from(params)?.fit(matrix, control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::dbscan::Dbscan;
    use crate::segmentation::params::ParameterValue;

    fn line(xs: &[f64]) -> AttributeMatrix {
        AttributeMatrix::from_rows(&xs.iter().map(|x| vec![*x, 0.0, 0.0]).collect::<Vec<_>>())
            .unwrap()
    }

    #[test]
    fn ordering_visits_every_row_once() {
        let m = line(&[0.0, 0.1, 0.2, 5.0, 5.1, 5.2, 40.0]);
        let optics = Optics {
            min_samples: 2,
            max_eps: f64::INFINITY,
            eps: 0.5,
        };
        let graph = optics.graph(&m, &FitControl::new()).unwrap();
        let mut seen = graph.ordering.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
        assert_eq!(graph.ordering[0], 0);
        assert!(graph.reachability[0].is_infinite());
        assert!((graph.core_distances[1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn extraction_separates_groups_and_noise() {
        let m = line(&[0.0, 0.1, 0.2, 5.0, 5.1, 5.2, 40.0]);
        let labels = Optics {
            min_samples: 2,
            max_eps: f64::INFINITY,
            eps: 0.5,
        }
        .fit(&m, &FitControl::new())
        .unwrap();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1, -1]);
    }

    #[test]
    fn matches_dbscan_core_partition() {
        let m = line(&[0.0, 0.3, 0.6, 0.9, 3.0, 3.3, 3.6, 9.0, 20.0, 20.2]);
        let optics = Optics {
            min_samples: 2,
            max_eps: 10.0,
            eps: 0.5,
        }
        .fit(&m, &FitControl::new())
        .unwrap();
        let dbscan = Dbscan {
            eps: 0.5,
            min_samples: 2,
        }
        .fit(&m, &FitControl::new())
        .unwrap();
        assert_eq!(optics, dbscan);
    }

    #[test]
    fn eps_above_max_eps_is_rejected() {
        let mut params = ParameterValues::new();
        params.insert("min_samples", ParameterValue::Integer(5));
        params.insert("max_eps", ParameterValue::Real(1.0));
        params.insert("eps", ParameterValue::Real(2.0));
        assert!(matches!(check(&params), Err(ParameterError::OutOfRange { ref name, .. }) if name == "eps"));

        params.insert("max_eps", ParameterValue::Real(f64::INFINITY));
        assert_eq!(
            Optics::try_from(&params).unwrap(),
            Optics {
                min_samples: 5,
                max_eps: f64::INFINITY,
                eps: 2.0
            }
        );
    }

    #[test]
    fn cancellation_aborts_the_ordering() {
        let control = FitControl::new();
        control.cancel();
        assert!(matches!(
            Optics::default().fit(&line(&[0.0, 1.0]), &control),
            Err(SegmentationError::Cancelled)
        ));
    }
}
