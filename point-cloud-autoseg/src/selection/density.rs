/// Gaussian kernel density estimate over 3D points
use crate::control::FitControl;
use crate::error::{SelectionError, SelectionResult};
use bevy::log::debug;
use bevy::math::{DMat3, DVec3};
use constants::selection::DENSITY_DIMENSIONS;
use rayon::prelude::*;
use std::collections::HashSet;

/// Rows evaluated between cancellation checks.
const EVALUATION_BATCH: usize = 4096;

/// Relative determinant below which the kernel covariance is treated as
/// singular (points on a plane or a line).
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Fitted Gaussian KDE with Scott's rule bandwidth and full covariance.
///
/// `density(q) = 1 / (n * sqrt((2pi)^d |H|)) * sum_i exp(-1/2 (q - p_i)' H^-1 (q - p_i))`
/// where `H = cov * n^(-2 / (d + 4))`.
#[derive(Debug, Clone)]
pub struct DensityModel {
    samples: Vec<DVec3>,
    inverse_kernel: DMat3,
    normalisation: f64,
    bandwidth_factor: f64,
}

impl DensityModel {
    /// Fits the estimate over `samples`, which must all be finite.
    pub fn fit(samples: Vec<DVec3>) -> SelectionResult<Self> {
        let n = samples.len();
        let distinct: HashSet<[u64; 3]> = samples
            .iter()
            .map(|p| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()])
            .collect();
        if distinct.len() <= DENSITY_DIMENSIONS {
            return Err(SelectionError::DensityFit(format!(
                "need at least {} distinct points, got {}",
                DENSITY_DIMENSIONS + 1,
                distinct.len()
            )));
        }

        let mean = samples.iter().copied().sum::<DVec3>() / n as f64;
        let mut covariance = DMat3::ZERO;
        for p in &samples {
            let d = *p - mean;
            covariance += DMat3::from_cols(d * d.x, d * d.y, d * d.z);
        }
        covariance *= 1.0 / (n - 1) as f64;

        let bandwidth_factor = (n as f64).powf(-1.0 / (DENSITY_DIMENSIONS as f64 + 4.0));
        let kernel = covariance * (bandwidth_factor * bandwidth_factor);
        let determinant = kernel.determinant();
        let scale = (kernel.x_axis.x + kernel.y_axis.y + kernel.z_axis.z) / 3.0;
        if !determinant.is_finite() || determinant <= SINGULAR_TOLERANCE * scale.powi(3) {
            return Err(SelectionError::DensityFit(
                "point covariance is singular".to_string(),
            ));
        }

        let two_pi = std::f64::consts::TAU;
        let normalisation =
            1.0 / (n as f64 * (two_pi.powi(DENSITY_DIMENSIONS as i32) * determinant).sqrt());

        debug!(
            "Density model fitted over {} points (bandwidth factor {:.4})",
            n, bandwidth_factor
        );

        Ok(Self {
            samples,
            inverse_kernel: kernel.inverse(),
            normalisation,
            bandwidth_factor,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn bandwidth_factor(&self) -> f64 {
        self.bandwidth_factor
    }

    /// Density at a single query point.
    pub fn evaluate(&self, query: DVec3) -> f64 {
        let sum: f64 = self
            .samples
            .iter()
            .map(|p| {
                let d = query - *p;
                (-0.5 * d.dot(self.inverse_kernel * d)).exp()
            })
            .sum();
        sum * self.normalisation
    }

    /// Density at many query points, row aligned with `queries`.
    /// Batches run in parallel; the flag in `control` is checked between
    /// batches.
    pub fn evaluate_many(&self, queries: &[DVec3], control: &FitControl) -> SelectionResult<Vec<f64>> {
        control.begin(queries.len(), "Evaluating density");
        let mut densities = Vec::with_capacity(queries.len());
        for batch in queries.chunks(EVALUATION_BATCH) {
            if control.is_cancelled() {
                return Err(SelectionError::Cancelled);
            }
            let values: Vec<f64> = batch.par_iter().map(|q| self.evaluate(*q)).collect();
            densities.extend(values);
            control.advance(batch.len());
        }
        control.finish("Density evaluated");
        Ok(densities)
    }
}
