/// Density based region of interest for 3D region growing
use crate::cloud::PointCloud;
use crate::control::FitControl;
use crate::error::SelectionResult;
use crate::selection::density::DensityModel;
use crate::selection::locate::{Located, locate};
use crate::selection::projection::ProjectionMatrix;
use bevy::log::info;
use bevy::math::{DVec2, DVec3};
use constants::selection::{DENSITY_MATCH_THRESHOLD, PROJECTION_CHUNK_SIZE};
use std::sync::OnceLock;

/// Selects every point whose density matches the density at the point
/// picked under the cursor.
///
/// The model is fitted once in [`DensityRoi::build`]; moving the cursor or
/// swapping the projection never refits it.
#[derive(Debug)]
pub struct DensityRoi {
    cursor: DVec2,
    projection: ProjectionMatrix,
    cloud: PointCloud,
    finite: Vec<bool>,
    model: DensityModel,
    /// Density of every fitted row (NaN for excluded rows), filled on the
    /// first containment query.
    fitted_density: OnceLock<Vec<f64>>,
    chunk_size: usize,
    control: FitControl,
}

impl DensityRoi {
    /// Fits the density model over the finite rows of `cloud`.
    pub fn build(cloud: PointCloud, cursor: DVec2, projection: ProjectionMatrix) -> SelectionResult<Self> {
        let finite = cloud.finite_mask();
        let model = DensityModel::fit(cloud.finite_points())?;
        info!(
            "Density ROI built over {}/{} finite points",
            model.sample_count(),
            cloud.len()
        );
        Ok(Self {
            cursor,
            projection,
            cloud,
            finite,
            model,
            fitted_density: OnceLock::new(),
            chunk_size: PROJECTION_CHUNK_SIZE,
            control: FitControl::new(),
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_control(mut self, control: FitControl) -> Self {
        self.control = control;
        self
    }

    /// Moves the pick location. The fitted model is kept.
    pub fn set_cursor(&mut self, cursor: DVec2) {
        self.cursor = cursor;
    }

    pub fn set_projection(&mut self, projection: ProjectionMatrix) {
        self.projection = projection;
    }

    pub fn cursor(&self) -> DVec2 {
        self.cursor
    }

    pub fn projection(&self) -> &ProjectionMatrix {
        &self.projection
    }

    pub fn model(&self) -> &DensityModel {
        &self.model
    }

    /// Rows the model was fitted from.
    pub fn cloud(&self) -> &PointCloud {
        &self.cloud
    }

    pub fn finite_mask(&self) -> &[bool] {
        &self.finite
    }

    pub fn is_defined(&self) -> bool {
        self.cursor.is_finite()
    }

    /// Fitted point nearest to the cursor under the current projection.
    pub fn picked(&self) -> SelectionResult<Located> {
        locate(&self.cloud, &self.projection, self.cursor, self.chunk_size)
    }

    fn fitted_density(&self) -> SelectionResult<&[f64]> {
        if let Some(cached) = self.fitted_density.get() {
            return Ok(cached);
        }
        let densities = self.densities_for(&self.cloud, &self.finite)?;
        Ok(self.fitted_density.get_or_init(|| densities))
    }

    fn densities_for(&self, cloud: &PointCloud, finite: &[bool]) -> SelectionResult<Vec<f64>> {
        let queries: Vec<DVec3> = cloud.finite_points();
        let mut finite_values = self.model.evaluate_many(&queries, &self.control)?.into_iter();
        Ok(finite
            .iter()
            .map(|&keep| {
                if keep {
                    finite_values.next().unwrap_or(f64::NAN)
                } else {
                    f64::NAN
                }
            })
            .collect())
    }

    /// Row aligned membership mask for `points`.
    ///
    /// Rows with a non-finite coordinate are always `false`. When `points`
    /// are the fitted rows the cached densities are reused.
    pub fn contains(&self, points: &PointCloud) -> SelectionResult<Vec<bool>> {
        let picked = self.picked()?;
        let fitted = self.fitted_density()?;
        let reference = fitted[picked.index];

        let fresh;
        let (densities, finite): (&[f64], Vec<bool>) = if points.same_rows(&self.cloud) {
            (fitted, self.finite.clone())
        } else {
            let finite = points.finite_mask();
            fresh = self.densities_for(points, &finite)?;
            (fresh.as_slice(), finite)
        };

        Ok(densities
            .iter()
            .zip(&finite)
            .map(|(density, &keep)| keep && (density - reference).abs() < DENSITY_MATCH_THRESHOLD)
            .collect())
    }
}
