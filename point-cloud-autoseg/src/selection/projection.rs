/// Homogeneous projection of world points into screen space
use crate::cloud::PointCloud;
use crate::error::{SelectionError, SelectionResult};
use bevy::math::{DMat4, DVec2, DVec3, Mat4};
use serde::{Deserialize, Serialize};

/// 4x4 homogeneous transform supplied by the viewer for one interaction.
/// Applied as `M * [x, y, z, 1]`, so rows map to output components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[[f64; 4]; 4]", into = "[[f64; 4]; 4]")]
pub struct ProjectionMatrix(DMat4);

impl ProjectionMatrix {
    pub const IDENTITY: Self = Self(DMat4::IDENTITY);

    /// Builds the matrix from row-major rows, the layout viewers export.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self(DMat4::from_cols_array_2d(&rows).transpose())
    }

    /// Widens a single precision camera matrix (e.g. `clip_from_world`).
    pub fn from_mat4(matrix: Mat4) -> Self {
        Self(matrix.as_dmat4())
    }

    pub fn rows(&self) -> [[f64; 4]; 4] {
        self.0.transpose().to_cols_array_2d()
    }

    pub fn matrix(&self) -> DMat4 {
        self.0
    }

    /// Projects one point, failing when the homogeneous w component is zero.
    pub fn project_point(&self, point: DVec3) -> SelectionResult<DVec2> {
        let clip = self.0 * point.extend(1.0);
        if clip.w == 0.0 {
            return Err(SelectionError::ProjectionDegenerate);
        }
        Ok(DVec2::new(clip.x / clip.w, clip.y / clip.w))
    }

    /// Batch variant of [`Self::project_point`]: degenerate points come back
    /// as NaN screen coordinates instead of failing the batch.
    pub fn project_or_nan(&self, point: DVec3) -> DVec2 {
        self.project_point(point).unwrap_or(DVec2::NAN)
    }
}

impl Default for ProjectionMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[[f64; 4]; 4]> for ProjectionMatrix {
    fn from(rows: [[f64; 4]; 4]) -> Self {
        Self::from_rows(rows)
    }
}

impl From<ProjectionMatrix> for [[f64; 4]; 4] {
    fn from(matrix: ProjectionMatrix) -> Self {
        matrix.rows()
    }
}

/// Chunk bounds over `len` rows. A chunk size of zero is treated as one.
pub fn chunk_ranges(len: usize, chunk_size: usize) -> impl Iterator<Item = std::ops::Range<usize>> {
    let step = chunk_size.max(1);
    (0..len.div_ceil(step)).map(move |c| c * step..((c + 1) * step).min(len))
}

/// Projects every row of `points` to screen space, chunk by chunk.
/// Output is row aligned with the input; non-finite source rows and
/// degenerate projections yield NaN.
pub fn project(points: &PointCloud, matrix: &ProjectionMatrix, chunk_size: usize) -> Vec<DVec2> {
    let mut screen = Vec::with_capacity(points.len());
    for range in chunk_ranges(points.len(), chunk_size) {
        screen.extend(range.map(|i| {
            if points.is_finite_row(i) {
                matrix.project_or_nan(points.point(i))
            } else {
                DVec2::NAN
            }
        }));
    }
    screen
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn perspective() -> ProjectionMatrix {
        // w = z, so screen = (x / z, y / z).
        ProjectionMatrix::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ])
    }

    #[test]
    fn perspective_divide_uses_w() {
        let screen = perspective()
            .project_point(DVec3::new(2.0, 4.0, 2.0))
            .unwrap();
        assert_abs_diff_eq!(screen.x, 1.0);
        assert_abs_diff_eq!(screen.y, 2.0);
    }

    #[test]
    fn rows_are_applied_as_rows() {
        let translate = ProjectionMatrix::from_rows([
            [1.0, 0.0, 0.0, 10.0],
            [0.0, 1.0, 0.0, -5.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let screen = translate.project_point(DVec3::new(1.0, 1.0, 1.0)).unwrap();
        assert_eq!(screen, DVec2::new(11.0, -4.0));
        assert_eq!(translate.rows()[0], [1.0, 0.0, 0.0, 10.0]);
    }

    #[test]
    fn zero_w_fails_single_point_but_not_batch() {
        let m = perspective();
        assert!(matches!(
            m.project_point(DVec3::new(1.0, 1.0, 0.0)),
            Err(SelectionError::ProjectionDegenerate)
        ));

        let cloud = PointCloud::from_xyz(vec![1.0, 2.0], vec![1.0, 2.0], vec![0.0, 1.0]).unwrap();
        let screen = project(&cloud, &m, 1);
        assert!(screen[0].is_nan());
        assert_eq!(screen[1], DVec2::new(2.0, 2.0));
    }

    #[test]
    fn chunking_does_not_change_output() {
        let cloud = PointCloud::from_xyz(
            (0..25).map(|i| i as f64).collect(),
            (0..25).map(|i| (i * 2) as f64).collect(),
            (0..25).map(|i| 1.0 + i as f64).collect(),
        )
        .unwrap();
        let m = perspective();
        let whole = project(&cloud, &m, 10_000);
        for chunk in [0, 1, 3, 7, 25] {
            let chunked = project(&cloud, &m, chunk);
            assert_eq!(chunked.len(), whole.len());
            assert!(chunked.iter().zip(&whole).all(|(a, b)| a == b));
        }
    }

    #[test]
    fn chunk_ranges_cover_every_row_once() {
        let ranges: Vec<_> = chunk_ranges(10, 4).collect();
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);
        assert_eq!(chunk_ranges(0, 4).count(), 0);
        assert_eq!(chunk_ranges(3, 0).count(), 3);
    }

    #[test]
    fn matrix_round_trips_through_serde() {
        let m = perspective();
        let json = serde_json::to_string(&m).unwrap();
        let back: ProjectionMatrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }
}
