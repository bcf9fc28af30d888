/// Nearest projected point lookup
use crate::cloud::PointCloud;
use crate::error::{SelectionError, SelectionResult};
use crate::selection::projection::{ProjectionMatrix, chunk_ranges};
use bevy::math::{DVec2, DVec3};
use rayon::prelude::*;

/// Row whose projection lies closest to the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Located {
    pub index: usize,
    /// Screen-space distance to the cursor.
    pub distance: f64,
    /// World position of the located row.
    pub position: DVec3,
}

/// Per-chunk reduction state.
#[derive(Debug, Clone, Copy, Default)]
struct ChunkScan {
    best: Option<(usize, f64)>,
    saw_finite: bool,
}

impl ChunkScan {
    /// Closer of two candidates; equal distances resolve to the lower row
    /// index, which makes the reduction independent of evaluation order.
    fn merge(self, other: Self) -> Self {
        let best = match (self.best, other.best) {
            (Some(a), Some(b)) => {
                if b.1 < a.1 || (b.1 == a.1 && b.0 < a.0) {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (a, b) => a.or(b),
        };
        Self {
            best,
            saw_finite: self.saw_finite || other.saw_finite,
        }
    }
}

fn scan_chunk(
    points: &PointCloud,
    matrix: &ProjectionMatrix,
    cursor: DVec2,
    range: std::ops::Range<usize>,
) -> ChunkScan {
    let mut scan = ChunkScan::default();
    for i in range {
        // Non-finite rows are skipped before projection and can never win.
        if !points.is_finite_row(i) {
            continue;
        }
        scan.saw_finite = true;

        let screen = matrix.project_or_nan(points.point(i));
        let distance = screen.distance(cursor);
        if !distance.is_finite() {
            continue;
        }
        // Strict `<` keeps the first row on ties within the chunk.
        if scan.best.is_none_or(|(_, best)| distance < best) {
            scan.best = Some((i, distance));
        }
    }
    scan
}

/// Finds the finite row whose screen projection is closest to `cursor`.
///
/// Rows are scanned in chunks of at most `chunk_size`; chunks are reduced in
/// parallel with ties going to the lowest row index, so the result does not
/// depend on the chunk size.
pub fn locate(
    points: &PointCloud,
    matrix: &ProjectionMatrix,
    cursor: DVec2,
    chunk_size: usize,
) -> SelectionResult<Located> {
    let ranges: Vec<_> = chunk_ranges(points.len(), chunk_size).collect();
    let scan = ranges
        .into_par_iter()
        .map(|range| scan_chunk(points, matrix, cursor, range))
        .reduce(ChunkScan::default, ChunkScan::merge);

    match scan.best {
        Some((index, distance)) => Ok(Located {
            index,
            distance,
            position: points.point(index),
        }),
        None if scan.saw_finite => Err(SelectionError::ProjectionDegenerate),
        None => Err(SelectionError::EmptySelection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn brute_force(points: &PointCloud, m: &ProjectionMatrix, cursor: DVec2) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for i in 0..points.len() {
            if !points.is_finite_row(i) {
                continue;
            }
            let d = m.project_or_nan(points.point(i)).distance(cursor);
            if d.is_finite() && best.is_none_or(|(_, b)| d < b) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }

    fn camera() -> ProjectionMatrix {
        ProjectionMatrix::from_rows([
            [2.0, 0.0, 0.0, 1.0],
            [0.0, 2.0, 0.0, -1.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.1, 1.0],
        ])
    }

    #[test]
    fn cursor_on_projection_returns_that_row() {
        let cloud = PointCloud::from_xyz(
            vec![0.0, 1.0, 4.0, -3.0],
            vec![0.0, 2.0, -1.0, 5.0],
            vec![1.0, 2.0, 3.0, 4.0],
        )
        .unwrap();
        let m = camera();
        let cursor = m.project_point(cloud.point(2)).unwrap();
        let found = locate(&cloud, &m, cursor, 10_000).unwrap();
        assert_eq!(found.index, 2);
        assert_abs_diff_eq!(found.distance, 0.0, epsilon = 1e-12);
        assert_eq!(found.position, cloud.point(2));
    }

    #[test]
    fn non_finite_row_never_wins_even_when_zero_would() {
        // Row 0 would sit exactly under the cursor if NaN were replaced by 0.
        let cloud = PointCloud::from_xyz(
            vec![f64::NAN, 5.0, 9.0],
            vec![0.0, 5.0, 9.0],
            vec![0.0, 0.0, 0.0],
        )
        .unwrap();
        let m = ProjectionMatrix::IDENTITY;
        let found = locate(&cloud, &m, DVec2::ZERO, 1).unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn ties_resolve_to_lowest_index_across_chunks() {
        let cloud = PointCloud::from_xyz(
            vec![3.0, 1.0, -1.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        )
        .unwrap();
        let m = ProjectionMatrix::IDENTITY;
        for chunk in [1, 2, 3, 4] {
            assert_eq!(locate(&cloud, &m, DVec2::ZERO, chunk).unwrap().index, 1);
        }
    }

    #[test]
    fn empty_and_all_missing_clouds_select_nothing() {
        let m = ProjectionMatrix::IDENTITY;
        assert!(matches!(
            locate(&PointCloud::new(), &m, DVec2::ZERO, 10),
            Err(SelectionError::EmptySelection)
        ));

        let missing = PointCloud::from_xyz(vec![f64::NAN], vec![0.0], vec![0.0]).unwrap();
        assert!(matches!(
            locate(&missing, &m, DVec2::ZERO, 10),
            Err(SelectionError::EmptySelection)
        ));
    }

    #[test]
    fn all_degenerate_projections_are_reported() {
        let flatten = ProjectionMatrix::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ]);
        let cloud = PointCloud::from_xyz(vec![1.0, 2.0], vec![1.0, 2.0], vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            locate(&cloud, &flatten, DVec2::ZERO, 10),
            Err(SelectionError::ProjectionDegenerate)
        ));
    }

    proptest! {
        #[test]
        fn result_is_independent_of_chunk_size(
            pts in prop::collection::vec(
                (-50.0f64..50.0, -50.0f64..50.0, 0.0f64..20.0),
                1..60
            ),
            cx in -20.0f64..20.0,
            cy in -20.0f64..20.0,
        ) {
            let cloud = PointCloud::from_xyz(
                pts.iter().map(|p| p.0).collect(),
                pts.iter().map(|p| p.1).collect(),
                pts.iter().map(|p| p.2).collect(),
            )
            .unwrap();
            let m = camera();
            let cursor = DVec2::new(cx, cy);
            let expected = brute_force(&cloud, &m, cursor);
            for chunk in [1, cloud.len(), 10_000] {
                let found = locate(&cloud, &m, cursor, chunk).ok().map(|l| l.index);
                prop_assert_eq!(found, expected);
            }
        }
    }
}
