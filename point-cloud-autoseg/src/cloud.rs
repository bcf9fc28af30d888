/// Column-oriented point storage shared by the selection tools
use crate::error::{SelectionError, SelectionResult};
use bevy::math::DVec3;

/// Column-oriented point cloud. Row index is the identity of a point for
/// every mask and label produced by this crate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

fn check_aligned(x: usize, y: usize, z: usize) -> SelectionResult<()> {
    match [y, z].into_iter().find(|len| *len != x) {
        Some(found) => Err(SelectionError::ColumnLengthMismatch { expected: x, found }),
        None => Ok(()),
    }
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_xyz(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> SelectionResult<Self> {
        check_aligned(x.len(), y.len(), z.len())?;
        Ok(Self { x, y, z })
    }

    /// Copies host columns into a cloud.
    pub fn try_from_columns(x: &[f64], y: &[f64], z: &[f64]) -> SelectionResult<Self> {
        check_aligned(x.len(), y.len(), z.len())?;
        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            z: z.to_vec(),
        })
    }

    pub fn from_points(points: &[DVec3]) -> Self {
        Self {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            z: points.iter().map(|p| p.z).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn point(&self, index: usize) -> DVec3 {
        DVec3::new(self.x[index], self.y[index], self.z[index])
    }

    /// True when all three coordinates of the row are finite.
    pub fn is_finite_row(&self, index: usize) -> bool {
        self.x[index].is_finite() && self.y[index].is_finite() && self.z[index].is_finite()
    }

    pub fn finite_mask(&self) -> Vec<bool> {
        (0..self.len()).map(|i| self.is_finite_row(i)).collect()
    }

    pub fn finite_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_finite_row(i)).count()
    }

    /// Finite rows as points, in row order.
    pub fn finite_points(&self) -> Vec<DVec3> {
        (0..self.len())
            .filter(|&i| self.is_finite_row(i))
            .map(|i| self.point(i))
            .collect()
    }

    /// Bitwise row equality. Unlike `PartialEq`, two NaN coordinates in the
    /// same slot compare equal, so a cloud with missing values still matches
    /// itself.
    pub fn same_rows(&self, other: &Self) -> bool {
        fn same(a: &[f64], b: &[f64]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(l, r)| l.to_bits() == r.to_bits())
        }
        same(&self.x, &other.x) && same(&self.y, &other.y) && same(&self.z, &other.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_mask_flags_each_missing_coordinate() {
        let cloud = PointCloud::from_xyz(
            vec![0.0, f64::NAN, 1.0, 2.0],
            vec![0.0, 0.0, f64::INFINITY, 2.0],
            vec![0.0, 0.0, 0.0, 2.0],
        )
        .unwrap();
        assert_eq!(cloud.finite_mask(), vec![true, false, false, true]);
        assert_eq!(cloud.finite_count(), 2);
        assert_eq!(cloud.finite_points(), vec![DVec3::ZERO, DVec3::splat(2.0)]);
    }

    #[test]
    fn same_rows_matches_nan_slots() {
        let a = PointCloud::from_xyz(vec![f64::NAN, 1.0], vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        let b = a.clone();
        assert_ne!(a, b);
        assert!(a.same_rows(&b));

        let c = PointCloud::from_xyz(vec![f64::NAN, 1.5], vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        assert!(!a.same_rows(&c));
    }

    #[test]
    fn misaligned_columns_are_rejected() {
        assert!(matches!(
            PointCloud::try_from_columns(&[0.0, 1.0], &[0.0], &[0.0, 1.0]),
            Err(SelectionError::ColumnLengthMismatch { expected: 2, found: 1 })
        ));
        assert!(matches!(
            PointCloud::from_xyz(vec![0.0], vec![0.0], vec![0.0, 1.0]),
            Err(SelectionError::ColumnLengthMismatch { expected: 1, found: 2 })
        ));
        assert!(PointCloud::try_from_columns(&[0.0], &[0.0], &[0.0]).is_ok());
    }
}
