/// Single point pick under the cursor
use crate::cloud::PointCloud;
use crate::selection::locate::locate;
use crate::selection::projection::ProjectionMatrix;
use bevy::math::DVec2;
use constants::selection::POINT_PICK_RADIUS;
use serde::{Deserialize, Serialize};

/// Selects the one point whose projection is nearest the cursor, provided it
/// lies within `max_radius` screen units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestPointRoi {
    pub x: f64,
    pub y: f64,
    pub max_radius: f64,
}

impl NearestPointRoi {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            max_radius: POINT_PICK_RADIUS,
        }
    }

    pub fn with_radius(mut self, max_radius: f64) -> Self {
        self.max_radius = max_radius;
        self
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Clears the pick; the ROI is undefined until moved again.
    pub fn reset(&mut self) {
        self.x = f64::NAN;
        self.y = f64::NAN;
    }

    pub fn is_defined(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Row aligned mask with at most one `true` entry.
    pub fn contains(&self, points: &PointCloud, matrix: &ProjectionMatrix, chunk_size: usize) -> Vec<bool> {
        let mut mask = vec![false; points.len()];
        if !self.is_defined() {
            return mask;
        }
        if let Ok(found) = locate(points, matrix, self.center(), chunk_size) {
            if found.distance < self.max_radius {
                mask[found.index] = true;
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> PointCloud {
        PointCloud::from_xyz(
            vec![0.0, 10.0, f64::NAN, 20.0],
            vec![0.0, 10.0, 10.0, 20.0],
            vec![0.0, 0.0, 0.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn picks_single_point_within_radius() {
        let roi = NearestPointRoi::new(11.0, 9.0);
        let mask = roi.contains(&cloud(), &ProjectionMatrix::IDENTITY, 2);
        assert_eq!(mask, vec![false, true, false, false]);
    }

    #[test]
    fn nothing_outside_radius() {
        let roi = NearestPointRoi::new(15.0, 15.0).with_radius(2.0);
        let mask = roi.contains(&cloud(), &ProjectionMatrix::IDENTITY, 2);
        assert!(mask.iter().all(|m| !m));
    }

    #[test]
    fn missing_rows_and_undefined_roi_select_nothing() {
        let mut roi = NearestPointRoi::new(f64::NAN, 0.0);
        assert!(!roi.is_defined());
        assert!(roi.contains(&cloud(), &ProjectionMatrix::IDENTITY, 2).iter().all(|m| !m));

        roi.move_to(0.0, 10.0);
        let mask = roi.contains(&cloud(), &ProjectionMatrix::IDENTITY, 2);
        assert!(!mask[2]);

        roi.reset();
        assert!(!roi.is_defined());
    }

    #[test]
    fn state_serialises_as_plain_fields() {
        let roi = NearestPointRoi::new(1.5, 2.5).with_radius(3.0);
        let json = serde_json::to_value(roi).unwrap();
        assert_eq!(json, serde_json::json!({"x": 1.5, "y": 2.5, "max_radius": 3.0}));
    }
}
