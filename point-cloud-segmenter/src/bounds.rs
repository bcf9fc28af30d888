/// Axis aligned bounds of the loaded points
use rayon::prelude::*;
use serde::Serialize;

/// Rows folded per parallel chunk.
const BOUNDS_CHUNK: usize = 25_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CloudBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl CloudBounds {
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    /// Non-finite coordinates are skipped.
    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return;
        }
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// Bounds of row aligned columns, folded in parallel chunks.
    pub fn from_columns(x: &[f64], y: &[f64], z: &[f64]) -> Self {
        let rows: Vec<usize> = (0..x.len().min(y.len()).min(z.len())).collect();
        rows.par_chunks(BOUNDS_CHUNK)
            .map(|chunk| {
                let mut local = Self::new();
                for &i in chunk {
                    local.update(x[i], y[i], z[i]);
                }
                local
            })
            .reduce_with(Self::merge)
            .unwrap_or_else(Self::new)
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn print(&self) {
        if self.is_empty() {
            println!("Bounds: no finite points");
            return;
        }
        println!("Bounds:");
        println!("  X: {:.2} to {:.2}", self.min_x, self.max_x);
        println!("  Y: {:.2} to {:.2}", self.min_y, self.max_y);
        println!("  Z: {:.2} to {:.2}", self.min_z, self.max_z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_coordinates_do_not_widen_bounds() {
        let bounds = CloudBounds::from_columns(
            &[0.0, f64::NAN, 4.0],
            &[1.0, 100.0, -1.0],
            &[2.0, 2.0, 3.0],
        );
        assert_eq!(bounds.min_x, 0.0);
        assert_eq!(bounds.max_x, 4.0);
        assert_eq!(bounds.max_y, 1.0);
        assert_eq!(bounds.min_z, 2.0);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(CloudBounds::from_columns(&[], &[], &[]).is_empty());
    }
}
