/// Row-per-point attribute matrix handed to clustering methods
use crate::error::{Result, SegmentationError};

/// Row-major `rows x dims` matrix built by stacking per-axis columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeMatrix {
    data: Vec<f64>,
    rows: usize,
    dims: usize,
}

impl AttributeMatrix {
    /// Stacks row aligned columns. All columns must have the same length.
    pub fn from_columns(columns: &[&[f64]]) -> Result<Self> {
        let dims = columns.len();
        let rows = columns.first().map_or(0, |c| c.len());
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(SegmentationError::ColumnLengthMismatch {
                expected: rows,
                found: bad.len(),
            });
        }

        let mut data = Vec::with_capacity(rows * dims);
        for row in 0..rows {
            data.extend(columns.iter().map(|c| c[row]));
        }
        Ok(Self { data, rows, dims })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let dims = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * dims);
        for row in rows {
            if row.len() != dims {
                return Err(SegmentationError::ColumnLengthMismatch {
                    expected: dims,
                    found: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            dims,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.dims..(i + 1) * self.dims]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Indices of rows with every value finite.
    pub fn finite_rows(&self) -> Vec<usize> {
        (0..self.rows)
            .filter(|&i| self.row(i).iter().all(|v| v.is_finite()))
            .collect()
    }

    /// New matrix holding the given rows in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.dims);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            data,
            rows: indices.len(),
            dims: self.dims,
        }
    }
}

/// Squared Euclidean distance between two rows of equal width.
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
