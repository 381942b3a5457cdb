//! Dense row-major `f64` matrix used for the transition and emission tables.

use serde::{Deserialize, Serialize};

use crate::error::{HmmError, Result};

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// A `rows x cols` matrix filled with `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// A `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Build from nested rows; all rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for row in rows {
            if row.len() != cols {
                return Err(HmmError::ShapeMismatch {
                    what: "matrix row",
                    expected: (1, cols),
                    found: (1, row.len()),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            rows: n,
            cols,
            data,
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Cell `(i, j)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// Overwrite cell `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    /// Row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterator over rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics
        self.data.chunks_exact(self.cols.max(1))
    }

    /// Backing storage, row-major.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable backing storage, row-major.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Apply `f` to every cell.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for (j, &v) in self.row(i).iter().enumerate() {
                out.data[j * self.rows + i] = v;
            }
        }
        out
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        self.iter_rows().take(self.rows).map(|r| r.iter().sum()).collect()
    }

    /// Check that the declared shape matches the backing storage and the
    /// expected dimensions.
    pub fn check_shape(&self, what: &'static str, expected: (usize, usize)) -> Result<()> {
        let stored = self.rows.checked_mul(self.cols);
        if self.shape() != expected || stored != Some(self.data.len()) {
            return Err(HmmError::ShapeMismatch {
                what,
                expected,
                found: self.shape(),
            });
        }
        Ok(())
    }

    /// Check that every cell is a finite probability in `(0, 1]`.
    pub fn check_probabilities(&self, what: &'static str) -> Result<()> {
        for (k, &value) in self.data.iter().enumerate() {
            if !(value.is_finite() && value > 0.0 && value <= 1.0) {
                return Err(HmmError::InvalidProbability {
                    matrix: what,
                    row: k / self.cols.max(1),
                    col: k % self.cols.max(1),
                    value,
                });
            }
        }
        Ok(())
    }
}
