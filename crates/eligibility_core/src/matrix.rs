//! Dense row-major matrix used to carry a whole batch through each stage.

use crate::errors::{EligibilityError, Result};

/// Row-major `rows × cols` matrix of `f64`
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a zero-filled matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Build a matrix from equally sized rows
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(EligibilityError::Table(format!(
                    "row {i} has {} value(s), expected {cols}",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Ok(Self {
            data,
            rows: n,
            cols,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over rows in order
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Horizontal concatenation: `self` columns followed by `other` columns
    pub fn hstack(&self, other: &Matrix) -> Result<Matrix> {
        if self.rows != other.rows {
            return Err(EligibilityError::Table(format!(
                "cannot concatenate {} row(s) with {} row(s)",
                self.rows, other.rows
            )));
        }
        let cols = self.cols + other.cols;
        let mut data = Vec::with_capacity(self.rows * cols);
        for i in 0..self.rows {
            data.extend_from_slice(self.row(i));
            data.extend_from_slice(other.row(i));
        }
        Ok(Matrix {
            data,
            rows: self.rows,
            cols,
        })
    }

    /// Gather the given column indices, in the given order
    pub fn select_columns(&self, indices: &[usize]) -> Result<Matrix> {
        if let Some(&bad) = indices.iter().find(|&&idx| idx >= self.cols) {
            return Err(EligibilityError::Table(format!(
                "column index {bad} out of range for width {}",
                self.cols
            )));
        }
        let mut data = Vec::with_capacity(self.rows * indices.len());
        for row in self.iter_rows() {
            data.extend(indices.iter().map(|&idx| row[idx]));
        }
        Ok(Matrix {
            data,
            rows: self.rows,
            cols: indices.len(),
        })
    }

    /// Index of the first row holding a NaN or infinite value
    pub fn first_non_finite_row(&self) -> Option<usize> {
        self.iter_rows().position(|row| row.iter().any(|v| !v.is_finite()))
    }
}
