//! Dense row-major `f64` matrix used by every kernel in this crate.
//!
//! Adjacency, longest-path and separation matrices all share this type. Values
//! are plain `f64` so that 0/1 adjacency, integer path lengths and signed
//! squared separations flow through the same operations without conversion.
//!
//! Serialized form is a list of rows (`[[0, 1], [0, 0]]`), which is also the
//! fixture format used by the harness.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{CausetError, Result};

/// Row-major dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// All-zero matrix.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(CausetError::ShapeMismatch {
                what: "buffer",
                expected: format!("{} entries", rows * cols),
                found: format!("{} entries", data.len()),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows. Every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(CausetError::ShapeMismatch {
                    what: "row",
                    expected: format!("{n_cols} columns"),
                    found: format!("{} columns in row {i}", row.len()),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Node count of a square matrix, or `NotSquare`.
    pub fn square_dim(&self) -> Result<usize> {
        if self.is_square() {
            Ok(self.rows)
        } else {
            Err(CausetError::NotSquare {
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row.
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Flat row-major view.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copy out as nested rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        if self.cols == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.data.chunks(self.cols).map(<[f64]>::to_vec).collect()
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        out
    }

    /// Matrix product `self · other`.
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        if self.cols != other.rows {
            return Err(CausetError::ShapeMismatch {
                what: "matmul operands",
                expected: format!("{} rows on the right", self.cols),
                found: format!("{}x{}", other.rows, other.cols),
            });
        }
        let mut out = Self::zeros(self.rows, other.cols);
        gemm(
            &self.data,
            &other.data,
            &mut out.data,
            self.cols,
            other.cols,
        );
        Ok(out)
    }

    /// Apply `f` to every entry.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two same-shape matrices entry by entry.
    pub(crate) fn zip_map(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        debug_assert_eq!((self.rows, self.cols), (other.rows, other.cols));
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// 0/1 indicator of strictly positive entries.
    #[must_use]
    pub fn support(&self) -> Self {
        self.map(|v| if v > 0.0 { 1.0 } else { 0.0 })
    }

    /// Clamp entries above 1 down to 1.
    #[must_use]
    pub fn saturate(&self) -> Self {
        self.map(|v| if v > 1.0 { 1.0 } else { v })
    }

    /// Elementwise maximum.
    #[must_use]
    pub fn max_with(&self, other: &Self) -> Self {
        self.zip_map(other, f64::max)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Largest entry, 0 for an empty matrix.
    #[must_use]
    pub fn max_entry(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    /// Indices `x` in `0..rows` with `self[x, col] > 0`.
    pub(crate) fn positive_in_col(&self, col: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.rows).filter(move |&x| self.get(x, col) > 0.0)
    }
}

impl Index<(usize, usize)> for DenseMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[row * self.cols + col]
    }
}

impl TryFrom<Vec<Vec<f64>>> for DenseMatrix {
    type Error = CausetError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(rows)
    }
}

impl From<DenseMatrix> for Vec<Vec<f64>> {
    fn from(m: DenseMatrix) -> Self {
        m.to_rows()
    }
}

/// `c += a · b` for row-major buffers; `a` is `m x k`, `b` is `k x n`.
///
/// Zero entries of `a` are skipped, which is most of them for 0/1 adjacency.
#[cfg(not(feature = "parallel"))]
fn gemm(a: &[f64], b: &[f64], c: &mut [f64], k: usize, n: usize) {
    if n == 0 {
        return;
    }
    for (i, c_row) in c.chunks_mut(n).enumerate() {
        gemm_row(&a[i * k..(i + 1) * k], b, c_row, n);
    }
}

/// Row-parallel variant: each output row is owned by exactly one task.
#[cfg(feature = "parallel")]
fn gemm(a: &[f64], b: &[f64], c: &mut [f64], k: usize, n: usize) {
    use rayon::prelude::*;

    if n == 0 {
        return;
    }
    c.par_chunks_mut(n).enumerate().for_each(|(i, c_row)| {
        gemm_row(&a[i * k..(i + 1) * k], b, c_row, n);
    });
}

#[inline]
fn gemm_row(a_row: &[f64], b: &[f64], c_row: &mut [f64], n: usize) {
    for (p, &a_ip) in a_row.iter().enumerate() {
        if a_ip == 0.0 {
            continue;
        }
        let b_row = &b[p * n..(p + 1) * n];
        for (c_ij, &b_pj) in c_row.iter_mut().zip(b_row) {
            *c_ij += a_ip * b_pj;
        }
    }
}
