//! Single-threaded reference multiplication and the shared cell kernel.
//!
//! Every parallel strategy fills its part of `C` with the same loops defined
//! here, so the sequential path doubles as the oracle for the parallel one.

use crate::diagnostics;
use crate::error::DimensionError;
use crate::matrix::Matrix;
use crate::traits::Multiply;
use crate::validate::validate;
use crate::DEFAULT_MAX_DIM;

/// Computes `C[row][first_col..first_col + out.len()]` into `out`.
///
/// Plain i-j-k order: `C[i][j] = Σ_x A[i][x] * B[x][j]`. When a diagnostics
/// sink is installed and the caller is a pool worker, each written cell is
/// reported with that worker's index.
#[inline]
pub(crate) fn fill_segment(a: &Matrix, b: &Matrix, row: usize, first_col: usize, out: &mut [f64]) {
    let a_row = a.row(row);
    debug_assert!(first_col + out.len() <= b.cols());

    for (offset, cell) in out.iter_mut().enumerate() {
        let j = first_col + offset;
        let mut sum = 0.0;
        for (x, &a_ix) in a_row.iter().enumerate() {
            sum += a_ix * b[(x, j)];
        }
        *cell = sum;
    }

    if diagnostics::enabled() {
        if let Some(worker) = diagnostics::current_worker() {
            diagnostics::record_cells(worker, row, first_col, out);
        }
    }
}

/// Fills a contiguous run of complete rows of `C` starting at `first_row`.
///
/// `out.len()` must be a multiple of `B.cols()`.
#[inline]
pub(crate) fn fill_rows(a: &Matrix, b: &Matrix, first_row: usize, out: &mut [f64]) {
    let n = b.cols();
    debug_assert_eq!(out.len() % n, 0);

    for (offset, c_row) in out.chunks_mut(n).enumerate() {
        fill_segment(a, b, first_row + offset, 0, c_row);
    }
}

/// Naive triple-loop multiplier, no concurrency.
#[derive(Debug, Clone, Copy)]
pub struct Sequential {
    max_dim: usize,
}

impl Sequential {
    pub fn new() -> Self {
        Self {
            max_dim: DEFAULT_MAX_DIM,
        }
    }

    pub fn with_max_dim(max_dim: usize) -> Self {
        Self { max_dim }
    }
}

impl Default for Sequential {
    fn default() -> Self {
        Self::new()
    }
}

impl Multiply for Sequential {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn max_dim(&self) -> usize {
        self.max_dim
    }

    fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<Matrix, DimensionError> {
        let dims = validate(a, b, self.max_dim).inspect_err(|e| {
            tracing::warn!(error = %e, "rejected operands");
        })?;

        let mut c = Matrix::zeros(dims.m, dims.n);
        fill_rows(a, b, 0, c.as_mut_slice());
        Ok(c)
    }
}

/// Multiplies `a` by `b` with [`Sequential`] and the default size bound.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, DimensionError> {
    Sequential::new().multiply(a, b)
}
