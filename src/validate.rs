//! Operand shape checks run before any multiplication work is dispatched.
//!
//! Checks run in a fixed order: each operand's emptiness and rectangularity
//! (`A` before `B`), the configured size bound, then inner-dimension
//! compatibility. The first violation wins.

use crate::error::{incompatible, DimensionError, Operand};
use crate::matrix::Matrix;

/// Output shape of a validated product: `A` is `m × k`, `B` is `k × n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

/// Checks that every row has the first row's length and returns that length.
///
/// Zero rows is rectangular with zero columns.
pub fn check_rectangular<R: AsRef<[f64]>>(
    rows: &[R],
    operand: Operand,
) -> Result<usize, DimensionError> {
    let Some(first) = rows.first() else {
        return Ok(0);
    };
    let expected = first.as_ref().len();

    match rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.as_ref().len() != expected)
    {
        Some((row, actual)) => Err(DimensionError::NonRectangular {
            operand,
            row,
            expected,
            actual: actual.as_ref().len(),
        }),
        None => Ok(expected),
    }
}

fn check_non_empty(shape: (usize, usize), operand: Operand) -> Result<(), DimensionError> {
    if shape.0 == 0 || shape.1 == 0 {
        return Err(DimensionError::Empty { operand });
    }
    Ok(())
}

fn check_bound(
    shape: (usize, usize),
    operand: Operand,
    max_dim: usize,
) -> Result<(), DimensionError> {
    if shape.0 > max_dim || shape.1 > max_dim {
        return Err(DimensionError::TooLarge {
            operand,
            rows: shape.0,
            cols: shape.1,
            limit: max_dim,
        });
    }
    Ok(())
}

fn check_shapes(
    left: (usize, usize),
    right: (usize, usize),
    max_dim: usize,
) -> Result<Dims, DimensionError> {
    check_non_empty(left, Operand::Left)?;
    check_non_empty(right, Operand::Right)?;
    check_bound(left, Operand::Left, max_dim)?;
    check_bound(right, Operand::Right, max_dim)?;

    if left.1 != right.0 {
        return Err(incompatible(left, right));
    }

    Ok(Dims {
        m: left.0,
        k: left.1,
        n: right.1,
    })
}

/// Validates two dense operands.
///
/// Rectangularity already holds for [`Matrix`], so this covers emptiness,
/// the `max_dim` bound and `A.cols == B.rows`.
pub fn validate(a: &Matrix, b: &Matrix, max_dim: usize) -> Result<Dims, DimensionError> {
    check_shapes(a.shape(), b.shape(), max_dim)
}

/// Shape of one raw operand: no rows, then ragged rows, then no columns.
fn row_shape<R: AsRef<[f64]>>(
    rows: &[R],
    operand: Operand,
) -> Result<(usize, usize), DimensionError> {
    if rows.is_empty() {
        return Err(DimensionError::Empty { operand });
    }
    let shape = (rows.len(), check_rectangular(rows, operand)?);
    check_non_empty(shape, operand)?;
    Ok(shape)
}

/// Validates two operands given as raw row sequences.
///
/// `A` is checked completely before `B`, so the reported operand matches
/// [`validate`] for the same shapes.
pub fn validate_rows<R: AsRef<[f64]>>(
    a: &[R],
    b: &[R],
    max_dim: usize,
) -> Result<Dims, DimensionError> {
    let left = row_shape(a, Operand::Left)?;
    let right = row_shape(b, Operand::Right)?;
    check_shapes(left, right, max_dim)
}
