use crate::error::{DimensionError, Operand};
use crate::matrix::Matrix;
use crate::validate::validate_rows;

/// A strategy for computing `C = A * B`.
///
/// Implementations must validate both operands before doing any work and
/// return only once `C` is fully populated.
pub trait Multiply {
    /// Short label used in timing reports and logs.
    fn name(&self) -> &'static str;

    /// Largest accepted row or column count.
    fn max_dim(&self) -> usize;

    fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<Matrix, DimensionError>;

    /// Multiplies operands given as nested rows.
    ///
    /// Both operands are fully validated (emptiness, rectangularity, bound,
    /// inner dimensions) before they are packed into dense storage.
    fn multiply_rows(&self, a: &[Vec<f64>], b: &[Vec<f64>]) -> Result<Matrix, DimensionError> {
        validate_rows(a, b, self.max_dim())?;
        let a = Matrix::from_rows(a.to_vec(), Operand::Left)?;
        let b = Matrix::from_rows(b.to_vec(), Operand::Right)?;
        self.multiply(&a, &b)
    }
}
