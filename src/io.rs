//! Text reading and writing of matrices.
//!
//! Input: one row per line, whitespace-separated numbers, a matrix ends at a
//! blank line or at end of stream. Output: one row per line, values separated
//! by single spaces and printed with one decimal place.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::{parse_error, Error, Operand, Result};
use crate::matrix::Matrix;

/// Line-oriented matrix reader that keeps track of line numbers across
/// consecutive matrices in the same stream.
#[derive(Debug)]
pub struct MatrixReader<R> {
    inner: R,
    line: usize,
}

impl<R: BufRead> MatrixReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, line: 0 }
    }

    /// Reads the next matrix as raw rows. Returns no rows at end of stream.
    ///
    /// Row lengths are not checked here; see [`Matrix::from_rows`].
    pub fn read_rows(&mut self) -> Result<Vec<Vec<f64>>> {
        let mut rows = Vec::new();
        let mut buf = String::new();

        loop {
            buf.clear();
            if self.inner.read_line(&mut buf)? == 0 {
                break;
            }
            self.line += 1;

            if buf.trim().is_empty() {
                break;
            }

            let row = buf
                .split_whitespace()
                .map(|token| {
                    token
                        .parse::<f64>()
                        .map_err(|_| parse_error(self.line, token))
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }

        Ok(rows)
    }

    /// Reads the next matrix and checks it is rectangular.
    pub fn read_matrix(&mut self, operand: Operand) -> Result<Matrix> {
        let rows = self.read_rows()?;
        Ok(Matrix::from_rows(rows, operand)?)
    }
}

/// Reads one matrix (as raw rows) from `reader`.
pub fn read_matrix<R: BufRead>(reader: R) -> Result<Vec<Vec<f64>>> {
    MatrixReader::new(reader).read_rows()
}

/// Reads `A` then `B` from the file at `path`.
///
/// Both matrices are checked for rectangularity; emptiness and compatibility
/// are left to the multiplier.
pub fn read_pair(path: impl AsRef<Path>) -> Result<(Matrix, Matrix)> {
    let path = path.as_ref();
    let file = File::open(path).inspect_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "could not open input file");
    })?;

    let mut reader = MatrixReader::new(BufReader::new(file));
    let a = reader.read_matrix(Operand::Left)?;
    let b = reader.read_matrix(Operand::Right)?;

    tracing::info!(
        path = %path.display(),
        a_rows = a.rows(),
        a_cols = a.cols(),
        b_rows = b.rows(),
        b_cols = b.cols(),
        "read input matrices"
    );
    Ok((a, b))
}

/// Renders `matrix` in the output text format.
pub fn format_matrix(matrix: &Matrix) -> String {
    let mut out = String::with_capacity(matrix.rows() * (matrix.cols() * 8 + 1));
    for i in 0..matrix.rows() {
        for (j, value) in matrix.row(i).iter().enumerate() {
            if j > 0 {
                out.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = write!(out, "{value:.1}");
        }
        out.push('\n');
    }
    out
}

/// Writes `matrix` to `writer` in the output text format.
pub fn write_matrix<W: Write>(mut writer: W, matrix: &Matrix) -> Result<()> {
    writer.write_all(format_matrix(matrix).as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Writes `matrix` to the file at `path`.
///
/// The text is rendered in memory first and written with a single call, so
/// the file is never left holding a partly formatted matrix.
pub fn write_file(path: impl AsRef<Path>, matrix: &Matrix) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, format_matrix(matrix)).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "could not write output file");
        Error::Io(e)
    })?;
    tracing::info!(path = %path.display(), rows = matrix.rows(), cols = matrix.cols(), "wrote result");
    Ok(())
}

/// Console rendering used by the CLI's `--print` flag.
pub fn print_banner(matrix: &Matrix, path: &Path) {
    println!("\n===== Result Matrix C =====");
    print!("{}", format_matrix(matrix));
    println!("===========================\n");
    println!("Result also saved to {}", path.display());
}
