//! Error types for parmul operations.
//!
//! Shape problems are reported through [`DimensionError`] before any work is
//! dispatched. Everything else the crate can fail on (reading input, building
//! the worker pool, loading configuration) is folded into [`Error`].

use std::fmt;

use thiserror::Error;

/// Which side of the product an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// The left operand, `A`.
    Left,
    /// The right operand, `B`.
    Right,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Left => f.write_str("A"),
            Operand::Right => f.write_str("B"),
        }
    }
}

/// Shape violations detected by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DimensionError {
    /// The operand has no rows (or no columns).
    #[error("empty operand: matrix {operand} has no elements")]
    Empty { operand: Operand },

    /// A row's length differs from the first row's length.
    #[error(
        "non-rectangular operand: row {row} of matrix {operand} has {actual} columns, expected {expected}"
    )]
    NonRectangular {
        operand: Operand,
        /// Zero-based index of the first offending row.
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// `A.cols != B.rows`.
    #[error(
        "incompatible inner dimensions: A is {a_rows}x{a_cols}, B is {b_rows}x{b_cols} (expected B to have {a_cols} rows, found {b_rows})"
    )]
    Incompatible {
        a_rows: usize,
        a_cols: usize,
        b_rows: usize,
        b_cols: usize,
    },

    /// A dimension exceeds the configured bound.
    #[error("matrix {operand} is {rows}x{cols}, which exceeds the {limit} dimension limit")]
    TooLarge {
        operand: Operand,
        rows: usize,
        cols: usize,
        limit: usize,
    },
}

/// Errors that can occur anywhere in parmul.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Dimension(#[from] DimensionError),

    /// A token in the input could not be read as a number.
    #[error("parse error on line {line}: invalid number `{token}`")]
    Parse {
        /// One-based line number in the input stream.
        line: usize,
        token: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid configuration: {message}")]
    Config { message: String },
}

/// Result type alias for parmul operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Creates an inner-dimension mismatch error.
pub fn incompatible(left: (usize, usize), right: (usize, usize)) -> DimensionError {
    DimensionError::Incompatible {
        a_rows: left.0,
        a_cols: left.1,
        b_rows: right.0,
        b_cols: right.1,
    }
}

/// Creates a parse error for `token` on the given one-based line.
pub fn parse_error(line: usize, token: impl Into<String>) -> Error {
    Error::Parse {
        line,
        token: token.into(),
    }
}

/// Creates a configuration error.
pub fn config_error(message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_display() {
        let error = incompatible((2, 3), (2, 2));
        let display = format!("{}", error);
        assert!(display.contains("incompatible inner dimensions"));
        assert!(display.contains("A is 2x3"));
        assert!(display.contains("B is 2x2"));
        assert!(display.contains("expected B to have 3 rows, found 2"));
    }

    #[test]
    fn test_non_rectangular_display() {
        let error = DimensionError::NonRectangular {
            operand: Operand::Right,
            row: 2,
            expected: 3,
            actual: 1,
        };
        let display = format!("{}", error);
        assert!(display.contains("non-rectangular operand"));
        assert!(display.contains("row 2 of matrix B"));
        assert!(display.contains("has 1 columns, expected 3"));
    }

    #[test]
    fn test_empty_display() {
        let error = DimensionError::Empty {
            operand: Operand::Left,
        };
        assert_eq!(
            format!("{}", error),
            "empty operand: matrix A has no elements"
        );
    }

    #[test]
    fn test_parse_error_display() {
        let error = parse_error(4, "1.x");
        let display = format!("{}", error);
        assert!(display.contains("line 4"));
        assert!(display.contains("`1.x`"));
    }

    #[test]
    fn test_dimension_error_is_transparent() {
        let inner = incompatible((1, 2), (3, 1));
        let outer: Error = inner.clone().into();
        assert_eq!(format!("{}", outer), format!("{}", inner));
        assert!(matches!(outer, Error::Dimension(DimensionError::Incompatible { .. })));
    }

    #[test]
    fn test_error_equality() {
        let error1 = incompatible((2, 3), (2, 2));
        let error2 = incompatible((2, 3), (2, 2));
        let error3 = incompatible((2, 3), (4, 2));

        assert_eq!(error1, error2);
        assert_ne!(error1, error3);
    }
}
