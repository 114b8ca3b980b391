//! Dense matrix multiplication with a sequential baseline and a bounded
//! multi-threaded engine.
//!
//! Operands are validated once, before any work is dispatched. The parallel
//! engine then splits the output matrix into disjoint `&mut` regions (whole
//! rows, row blocks or 2-D tiles) and hands them to a fixed-size worker pool;
//! `A` and `B` are only ever read.
//!
//! # Example
//!
//! ```
//! use parmul::{Matrix, Multiply, ParallelMultiplier, Sequential, Strategy};
//!
//! let a = Matrix::from_vec(1, 3, vec![1.0, 2.0, 3.0]);
//! let b = Matrix::from_vec(3, 1, vec![1.0, 1.0, 1.0]);
//!
//! let expected = Sequential::new().multiply(&a, &b).unwrap();
//! let parallel = ParallelMultiplier::with_strategy(Strategy::RowBlock).unwrap();
//! let c = parallel.multiply(&a, &b).unwrap();
//!
//! assert_eq!(c, expected);
//! assert_eq!(c.as_slice(), &[6.0]);
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod io;
pub mod matrix;
pub mod parallel;
pub mod sequential;
pub mod traits;
pub mod validate;

pub use config::{Config, Mode};
pub use error::{DimensionError, Error, Operand, Result};
pub use matrix::Matrix;
pub use parallel::{ParallelConfig, ParallelMultiplier, Parallelism, Strategy};
pub use sequential::Sequential;
pub use traits::Multiply;

/// Default bound on either dimension of an operand.
pub const DEFAULT_MAX_DIM: usize = 4096;

/// Default tile side for [`Strategy::Tiled`].
pub const DEFAULT_TILE: usize = 64;

/// Worker count used when hardware concurrency cannot be detected.
pub const FALLBACK_WORKERS: usize = 2;

/// Default tolerance when comparing results.
pub const DEFAULT_EPSILON: f64 = 1e-9;
