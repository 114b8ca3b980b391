//! Multi-threaded multiplication on a bounded worker pool.
//!
//! Three partitioning strategies share one kernel and one parallelism degree.
//! Each strategy hands at most `degree` tasks to the pool at a time; the pool
//! has `degree` threads and may run several queued tasks on one thread, so a
//! task is not the same as an OS worker.
//!
//! - [`Strategy::RowPerTask`]: one logical task per output row. Rows are
//!   pulled from a shared queue by at most `min(m, degree)` drain tasks, so
//!   the OS thread count stays bounded whatever the matrix size.
//! - [`Strategy::RowBlock`]: exactly `min(m, degree)` tasks, each owning a
//!   contiguous block of at most `ceil(m / workers)` rows.
//! - [`Strategy::Tiled`]: fixed-size 2-D tiles dispatched in waves of at most
//!   `degree` tasks; each wave is joined before the next one starts.
//!
//! Workers read `A` and `B` through shared references and write only to the
//! `&mut` region they were handed, so `C` needs no lock. Every strategy returns
//! after its last scope has joined.
//!
//! # Example
//!
//! ```
//! use parmul::{Matrix, Multiply, ParallelConfig, ParallelMultiplier, Strategy};
//!
//! let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
//! let b = Matrix::from_vec(2, 2, vec![5.0, 6.0, 7.0, 8.0]);
//!
//! let config = ParallelConfig {
//!     strategy: Strategy::Tiled,
//!     ..ParallelConfig::default()
//! };
//! let multiplier = ParallelMultiplier::new(config).unwrap();
//! let c = multiplier.multiply(&a, &b).unwrap();
//! assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
//! ```

pub mod partition;
pub mod pool;

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;

use crate::error::{config_error, DimensionError, Error, Result};
use crate::matrix::Matrix;
use crate::sequential::{fill_rows, fill_segment};
use crate::traits::Multiply;
use crate::validate::{validate, Dims};
use crate::DEFAULT_MAX_DIM;

use partition::{row_blocks, split_row_blocks, tile_count, tiles, Tile};
pub use partition::TileShape;
pub use pool::{detected_parallelism, Parallelism, WorkerPool};

/// How the output matrix is divided among workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    RowPerTask,
    #[default]
    RowBlock,
    Tiled,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::RowPerTask, Strategy::RowBlock, Strategy::Tiled];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::RowPerTask => "row-per-task",
            Strategy::RowBlock => "row-block",
            Strategy::Tiled => "tiled",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                config_error(format!(
                    "unknown strategy `{s}` (expected row-per-task, row-block or tiled)"
                ))
            })
    }
}

/// Settings for a [`ParallelMultiplier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelConfig {
    pub strategy: Strategy,
    pub parallelism: Parallelism,
    /// Only used by [`Strategy::Tiled`].
    pub tile: TileShape,
    pub max_dim: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            parallelism: Parallelism::Auto,
            tile: TileShape::default(),
            max_dim: DEFAULT_MAX_DIM,
        }
    }
}

/// Computes `C = A * B` on a fixed-size pool using one [`Strategy`].
#[derive(Debug)]
pub struct ParallelMultiplier {
    pool: WorkerPool,
    config: ParallelConfig,
    tasks_dispatched: AtomicUsize,
}

impl ParallelMultiplier {
    /// Builds the worker pool. Fails if the tile shape has a zero side or the
    /// pool cannot be started.
    pub fn new(config: ParallelConfig) -> Result<Self> {
        if config.tile.rows == 0 || config.tile.cols == 0 {
            return Err(config_error(format!(
                "tile shape must be non-zero, got {}x{}",
                config.tile.rows, config.tile.cols
            )));
        }

        let pool = WorkerPool::with_parallelism(config.parallelism)?;
        Ok(Self {
            pool,
            config,
            tasks_dispatched: AtomicUsize::new(0),
        })
    }

    pub fn with_strategy(strategy: Strategy) -> Result<Self> {
        Self::new(ParallelConfig {
            strategy,
            ..ParallelConfig::default()
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.config.strategy
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// The resolved parallelism degree.
    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Tasks in the pool at once for an output with `m` rows and `n` columns.
    pub fn planned_workers(&self, m: usize, n: usize) -> usize {
        let degree = self.pool.size();
        match self.config.strategy {
            Strategy::RowPerTask => degree.min(m).max(1),
            Strategy::RowBlock => row_blocks(m, degree).workers,
            Strategy::Tiled => degree.min(tile_count(m, n, self.config.tile)).max(1),
        }
    }

    /// Total tasks handed to the pool over this multiplier's lifetime.
    pub fn tasks_dispatched(&self) -> usize {
        self.tasks_dispatched.load(Ordering::Relaxed)
    }

    fn count_task(&self) {
        self.tasks_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    fn row_per_task(&self, a: &Matrix, b: &Matrix, dims: Dims, c: &mut [f64]) {
        let workers = self.planned_workers(dims.m, dims.n);
        let queue = Mutex::new(c.chunks_mut(dims.n).enumerate());

        tracing::debug!(rows = dims.m, workers, "dispatching row-per-task");

        self.pool.scope(|s| {
            let queue = &queue;
            for _ in 0..workers {
                s.spawn(move |_| loop {
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                    let Some((i, c_row)) = next else {
                        break;
                    };
                    fill_segment(a, b, i, 0, c_row);
                });
            }
        });
        self.tasks_dispatched.fetch_add(dims.m, Ordering::Relaxed);
    }

    fn row_block(&self, a: &Matrix, b: &Matrix, dims: Dims, c: &mut [f64]) {
        let plan = row_blocks(dims.m, self.pool.size());

        tracing::debug!(
            rows = dims.m,
            workers = plan.workers,
            max_block_rows = plan.max_rows(),
            "dispatching row blocks"
        );

        self.pool.scope(|s| {
            for (first_row, block) in split_row_blocks(c, dims.n, plan) {
                self.count_task();
                s.spawn(move |_| fill_rows(a, b, first_row, block));
            }
        });
    }

    fn tiled(&self, a: &Matrix, b: &Matrix, dims: Dims, c: &mut [f64]) {
        let budget = self.pool.size();
        let mut pending = tiles(c, dims.n, self.config.tile).into_iter();
        let mut waves = 0usize;

        loop {
            let wave: Vec<Tile<'_>> = pending.by_ref().take(budget).collect();
            if wave.is_empty() {
                break;
            }
            waves += 1;

            self.pool.scope(|s| {
                for tile in wave {
                    self.count_task();
                    s.spawn(move |_| fill_tile(a, b, tile));
                }
            });
        }

        tracing::debug!(
            tile_rows = self.config.tile.rows,
            tile_cols = self.config.tile.cols,
            budget,
            waves,
            "tiled multiplication joined"
        );
    }
}

fn fill_tile(a: &Matrix, b: &Matrix, tile: Tile<'_>) {
    let Tile { row, col, segments } = tile;
    for (offset, segment) in segments.into_iter().enumerate() {
        fill_segment(a, b, row + offset, col, segment);
    }
}

impl Multiply for ParallelMultiplier {
    fn name(&self) -> &'static str {
        match self.config.strategy {
            Strategy::RowPerTask => "parallel/row-per-task",
            Strategy::RowBlock => "parallel/row-block",
            Strategy::Tiled => "parallel/tiled",
        }
    }

    fn max_dim(&self) -> usize {
        self.config.max_dim
    }

    fn multiply(&self, a: &Matrix, b: &Matrix) -> std::result::Result<Matrix, DimensionError> {
        let dims = validate(a, b, self.config.max_dim).inspect_err(|e| {
            tracing::warn!(error = %e, strategy = %self.config.strategy, "rejected operands");
        })?;

        let mut c = Matrix::zeros(dims.m, dims.n);
        let out = c.as_mut_slice();
        match self.config.strategy {
            Strategy::RowPerTask => self.row_per_task(a, b, dims, out),
            Strategy::RowBlock => self.row_block(a, b, dims, out),
            Strategy::Tiled => self.tiled(a, b, dims, out),
        }
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::incompatible;
    use crate::sequential;
    use std::num::NonZeroUsize;

    fn multiplier(strategy: Strategy, workers: usize, tile: usize) -> ParallelMultiplier {
        ParallelMultiplier::new(ParallelConfig {
            strategy,
            parallelism: Parallelism::Fixed(NonZeroUsize::new(workers).unwrap()),
            tile: TileShape {
                rows: tile,
                cols: tile,
            },
            max_dim: DEFAULT_MAX_DIM,
        })
        .unwrap()
    }

    fn sample(rows: usize, cols: usize, seed: usize) -> Matrix {
        Matrix::from_fn(rows, cols, |i, j| ((i * 31 + j * 17 + seed) % 23) as f64 / 4.0 - 2.5)
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("row-per-task".parse::<Strategy>().unwrap(), Strategy::RowPerTask);
        assert_eq!("row-block".parse::<Strategy>().unwrap(), Strategy::RowBlock);
        assert_eq!("tiled".parse::<Strategy>().unwrap(), Strategy::Tiled);
        assert!(matches!("blocks".parse::<Strategy>(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_two_by_two_all_strategies() {
        let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let b = Matrix::from_vec(2, 2, vec![5.0, 6.0, 7.0, 8.0]);
        for strategy in Strategy::ALL {
            let c = multiplier(strategy, 4, 1).multiply(&a, &b).unwrap();
            assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0], "{strategy}");
        }
    }

    #[test]
    fn test_matches_sequential_on_odd_shapes() {
        let shapes = [(1, 1, 1), (1, 3, 1), (7, 5, 3), (13, 9, 17), (33, 8, 65)];
        for (m, k, n) in shapes {
            let a = sample(m, k, 1);
            let b = sample(k, n, 2);
            let expected = sequential::multiply(&a, &b).unwrap();
            for strategy in Strategy::ALL {
                for workers in [1, 2, 3, 8] {
                    let c = multiplier(strategy, workers, 4).multiply(&a, &b).unwrap();
                    assert!(
                        c.approx_eq(&expected, 1e-9),
                        "{strategy} with {workers} workers differs for {m}x{k}x{n}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_single_row_clamps_workers() {
        let mm = multiplier(Strategy::RowBlock, 8, 64);
        assert_eq!(mm.planned_workers(1, 1), 1);

        let a = Matrix::from_vec(1, 3, vec![1.0, 2.0, 3.0]);
        let b = Matrix::from_vec(3, 1, vec![1.0, 1.0, 1.0]);
        let c = mm.multiply(&a, &b).unwrap();
        assert_eq!(c.as_slice(), &[6.0]);
        assert_eq!(mm.tasks_dispatched(), 1);
    }

    #[test]
    fn test_validation_failure_dispatches_nothing() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 2);
        for strategy in Strategy::ALL {
            let mm = multiplier(strategy, 4, 2);
            assert_eq!(mm.multiply(&a, &b), Err(incompatible((2, 3), (2, 2))));
            assert_eq!(mm.tasks_dispatched(), 0);
        }
    }

    #[test]
    fn test_tiled_dispatches_one_task_per_tile() {
        let mm = multiplier(Strategy::Tiled, 2, 3);
        let a = sample(7, 4, 0);
        let b = sample(4, 5, 1);
        mm.multiply(&a, &b).unwrap();
        // ceil(7/3) * ceil(5/3) = 3 * 2
        assert_eq!(mm.tasks_dispatched(), 6);
        assert_eq!(mm.planned_workers(7, 5), 2);
    }

    #[test]
    fn test_row_per_task_counts_rows() {
        let mm = multiplier(Strategy::RowPerTask, 3, 64);
        let a = sample(10, 2, 0);
        let b = sample(2, 2, 1);
        mm.multiply(&a, &b).unwrap();
        assert_eq!(mm.tasks_dispatched(), 10);
        assert_eq!(mm.planned_workers(10, 2), 3);
    }

    #[test]
    fn test_zero_tile_rejected() {
        let err = ParallelMultiplier::new(ParallelConfig {
            strategy: Strategy::Tiled,
            tile: TileShape { rows: 0, cols: 4 },
            ..ParallelConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_cell_trace_records_every_cell() {
        use crate::diagnostics::{self, tests::SharedBuf, tests::SINK_TEST_LOCK};

        let _serial = SINK_TEST_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let buf = SharedBuf::default();
        diagnostics::install(buf.clone());

        let a = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let b = Matrix::from_vec(2, 2, vec![5.0, 6.0, 7.0, 8.0]);
        multiplier(Strategy::RowPerTask, 2, 64).multiply(&a, &b).unwrap();
        diagnostics::uninstall();

        let text = buf.contents();
        for cell in ["C[0][0] = 19", "C[0][1] = 22", "C[1][0] = 43", "C[1][1] = 50"] {
            assert!(text.contains(cell), "missing {cell} in {text}");
        }
    }
}
