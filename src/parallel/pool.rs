//! Fixed-size worker pool and the parallelism-degree policy.

use std::num::NonZeroUsize;
use std::thread;

use rayon::{Scope, ThreadPool, ThreadPoolBuilder};

use crate::error::Result;
use crate::FALLBACK_WORKERS;

/// How many workers a multiplier may run at once.
///
/// The same degree drives every strategy: the row-block worker count, the
/// row-per-task pool size and the tiling wave budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// Use the detected hardware concurrency.
    #[default]
    Auto,
    /// Use exactly this many workers.
    Fixed(NonZeroUsize),
}

impl Parallelism {
    /// `Fixed(n)`, or `Auto` when `n == 0`.
    pub fn from_count(n: usize) -> Self {
        NonZeroUsize::new(n).map_or(Parallelism::Auto, Parallelism::Fixed)
    }

    /// Resolves the policy to a concrete worker count (always ≥ 1).
    pub fn degree(self) -> usize {
        match self {
            Parallelism::Auto => detected_parallelism(),
            Parallelism::Fixed(n) => n.get(),
        }
    }
}

/// Hardware concurrency as reported by the OS, or [`FALLBACK_WORKERS`] when it
/// cannot be determined.
pub fn detected_parallelism() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_WORKERS)
}

/// A bounded set of OS threads.
///
/// Work is handed out through [`WorkerPool::scope`], which returns only after
/// every job spawned inside it has finished.
pub struct WorkerPool {
    pool: ThreadPool,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|i| format!("parmul-worker-{i}"))
            .build()?;

        tracing::debug!(workers = size, "worker pool started");
        Ok(Self { pool, size })
    }

    pub fn with_parallelism(parallelism: Parallelism) -> Result<Self> {
        Self::new(parallelism.degree())
    }

    /// Number of threads in the pool.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `op` inside the pool and blocks until all jobs it spawned are done.
    pub fn scope<'scope, OP>(&self, op: OP)
    where
        OP: FnOnce(&Scope<'scope>) + Send,
    {
        self.pool.scope(op)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool").field("size", &self.size).finish()
    }
}
