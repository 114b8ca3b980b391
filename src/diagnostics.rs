//! Optional per-cell trace output.
//!
//! A single process-wide sink receives one line per cell computed by a pool
//! worker while it is installed. The sequential path is not traced. The mutex guards only the writer; cells are computed first and
//! then recorded, so the lock never covers arithmetic.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

type Sink = Box<dyn Write + Send>;

static SINK: Mutex<Option<Sink>> = Mutex::new(None);
static ENABLED: AtomicBool = AtomicBool::new(false);

fn lock() -> MutexGuard<'static, Option<Sink>> {
    SINK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Installs `sink` as the cell trace writer, returning the previous one.
pub fn install(sink: impl Write + Send + 'static) -> Option<Box<dyn Write + Send>> {
    let mut guard = lock();
    let previous = guard.replace(Box::new(sink));
    ENABLED.store(true, Ordering::Release);
    previous
}

/// Removes and flushes the installed writer, if any.
pub fn uninstall() -> Option<Box<dyn Write + Send>> {
    let mut guard = lock();
    ENABLED.store(false, Ordering::Release);
    let mut sink = guard.take()?;
    if let Err(e) = sink.flush() {
        tracing::warn!(error = %e, "failed to flush cell trace sink");
    }
    Some(sink)
}

#[inline]
pub fn enabled() -> bool {
    ENABLED.load(Ordering::Acquire)
}

/// Records the cells `C[row][first_col..first_col + values.len()]`.
///
/// Write failures are logged and otherwise ignored; tracing must never fail a
/// multiplication.
pub fn record_cells(worker: usize, row: usize, first_col: usize, values: &[f64]) {
    if !enabled() {
        return;
    }

    let mut guard = lock();
    let Some(sink) = guard.as_mut() else {
        return;
    };
    for (offset, value) in values.iter().enumerate() {
        let col = first_col + offset;
        if let Err(e) = writeln!(sink, "worker {worker} computed C[{row}][{col}] = {value}") {
            tracing::warn!(error = %e, "failed to write cell trace");
            return;
        }
    }
}

/// Index of the calling pool worker, `None` outside any pool.
#[inline]
pub fn current_worker() -> Option<usize> {
    rayon::current_thread_index()
}
