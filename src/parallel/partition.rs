//! Splitting the output buffer into disjoint, exclusively borrowed regions.
//!
//! Every function here hands out `&mut [f64]` views carved from one `&mut`
//! borrow of `C`, so two workers can never be given overlapping cells.

use crate::DEFAULT_TILE;

/// Contiguous row-block layout for `m` rows.
///
/// The first `extra` blocks hold `base_rows + 1` rows and the rest hold
/// `base_rows`, so exactly `workers` non-empty blocks cover all rows and no
/// block exceeds `ceil(m / workers)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBlocks {
    /// Number of workers (`min(m, degree)`, at least 1).
    pub workers: usize,
    pub base_rows: usize,
    pub extra: usize,
}

impl RowBlocks {
    /// Rows assigned to block `w`.
    pub fn rows_in(&self, w: usize) -> usize {
        self.base_rows + usize::from(w < self.extra)
    }

    /// First row of block `w`.
    pub fn first_row(&self, w: usize) -> usize {
        w * self.base_rows + w.min(self.extra)
    }

    /// Size of the largest block.
    pub fn max_rows(&self) -> usize {
        self.rows_in(0)
    }
}

/// Plans row blocks for `m` rows and a parallelism degree.
pub fn row_blocks(m: usize, degree: usize) -> RowBlocks {
    let workers = degree.min(m).max(1);
    RowBlocks {
        workers,
        base_rows: m / workers,
        extra: m % workers,
    }
}

/// Carves a row-major `C` with `cols` columns into the blocks of `plan`,
/// each paired with its first row.
pub fn split_row_blocks(
    c: &mut [f64],
    cols: usize,
    plan: RowBlocks,
) -> Vec<(usize, &mut [f64])> {
    let mut out = Vec::with_capacity(plan.workers);
    let mut rest = c;
    for w in 0..plan.workers {
        let rows = plan.rows_in(w);
        if rows == 0 {
            break;
        }
        let (block, tail) = std::mem::take(&mut rest).split_at_mut(rows * cols);
        out.push((plan.first_row(w), block));
        rest = tail;
    }
    debug_assert!(rest.is_empty());
    out
}

/// Tile size in output cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileShape {
    pub rows: usize,
    pub cols: usize,
}

impl Default for TileShape {
    fn default() -> Self {
        Self {
            rows: DEFAULT_TILE,
            cols: DEFAULT_TILE,
        }
    }
}

/// A rectangular region of `C` whose rows are exclusive sub-slices.
#[derive(Debug)]
pub struct Tile<'c> {
    /// Row of `C` holding the first segment.
    pub row: usize,
    /// Column of `C` holding the first element of each segment.
    pub col: usize,
    /// One segment per covered row, top to bottom.
    pub segments: Vec<&'c mut [f64]>,
}

impl Tile<'_> {
    pub fn height(&self) -> usize {
        self.segments.len()
    }

    pub fn width(&self) -> usize {
        self.segments.first().map_or(0, |s| s.len())
    }
}

/// Number of tiles covering an `m × n` output.
pub fn tile_count(m: usize, n: usize, shape: TileShape) -> usize {
    m.div_ceil(shape.rows) * n.div_ceil(shape.cols)
}

/// Splits a row-major `C` with `cols` columns into tiles, row-band by row-band
/// and left to right within a band. Edge tiles may be smaller than `shape`.
///
/// # Panics
///
/// Panics if either side of `shape` is zero.
pub fn tiles(c: &mut [f64], cols: usize, shape: TileShape) -> Vec<Tile<'_>> {
    assert!(shape.rows > 0 && shape.cols > 0, "tile shape must be non-zero");
    if cols == 0 {
        return Vec::new();
    }

    let total = c.len();
    let across = cols.div_ceil(shape.cols);
    let mut out: Vec<Tile<'_>> = Vec::with_capacity((total / cols).div_ceil(shape.rows) * across);

    for (band_idx, band) in c.chunks_mut(shape.rows * cols).enumerate() {
        let first = out.len();
        for t in 0..across {
            out.push(Tile {
                row: band_idx * shape.rows,
                col: t * shape.cols,
                segments: Vec::with_capacity(shape.rows),
            });
        }
        for row in band.chunks_mut(cols) {
            for (t, segment) in row.chunks_mut(shape.cols).enumerate() {
                out[first + t].segments.push(segment);
            }
        }
    }

    debug_assert_eq!(
        out.iter()
            .map(|t| t.segments.iter().map(|s| s.len()).sum::<usize>())
            .sum::<usize>(),
        total
    );
    out
}
