//! Run configuration, loadable from TOML.
//!
//! ```toml
//! input = "input.txt"
//! output = "output.txt"
//! mode = "both"
//! strategy = "tiled"
//! workers = 4
//! tile_rows = 64
//! tile_cols = 64
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{config_error, Result};
use crate::parallel::partition::TileShape;
use crate::parallel::{ParallelConfig, Parallelism, Strategy};
use crate::{DEFAULT_EPSILON, DEFAULT_MAX_DIM, DEFAULT_TILE};

/// Which multiplication paths a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Sequential,
    Parallel,
    #[default]
    Both,
}

impl Mode {
    pub fn runs_sequential(self) -> bool {
        matches!(self, Mode::Sequential | Mode::Both)
    }

    pub fn runs_parallel(self) -> bool {
        matches!(self, Mode::Parallel | Mode::Both)
    }
}

/// Top-level run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub strategy: Strategy,
    /// Parallelism degree; absent or 0 means detected hardware concurrency.
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_tile")]
    pub tile_rows: usize,
    #[serde(default = "default_tile")]
    pub tile_cols: usize,
    #[serde(default = "default_max_dim")]
    pub max_dim: usize,
    /// Tolerance used when checking the parallel result against the
    /// sequential one.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default)]
    pub trace_cells: bool,
}

fn default_input() -> PathBuf {
    PathBuf::from("input.txt")
}

fn default_output() -> PathBuf {
    PathBuf::from("output.txt")
}

fn default_tile() -> usize {
    DEFAULT_TILE
}

fn default_max_dim() -> usize {
    DEFAULT_MAX_DIM
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            mode: Mode::default(),
            strategy: Strategy::default(),
            workers: None,
            tile_rows: DEFAULT_TILE,
            tile_cols: DEFAULT_TILE,
            max_dim: DEFAULT_MAX_DIM,
            epsilon: DEFAULT_EPSILON,
            trace_cells: false,
        }
    }
}

impl Config {
    /// Parses a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| config_error(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Loads and parses the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| config_error(format!("{}: {e}", path.display())))
    }

    /// Rejects values no run could use.
    pub fn check(&self) -> Result<()> {
        if self.tile_rows == 0 || self.tile_cols == 0 {
            return Err(config_error("tile_rows and tile_cols must be at least 1"));
        }
        if self.max_dim == 0 {
            return Err(config_error("max_dim must be at least 1"));
        }
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(config_error("epsilon must be a non-negative number"));
        }
        Ok(())
    }

    pub fn parallelism(&self) -> Parallelism {
        self.workers.map_or(Parallelism::Auto, Parallelism::from_count)
    }

    pub fn parallel_config(&self) -> ParallelConfig {
        ParallelConfig {
            strategy: self.strategy,
            parallelism: self.parallelism(),
            tile: TileShape {
                rows: self.tile_rows,
                cols: self.tile_cols,
            },
            max_dim: self.max_dim,
        }
    }
}
