//! Command-line driver: read two matrices, multiply them along one or both
//! paths, report timings and write the product.
//!
//! ```sh
//! parmul                                  # input.txt -> output.txt, both paths
//! parmul -i a.txt -o c.txt --mode parallel --strategy tiled --workers 4
//! parmul --config job.toml --verify
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use parmul::{
    diagnostics, io, Config, Error, Matrix, Mode, Multiply, ParallelMultiplier, Sequential,
    Strategy,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "parmul")]
#[command(about = "Multiply two matrices sequentially and in parallel")]
#[command(version)]
struct Cli {
    /// TOML configuration file. Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input file holding A and B separated by a blank line.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file for C.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Which paths to run: sequential, parallel or both.
    #[arg(long, value_parser = parse_mode)]
    mode: Option<Mode>,

    /// Partitioning strategy: row-per-task, row-block or tiled.
    #[arg(short, long, value_parser = parse_strategy)]
    strategy: Option<Strategy>,

    /// Parallelism degree (0 = detected hardware concurrency).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Tile side used by the tiled strategy.
    #[arg(long)]
    tile: Option<usize>,

    /// Largest accepted row or column count.
    #[arg(long)]
    max_dim: Option<usize>,

    /// Check the parallel result against the sequential one.
    #[arg(long)]
    verify: bool,

    /// Write one line per computed cell to this file.
    #[arg(long)]
    trace_cells: Option<PathBuf>,

    /// Echo the result to the console.
    #[arg(long)]
    print: bool,
}

fn parse_strategy(s: &str) -> Result<Strategy, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    match s {
        "sequential" => Ok(Mode::Sequential),
        "parallel" => Ok(Mode::Parallel),
        "both" => Ok(Mode::Both),
        _ => Err(format!("unknown mode `{s}` (expected sequential, parallel or both)")),
    }
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(Config, RunFlags)> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(tile) = self.tile {
            config.tile_rows = tile;
            config.tile_cols = tile;
        }
        if let Some(max_dim) = self.max_dim {
            config.max_dim = max_dim;
        }
        if self.trace_cells.is_some() {
            config.trace_cells = true;
        }
        config.check()?;
        anyhow::ensure!(
            !(self.verify && config.mode == Mode::Sequential),
            "--verify needs the parallel path; use --mode parallel or --mode both"
        );

        let flags = RunFlags {
            verify: self.verify,
            print: self.print,
            trace_path: self.trace_cells,
        };
        Ok((config, flags))
    }
}

struct RunFlags {
    verify: bool,
    print: bool,
    trace_path: Option<PathBuf>,
}

fn timed(multiplier: &dyn Multiply, a: &Matrix, b: &Matrix) -> parmul::Result<(Matrix, Duration)> {
    let start = Instant::now();
    let c = multiplier.multiply(a, b)?;
    let elapsed = start.elapsed();
    println!(
        "{:<24} {:>10.3} ms",
        multiplier.name(),
        elapsed.as_secs_f64() * 1000.0
    );
    Ok((c, elapsed))
}

fn run(config: &Config, flags: &RunFlags) -> anyhow::Result<()> {
    let (a, b) = io::read_pair(&config.input)?;

    if config.trace_cells {
        let path = flags
            .trace_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("cells.log"));
        let file = File::create(&path)
            .with_context(|| format!("could not create trace file {}", path.display()))?;
        diagnostics::install(BufWriter::new(file));
    }

    let run_sequential = config.mode.runs_sequential() || flags.verify;
    let sequential = if run_sequential {
        Some(timed(&Sequential::with_max_dim(config.max_dim), &a, &b)?)
    } else {
        None
    };

    let parallel = if config.mode.runs_parallel() {
        let multiplier = ParallelMultiplier::new(config.parallel_config())?;
        tracing::info!(
            strategy = %multiplier.strategy(),
            workers = multiplier.workers(),
            "parallel multiplier ready"
        );
        Some(timed(&multiplier, &a, &b)?)
    } else {
        None
    };

    diagnostics::uninstall();

    if let (Some((seq, seq_time)), Some((par, par_time))) = (&sequential, &parallel) {
        if !par_time.is_zero() {
            println!(
                "speedup                  {:>10.2}x",
                seq_time.as_secs_f64() / par_time.as_secs_f64()
            );
        }
        if flags.verify {
            anyhow::ensure!(
                seq.approx_eq(par, config.epsilon),
                "parallel result differs from sequential result (epsilon {})",
                config.epsilon
            );
            println!("verified: parallel result matches sequential within {}", config.epsilon);
        }
    }

    let result = parallel
        .or(sequential)
        .map(|(c, _)| c)
        .context("no multiplication path selected")?;

    io::write_file(&config.output, &result)?;
    if flags.print {
        io::print_banner(&result, &config.output);
    }
    println!(
        "Matrix multiplication completed. Result saved to {}",
        config.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let outcome = Cli::parse()
        .into_config()
        .and_then(|(config, flags)| run(&config, &flags));

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::uninstall();
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
