//! Command-line parsing for the Steinmetz core-loss fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting/math code.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "corefit", version, about = "Steinmetz core-loss fitter (loss = k * bac^a * fs^b)")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `COREFIT_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit measurement CSV(s), print diagnostics/rankings, and optionally plot/export.
    Fit(FitArgs),
    /// Predict core loss at an operating point from a saved fit.
    Predict(PredictArgs),
    /// Plot a previously exported fit JSON.
    Plot(PlotArgs),
    /// Write a synthetic measurement CSV drawn from known coefficients.
    Sample(SampleArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Measurement CSV(s) with `coreloss`, `bac`, `fs` columns.
    ///
    /// If omitted, an interactive picker lists CSV files under the current directory.
    #[arg(short = 'f', long = "file", value_name = "CSV")]
    pub files: Vec<PathBuf>,

    /// Show top-N under- and over-predicted points.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Print results as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,

    /// Export per-point results to CSV (single input file only).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the fit (coefficients + diagnostics + points) to JSON (single input file only).
    #[arg(long = "export-fit", value_name = "JSON")]
    pub export_fit: Option<PathBuf>,
}

/// Options for predicting from a saved fit.
#[derive(Debug, Parser)]
pub struct PredictArgs {
    /// Fit JSON file produced by `corefit fit --export-fit`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    /// Peak AC flux density.
    #[arg(long)]
    pub bac: f64,

    /// Switching frequency.
    #[arg(long)]
    pub fs: f64,
}

/// Options for plotting a saved fit.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Fit JSON file produced by `corefit fit --export-fit`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for synthetic data generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: PathBuf,

    /// Steinmetz coefficient k.
    #[arg(long, default_value_t = 8.0)]
    pub k: f64,

    /// Flux density exponent a.
    #[arg(long, default_value_t = 2.4)]
    pub a: f64,

    /// Frequency exponent b.
    #[arg(long, default_value_t = 1.5)]
    pub b: f64,

    /// Smallest flux density.
    #[arg(long, default_value_t = 0.01)]
    pub bac_min: f64,

    /// Largest flux density.
    #[arg(long, default_value_t = 0.2)]
    pub bac_max: f64,

    /// Flux density steps (log-spaced) per frequency.
    #[arg(long, default_value_t = 8)]
    pub bac_steps: usize,

    /// Frequencies to sample (comma separated).
    #[arg(long = "fs", value_delimiter = ',', default_values_t = vec![50.0, 100.0, 200.0, 400.0])]
    pub frequencies: Vec<f64>,

    /// Standard deviation of multiplicative noise on ln(loss).
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
