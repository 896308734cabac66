//! Command-line parsing for the Kaplan-Meier viewer.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimator code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "km", version, about = "Kaplan-Meier survival curves from CSV")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate a survival curve, print the table/preview, and optionally plot/export.
    Curve(CurveArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Write a `PatientID,time,event` fixture CSV.
    Fixture(FixtureArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `km curve`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Options for estimating a curve.
#[derive(Debug, Args, Clone)]
pub struct CurveArgs {
    /// Input CSV with `time` and `event` columns.
    ///
    /// When omitted, an interactive picker lists CSV files under the current
    /// directory.
    #[arg(short = 'f', long, env = "KM_INPUT", value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Skip the input entirely and use the built-in reference dataset.
    #[arg(long)]
    pub reference: bool,

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

    /// Mark censoring times with `+` on the plot.
    #[arg(long)]
    pub censor_marks: bool,

    /// Number of raw rows shown in the data preview (0 disables it).
    #[arg(long, default_value_t = 10)]
    pub preview: usize,

    /// Export the product-limit table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the curve to JSON (re-plot later with `km plot`).
    #[arg(long = "export-curve")]
    pub export_curve: Option<PathBuf>,
}

/// Options for plotting a saved curve.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Curve JSON file produced by `km curve --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Mark censoring times with `+`.
    #[arg(long)]
    pub censor_marks: bool,
}

/// Options for writing a fixture.
#[derive(Debug, Args)]
pub struct FixtureArgs {
    /// Output path.
    #[arg(short = 'o', long, default_value = "test_survival.csv")]
    pub output: PathBuf,

    /// Generate a synthetic cohort of this size instead of the fixed 20 rows.
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Random seed for synthetic cohorts.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Median event time of the synthetic cohort.
    #[arg(long, default_value_t = 15.0)]
    pub median: f64,

    /// Median random-censoring time of the synthetic cohort.
    #[arg(long, default_value_t = 60.0)]
    pub censor_median: f64,

    /// End of follow-up; event-free subjects are censored here.
    #[arg(long, default_value_t = 40.0)]
    pub follow_up: f64,
}

/// Options for the TUI.
#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    /// CSV to load on start-up (otherwise the reference dataset is shown).
    #[arg(short = 'f', long, env = "KM_INPUT", value_name = "CSV")]
    pub file: Option<PathBuf>,
}
