//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initialises logging
//! - parses CLI arguments
//! - resolves the dataset (with reference fallback)
//! - runs the estimator
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use log::{debug, info};

use crate::cli::{Command, CurveArgs, FixtureArgs, PlotArgs, TuiArgs};
use crate::domain::KmConfig;
use crate::error::AppError;

pub mod pipeline;

/// Environment variable holding the `env_logger` filter.
pub const LOG_ENV: &str = "KM_LOG";

/// Entry point for the `km` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` is optional; it may set KM_INPUT / KM_LOG.
    dotenvy::dotenv().ok();

    // We want `km` and `km -f data.csv` to behave like `km tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let default_filter = match cli.command {
        Command::Tui(_) => "off",
        _ => "warn",
    };
    init_logging(default_filter);
    debug!("parsed command: {:?}", cli.command);

    match cli.command {
        Command::Curve(args) => handle_curve(args),
        Command::Plot(args) => handle_plot(args),
        Command::Fixture(args) => handle_fixture(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn init_logging(default_filter: &str) {
    let env = env_logger::Env::default().filter_or(LOG_ENV, default_filter);
    // A second init (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

fn handle_curve(args: CurveArgs) -> Result<(), AppError> {
    let input = if args.reference {
        None
    } else if let Some(path) = &args.file {
        Some(crate::cli::picker::validate_csv_path(path)?)
    } else {
        crate::cli::picker::prompt_for_csv_path()?
    };

    let config = KmConfig {
        input,
        ..config_from_args(&args)
    };
    let run = pipeline::run_estimate(&config)?;

    println!("{}", crate::report::format_run_summary(&run.dataset, &run.curve));
    println!("{}", crate::report::format_curve_table(&run.curve));

    if config.preview_rows > 0 {
        if let Some(table) = &run.dataset.table {
            println!("{}", crate::report::format_preview(table, config.preview_rows));
        }
    }

    if config.plot {
        let plot = crate::plot::render_step_plot(
            &run.plot,
            config.plot_width,
            config.plot_height,
            config.censor_marks,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.export_table {
        crate::io::export::write_table_csv(path, &run.curve)?;
        info!("wrote product-limit table to {}", path.display());
    }
    if let Some(path) = &config.export_curve {
        crate::io::curve::write_curve_json(path, &run.curve, &run.dataset.source)?;
        info!("wrote curve JSON to {}", path.display());
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let saved = crate::io::curve::read_curve_json(&args.curve)?;
    println!("Curve: {} (generated {})", saved.source, saved.generated_at.to_rfc3339());
    let plot = crate::plot::render_ascii_plot(&saved.curve, args.width, args.height, args.censor_marks);
    println!("{plot}");
    Ok(())
}

fn handle_fixture(args: FixtureArgs) -> Result<(), AppError> {
    let rows = match args.count {
        None => crate::data::fixed_fixture(),
        Some(count) => crate::data::synthetic_fixture(&crate::data::FixtureSpec {
            count,
            seed: args.seed,
            median_survival: args.median,
            median_censoring: args.censor_median,
            follow_up: args.follow_up,
        })?,
    };
    crate::data::write_fixture_csv(&args.output, &rows)?;

    let events = rows.iter().filter(|r| r.event == 1).count();
    println!(
        "{} created successfully! ({} patients, {events} events)",
        args.output.display(),
        rows.len()
    );
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let input = match &args.file {
        Some(path) => Some(crate::cli::picker::validate_csv_path(path)?),
        None => None,
    };
    crate::tui::run(input)
}

pub fn config_from_args(args: &CurveArgs) -> KmConfig {
    KmConfig {
        input: if args.reference { None } else { args.file.clone() },
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        censor_marks: args.censor_marks,
        preview_rows: args.preview,
        export_table: args.export.clone(),
        export_curve: args.export_curve.clone(),
    }
}

/// Rewrite argv so `km` defaults to `km tui`.
///
/// Rules:
/// - `km`                      -> `km tui`
/// - `km -f data.csv ...`      -> `km tui -f data.csv ...`
/// - `km --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "curve" | "plot" | "fixture" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(args(&["km"])), args(&["km", "tui"]));
        assert_eq!(
            rewrite_args(args(&["km", "-f", "x.csv"])),
            args(&["km", "tui", "-f", "x.csv"])
        );
        assert_eq!(rewrite_args(args(&["km", "--help"])), args(&["km", "--help"]));
        assert_eq!(
            rewrite_args(args(&["km", "curve", "--reference"])),
            args(&["km", "curve", "--reference"])
        );
    }

    #[test]
    fn curve_flags_resolve_into_config() {
        let cli = Cli::parse_from(args(&[
            "km", "curve", "--reference", "--no-plot", "--preview", "3", "--export", "t.csv",
        ]));
        let Command::Curve(curve_args) = cli.command else {
            panic!("expected curve subcommand");
        };
        let config = config_from_args(&curve_args);
        assert!(config.input.is_none());
        assert!(!config.plot);
        assert_eq!(config.preview_rows, 3);
        assert_eq!(config.export_table.as_deref(), Some(std::path::Path::new("t.csv")));
    }
}
