//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - runs the fit pipeline over one or more CSVs
//! - prints reports/plots
//! - writes optional exports

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FitArgs, PlotArgs, PredictArgs, SampleArgs};
use crate::data::{SampleSpec, generate_sample};
use crate::domain::{FitConfig, SteinmetzModel};
use crate::error::AppError;
use crate::io::{build_curve_file, read_curve_json, write_curve_json, write_measurements_csv, write_results_csv};
use crate::models::predict;
use crate::report::format_significant;

pub mod pipeline;

use pipeline::RunOutput;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "COREFIT_LOG";

/// Entry point for the `corefit` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `corefit` and `corefit data.csv` are shorthands for `corefit fit ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Predict(args) => handle_predict(args),
        Command::Plot(args) => handle_plot(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (e.g. in tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let mut config = fit_config_from_args(&args);
    if config.csv_paths.is_empty() {
        config.csv_paths.push(crate::cli::picker::prompt_for_csv_path()?);
    } else {
        for path in &config.csv_paths {
            crate::cli::picker::validate_csv_path(path)?;
        }
    }

    let batch = config.csv_paths.len() > 1;
    if batch && (config.export_results.is_some() || config.export_curve.is_some()) {
        return Err(AppError::new(
            2,
            "--export and --export-fit require a single input file.",
        ));
    }

    let results = pipeline::run_fits(&config.csv_paths, config.top_n);

    let mut first_error: Option<AppError> = None;
    let mut runs = Vec::with_capacity(results.len());
    for (path, result) in config.csv_paths.iter().zip(results) {
        match result {
            Ok(run) => runs.push(run),
            Err(err) => {
                if batch {
                    warn!(file = %path.display(), "skipping file: {err}");
                    eprintln!("{}: {err}", path.display());
                }
                first_error.get_or_insert(err);
            }
        }
    }

    if config.json {
        if batch || !runs.is_empty() {
            println!("{}", render_json(&runs, batch)?);
        }
    } else {
        for run in &runs {
            print_report(run, &config);
        }
    }

    if let Some(run) = runs.first() {
        if let Some(path) = &config.export_results {
            write_results_csv(path, &run.predictions)?;
            debug!(path = %path.display(), "wrote results CSV");
        }
        if let Some(path) = &config.export_curve {
            let curve = build_curve_file(&run.ingest, &run.fit, &run.predictions);
            write_curve_json(path, &curve)?;
            debug!(path = %path.display(), "wrote fit JSON");
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn print_report(run: &RunOutput, config: &FitConfig) {
    println!("{}", crate::report::format_run_summary(&run.ingest, &run.fit));
    let row_errors = crate::report::format_row_errors(&run.ingest);
    if !row_errors.is_empty() {
        println!("{row_errors}");
    }
    println!("{}", crate::report::format_rankings(&run.rankings));

    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.predictions,
            &run.fit.model,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }
}

/// A single requested file prints one object; a batch always prints an array,
/// even when only some of its files fitted.
fn render_json(runs: &[RunOutput], batch: bool) -> Result<String, AppError> {
    let files: Vec<_> = runs
        .iter()
        .map(|run| build_curve_file(&run.ingest, &run.fit, &run.predictions))
        .collect();
    match (batch, files.as_slice()) {
        (false, [single]) => serde_json::to_string_pretty(single),
        _ => serde_json::to_string_pretty(&files),
    }
    .map_err(|e| AppError::new(2, format!("Failed to serialize JSON output: {e}")))
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let curve = read_curve_json(&args.fit)?;
    let operating_point_ok = [args.bac, args.fs].iter().all(|v| v.is_finite() && *v > 0.0);
    if !operating_point_ok {
        return Err(AppError::new(2, "--bac and --fs must be positive finite numbers."));
    }

    let loss = predict(&curve.model, args.bac, args.fs);
    if !(loss.is_finite() && loss > 0.0) {
        return Err(AppError::new(4, "Prediction is out of floating-point range."));
    }

    println!(
        "k={} a={:.4} b={:.4}",
        format_significant(curve.model.k, 5),
        curve.model.a,
        curve.model.b
    );
    println!(
        "Predicted core loss at bac={}, fs={}: {}",
        args.bac,
        args.fs,
        format_significant(loss, 5)
    );
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let curve = read_curve_json(&args.fit)?;
    let plot = crate::plot::render_ascii_plot(&curve.points, &curve.model, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let spec = sample_spec_from_args(&args);
    let points = generate_sample(&spec)?;
    write_measurements_csv(&args.output, &points)?;
    println!("Wrote {} measurements to {}", points.len(), args.output.display());
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        csv_paths: args.files.clone(),
        top_n: args.top,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        json: args.json,
        export_results: args.export.clone(),
        export_curve: args.export_fit.clone(),
    }
}

fn sample_spec_from_args(args: &SampleArgs) -> SampleSpec {
    SampleSpec {
        model: SteinmetzModel {
            k: args.k,
            a: args.a,
            b: args.b,
        },
        bac_min: args.bac_min,
        bac_max: args.bac_max,
        bac_steps: args.bac_steps,
        frequencies: args.frequencies.clone(),
        noise: args.noise,
        seed: args.seed,
    }
}

/// Rewrite argv so bare invocations default to `fit`.
///
/// Rules:
/// - `corefit`                        -> `corefit fit` (interactive picker)
/// - `corefit data.csv ...`           -> `corefit fit -f data.csv ...`
/// - `corefit --top 5 ...`            -> `corefit fit --top 5 ...`
/// - `corefit --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "predict" | "plot" | "sample");
    if is_subcommand {
        return argv;
    }

    let looks_like_csv = PathBuf::from(&arg1)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true);
    if looks_like_csv {
        argv.splice(1..1, ["fit".to_string(), "-f".to_string()]);
        return argv;
    }

    // If the first token is a flag, treat it as "fit flags".
    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    // Otherwise, leave as-is and let clap report it.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_fit() {
        assert_eq!(rewrite_args(argv(&["corefit"])), argv(&["corefit", "fit"]));
    }

    #[test]
    fn csv_argument_becomes_fit_file() {
        assert_eq!(
            rewrite_args(argv(&["corefit", "data.CSV", "--no-plot"])),
            argv(&["corefit", "fit", "-f", "data.CSV", "--no-plot"])
        );
    }

    #[test]
    fn leading_flags_are_fit_flags() {
        assert_eq!(
            rewrite_args(argv(&["corefit", "--top", "3"])),
            argv(&["corefit", "fit", "--top", "3"])
        );
        assert_eq!(
            rewrite_args(argv(&["corefit", "-v", "-f", "x.csv"])),
            argv(&["corefit", "fit", "-v", "-f", "x.csv"])
        );
    }

    #[test]
    fn help_version_and_subcommands_are_untouched() {
        for items in [
            &["corefit", "--help"][..],
            &["corefit", "-V"][..],
            &["corefit", "predict", "--fit", "f.json", "--bac", "0.1", "--fs", "100"][..],
            &["corefit", "sample", "-o", "x.csv"][..],
            &["corefit", "bogus"][..],
        ] {
            assert_eq!(rewrite_args(argv(items)), argv(items));
        }
    }

    fn one_run() -> RunOutput {
        let csv = "coreloss,bac,fs\n5,0.02,500\n18,0.03,500\n45,0.04,500\n9,0.02,800\n";
        let ingest = crate::io::ingest::load_measurements_from_reader(csv.as_bytes(), "inline").unwrap();
        pipeline::run_fit_on(ingest, 3).unwrap()
    }

    #[test]
    fn json_shape_follows_requested_file_count() {
        let runs = vec![one_run()];

        let single: serde_json::Value = serde_json::from_str(&render_json(&runs, false).unwrap()).unwrap();
        assert!(single.is_object());
        assert_eq!(single["source"], "inline");

        // Batch where only one file fitted: still an array.
        let batch: serde_json::Value = serde_json::from_str(&render_json(&runs, true).unwrap()).unwrap();
        assert_eq!(batch.as_array().map(Vec::len), Some(1));

        let none: serde_json::Value = serde_json::from_str(&render_json(&[], true).unwrap()).unwrap();
        assert_eq!(none.as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn config_honours_no_plot() {
        let cli = crate::cli::Cli::parse_from(["corefit", "fit", "-f", "a.csv", "--no-plot", "--top", "4"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        let config = fit_config_from_args(&args);
        assert!(!config.plot);
        assert_eq!(config.top_n, 4);
        assert_eq!(config.csv_paths, vec![PathBuf::from("a.csv")]);
        assert!(config.export_curve.is_none());
    }

    #[test]
    fn sample_args_map_to_spec() {
        let cli = crate::cli::Cli::parse_from(["corefit", "sample", "-o", "s.csv", "--k", "3", "--bac-steps", "4"]);
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        let spec = sample_spec_from_args(&args);
        assert_eq!(spec.model.k, 3.0);
        assert_eq!(spec.bac_steps, 4);
        assert_eq!(spec.frequencies.len(), 4);
        assert_eq!(generate_sample(&spec).unwrap().len(), 16);
    }
}
