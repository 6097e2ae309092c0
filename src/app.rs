//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initialises logging
//! - parses CLI arguments
//! - builds the estimator from the resolved configuration
//! - prints reports/predictions or launches the TUI
//! - writes optional exports

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;

use crate::cli::{BatchArgs, Command, EstimateArgs, ReportArgs, ReportSection};
use crate::domain::HouseAttributes;
use crate::error::AppError;
use crate::io::{BatchNoise, PredictionFile};

pub mod pipeline;

use pipeline::NoiseMode;

/// Tracing filter (same syntax as `RUST_LOG`).
pub const LOG_ENV: &str = "AMES_LOG";
/// Emit JSON log lines when set.
pub const LOG_JSON_ENV: &str = "AMES_LOG_JSON";
/// Log destination while the TUI owns the terminal.
pub const LOG_FILE_ENV: &str = "AMES_LOG_FILE";

/// Entry point for the `ames` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `ames` and `ames --seed 7` to behave like `ames tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    init_logging(matches!(cli.command, Command::Tui(_)));

    match cli.command {
        Command::Estimate(args) => handle_estimate(args),
        Command::Batch(args) => handle_batch(args),
        Command::Report(args) => handle_report(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

fn handle_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let estimator = pipeline::build_estimator(&args.estimator)?;
    let (attrs, mode, recorded) = match &args.replay {
        Some(path) => {
            let (file, mode) = pipeline::load_replay(path)?;
            (file.prediction.attributes, mode, Some(file.prediction.final_price))
        }
        None => (
            HouseAttributes::from(&args.house),
            NoiseMode::from_flags(args.noise.seed, args.noise.no_noise),
            None,
        ),
    };

    let result = pipeline::run_estimate(&estimator, &attrs, mode)?;
    tracing::info!(final_price = result.final_price, ?mode, "estimate");
    if let Some(recorded) = recorded {
        if mode != NoiseMode::Entropy && (recorded - result.final_price).abs() > 1e-6 {
            tracing::warn!(recorded, replayed = result.final_price, "replayed price differs; check the config");
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| AppError::new(4, format!("Failed to serialize prediction: {e}")))?;
        println!("{json}");
    } else {
        println!(
            "{}",
            crate::report::format_prediction(
                &result,
                &estimator,
                mode.label(estimator.noise_amplitude()),
                args.width
            )
        );
    }

    if let Some(path) = &args.export {
        let file = PredictionFile::new(result, mode.seed(), estimator.noise_amplitude());
        crate::io::write_prediction_json(path, &file)?;
    }

    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let estimator = pipeline::build_estimator(&args.estimator)?;
    let rows = crate::io::read_houses_file(&args.input)?;
    let noise = if args.no_noise {
        BatchNoise::Off
    } else {
        BatchNoise::Seeded(args.seed)
    };

    let outcomes = crate::io::evaluate_batch(&estimator, &rows, noise);
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    tracing::info!(rows = outcomes.len(), failed, "batch evaluated");
    if failed > 0 {
        tracing::warn!(failed, "some rows could not be estimated; see the error column");
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                AppError::new(2, format!("Failed to create output CSV '{}': {e}", path.display()))
            })?;
            crate::io::write_predictions(file, &estimator, &outcomes)?;
            eprintln!(
                "Wrote {} prediction(s) to {} ({failed} with errors).",
                outcomes.len(),
                path.display()
            );
        }
        None => crate::io::write_predictions(io::stdout().lock(), &estimator, &outcomes)?,
    }

    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let estimator = pipeline::build_estimator(&args.estimator)?;
    let show = |s: ReportSection| args.section == s || args.section == ReportSection::All;

    let mut pages = Vec::new();
    if show(ReportSection::Overview) {
        pages.push(crate::report::format_overview());
    }
    if show(ReportSection::Eda) {
        let scatter = crate::data::generate_scatter(crate::data::DEFAULT_SCATTER_POINTS, args.seed)?;
        pages.push(crate::report::format_eda(&scatter, args.width, args.height));
    }
    if show(ReportSection::Models) {
        pages.push(crate::report::format_models(args.width / 2));
    }
    if show(ReportSection::Weights) {
        pages.push(crate::report::format_weights(&estimator, args.width / 2));
    }
    if show(ReportSection::Tiers) {
        pages.push(crate::report::format_tiers(&estimator));
    }

    let mut out = io::stdout().lock();
    writeln!(out, "{}", pages.join("\n"))
        .map_err(|e| AppError::new(4, format!("Failed to write report: {e}")))?;
    Ok(())
}

/// Initialise the `tracing` subscriber.
///
/// The TUI owns stdout/stderr, so in that mode we only log when a file is given.
fn init_logging(interactive: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("ames_blend=warn"));

    if interactive {
        let Some(path) = std::env::var_os(LOG_FILE_ENV) else {
            return;
        };
        let Some(file) = open_log_file(Path::new(&path)) else {
            return;
        };
        let _ = fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
        return;
    }

    if std::env::var_os(LOG_JSON_ENV).is_some() {
        let _ = fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .with_target(true)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(env_filter)
            .with_writer(io::stderr)
            .with_target(true)
            .try_init();
    }
}

/// Create the TUI log file, reporting failure on stderr while it is still visible.
fn open_log_file(path: &Path) -> Option<File> {
    match File::create(path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!(
                "warning: cannot create log file '{}' ({LOG_FILE_ENV}): {e}; logging disabled",
                path.display()
            );
            None
        }
    }
}

/// Rewrite argv so `ames` defaults to `ames tui`.
///
/// Rules:
/// - `ames`                        -> `ames tui`
/// - `ames --seed 7 ...`           -> `ames tui --seed 7 ...`
/// - `ames --help/--version/-h`    -> unchanged (show top-level help/version)
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

    let is_subcommand = matches!(arg1.as_str(), "estimate" | "batch" | "report" | "tui");
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

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_launches_tui() {
        assert_eq!(rewrite_args(argv(&["ames"])), argv(&["ames", "tui"]));
    }

    #[test]
    fn leading_flags_go_to_tui() {
        assert_eq!(
            rewrite_args(argv(&["ames", "--seed", "7"])),
            argv(&["ames", "tui", "--seed", "7"])
        );
    }

    #[test]
    fn unwritable_log_file_is_reported_not_fatal() {
        let dir = std::env::temp_dir().join(format!("ames_no_such_dir_{}", std::process::id()));
        assert!(open_log_file(&dir.join("tui.log")).is_none());

        let path = std::env::temp_dir().join(format!("ames_tui_{}.log", std::process::id()));
        assert!(open_log_file(&path).is_some());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for parts in [&["ames", "estimate", "-q", "9"][..], &["ames", "--help"][..], &["ames", "report"][..]] {
            assert_eq!(rewrite_args(argv(parts)), argv(parts));
        }
    }
}
