//! Command-line parsing for the house-price simulator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimator code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::HouseAttributes;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ames", version, about = "Ames house-price ensemble simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate the price of one house and print the per-model breakdown.
    Estimate(EstimateArgs),
    /// Estimate every house in a CSV file.
    Batch(BatchArgs),
    /// Print the static report pages (scores, models, weights, EDA).
    Report(ReportArgs),
    /// Launch the interactive dashboard.
    Tui(TuiArgs),
}

/// Options shared by every command that builds an estimator.
#[derive(Debug, Args, Clone, Default)]
pub struct EstimatorArgs {
    /// TOML file overriding the tier/model tables (defaults to $AMES_CONFIG).
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Clamp out-of-domain attributes instead of rejecting them.
    #[arg(long)]
    pub clamp: bool,

    /// Reject neighborhood ranks that have no configured tier.
    #[arg(long)]
    pub strict_rank: bool,
}

/// The five house attributes.
#[derive(Debug, Args, Clone)]
pub struct HouseArgs {
    /// Overall material and finish quality (1-10).
    #[arg(short = 'q', long = "qual", default_value_t = 7, allow_negative_numbers = true)]
    pub overall_qual: i32,

    /// Above-ground living area in sq ft (500-4000).
    #[arg(short = 'a', long = "area", default_value_t = 1500, allow_negative_numbers = true)]
    pub gr_liv_area: i32,

    /// Original construction year (1900-2010).
    #[arg(short = 'y', long = "year", default_value_t = 2003, allow_negative_numbers = true)]
    pub year_built: i32,

    /// Neighborhood tier, 1 (cheapest) to 5 (most expensive).
    #[arg(short = 'r', long = "rank", default_value_t = 3, allow_negative_numbers = true)]
    pub neighborhood_rank: i32,

    /// Garage capacity in cars (0-4).
    #[arg(short = 'g', long = "garage", default_value_t = 2, allow_negative_numbers = true)]
    pub garage_cars: i32,
}

impl From<&HouseArgs> for HouseAttributes {
    fn from(args: &HouseArgs) -> Self {
        HouseAttributes {
            overall_qual: args.overall_qual,
            gr_liv_area: args.gr_liv_area,
            year_built: args.year_built,
            neighborhood_rank: args.neighborhood_rank,
            garage_cars: args.garage_cars,
        }
    }
}

/// Noise controls.
#[derive(Debug, Args, Clone, Default)]
pub struct NoiseArgs {
    /// Seed for the per-model noise (fresh randomness when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable noise entirely (deterministic prices).
    #[arg(long, conflicts_with = "seed")]
    pub no_noise: bool,
}

#[derive(Debug, Args)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub house: HouseArgs,

    #[command(flatten)]
    pub noise: NoiseArgs,

    #[command(flatten)]
    pub estimator: EstimatorArgs,

    /// Re-run a prediction exported with `--export` (house flags are ignored).
    #[arg(long, value_name = "JSON", conflicts_with_all = ["seed", "no_noise"])]
    pub replay: Option<PathBuf>,

    /// Print the prediction as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Also write the prediction to a JSON file.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Width of the breakdown bars (columns).
    #[arg(long, default_value_t = 40)]
    pub width: usize,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// CSV file with one house per row.
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,

    /// Output CSV (stdout when omitted).
    #[arg(short = 'o', long, value_name = "CSV")]
    pub output: Option<PathBuf>,

    /// Seed for per-row noise (defaults to 42 so batch output is reproducible).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Disable noise entirely.
    #[arg(long, conflicts_with = "seed")]
    pub no_noise: bool,

    #[command(flatten)]
    pub estimator: EstimatorArgs,
}

/// Report pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportSection {
    Overview,
    Eda,
    Models,
    Weights,
    Tiers,
    All,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Which page to print.
    #[arg(short = 's', long, value_enum, default_value_t = ReportSection::All)]
    pub section: ReportSection,

    /// Chart width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Scatter height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Seed for the synthetic EDA scatter.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub estimator: EstimatorArgs,
}

#[derive(Debug, Args, Clone, Default)]
pub struct TuiArgs {
    /// Seed for the first draw of noise (fresh randomness when omitted).
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub estimator: EstimatorArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_defaults_match_simulator_start() {
        let cli = Cli::parse_from(["ames", "estimate"]);
        let Command::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(HouseAttributes::from(&args.house), HouseAttributes::default());
        assert!(args.noise.seed.is_none());
    }

    #[test]
    fn negative_values_parse_for_validation() {
        let cli = Cli::parse_from(["ames", "estimate", "--area", "-5", "--seed", "3"]);
        let Command::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(args.house.gr_liv_area, -5);
        assert_eq!(args.noise.seed, Some(3));
    }

    #[test]
    fn seed_and_no_noise_conflict() {
        assert!(Cli::try_parse_from(["ames", "estimate", "--seed", "1", "--no-noise"]).is_err());
    }

    #[test]
    fn batch_seed_and_no_noise_conflict() {
        assert!(Cli::try_parse_from(["ames", "batch", "-i", "h.csv", "--seed", "1", "--no-noise"]).is_err());
        assert!(Cli::try_parse_from(["ames", "batch", "-i", "h.csv", "--no-noise"]).is_ok());
    }

    #[test]
    fn replay_conflicts_with_noise_flags() {
        assert!(Cli::try_parse_from(["ames", "estimate", "--replay", "p.json", "--seed", "2"]).is_err());
        let cli = Cli::parse_from(["ames", "estimate", "--replay", "p.json"]);
        let Command::Estimate(args) = cli.command else {
            panic!("expected estimate");
        };
        assert_eq!(args.replay.as_deref(), Some(std::path::Path::new("p.json")));
    }

    #[test]
    fn report_section_value_enum() {
        let cli = Cli::parse_from(["ames", "report", "-s", "weights"]);
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.section, ReportSection::Weights);
    }
}
