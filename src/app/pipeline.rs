//! Shared "estimate pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! config resolve -> estimator build -> noise selection -> estimate
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::Path;

use crate::cli::EstimatorArgs;
use crate::config::EstimatorConfig;
use crate::domain::{HouseAttributes, InputPolicy, PredictionResult};
use crate::error::AppError;
use crate::estimator::{Estimator, UniformNoise, ZeroNoise};
use crate::io::{PredictionFile, read_prediction_json};
use crate::report::NoiseLabel;

/// How noise is drawn for a single estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseMode {
    Off,
    Seeded(u64),
    Entropy,
}

impl NoiseMode {
    pub fn from_flags(seed: Option<u64>, no_noise: bool) -> Self {
        match (no_noise, seed) {
            (true, _) => NoiseMode::Off,
            (false, Some(seed)) => NoiseMode::Seeded(seed),
            (false, None) => NoiseMode::Entropy,
        }
    }

    pub fn seed(self) -> Option<u64> {
        match self {
            NoiseMode::Seeded(seed) => Some(seed),
            _ => None,
        }
    }

    pub fn label(self, amplitude: f64) -> NoiseLabel {
        match self {
            NoiseMode::Off => NoiseLabel::Off,
            NoiseMode::Seeded(seed) => NoiseLabel::Seeded { seed, amplitude },
            NoiseMode::Entropy => NoiseLabel::Entropy { amplitude },
        }
    }
}

/// Noise mode that reproduces an exported prediction.
///
/// Entropy-drawn exports cannot be replayed exactly; they get fresh noise.
pub fn replay_mode(file: &PredictionFile) -> NoiseMode {
    if let Some(seed) = file.seed {
        return NoiseMode::Seeded(seed);
    }
    let noiseless = file.noise_amplitude == 0.0
        || file
            .prediction
            .estimates
            .iter()
            .all(|e| e.price == e.deterministic.max(0.0));
    if noiseless { NoiseMode::Off } else { NoiseMode::Entropy }
}

/// Load an exported prediction and return its inputs plus the noise mode to re-run it with.
pub fn load_replay(path: &Path) -> Result<(PredictionFile, NoiseMode), AppError> {
    let file = read_prediction_json(path)?;
    let mode = replay_mode(&file);
    tracing::info!(path = %path.display(), ?mode, "replaying exported prediction");
    Ok((file, mode))
}

/// Resolve configuration and apply CLI overrides.
pub fn resolve_config(args: &EstimatorArgs) -> Result<EstimatorConfig, AppError> {
    let mut config = EstimatorConfig::resolve(args.config.as_deref())?;
    if args.clamp {
        config.input_policy = InputPolicy::Clamp;
    }
    if args.strict_rank {
        config.rank_fallback = false;
    }
    Ok(config)
}

/// Build an estimator from CLI options.
pub fn build_estimator(args: &EstimatorArgs) -> Result<Estimator, AppError> {
    let config = resolve_config(args)?;
    Ok(Estimator::new(config)?)
}

/// Run one estimate with the requested noise mode.
pub fn run_estimate(
    estimator: &Estimator,
    attrs: &HouseAttributes,
    mode: NoiseMode,
) -> Result<PredictionResult, AppError> {
    let result = match mode {
        NoiseMode::Off => estimator.estimate(attrs, &mut ZeroNoise)?,
        NoiseMode::Seeded(seed) => estimator.estimate(attrs, &mut UniformNoise::seeded(seed))?,
        NoiseMode::Entropy => estimator.estimate(attrs, &mut UniformNoise::from_entropy())?,
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_mode_from_flags() {
        assert_eq!(NoiseMode::from_flags(Some(3), false), NoiseMode::Seeded(3));
        assert_eq!(NoiseMode::from_flags(Some(3), true), NoiseMode::Off);
        assert_eq!(NoiseMode::from_flags(None, false), NoiseMode::Entropy);
    }

    #[test]
    fn cli_overrides_are_applied() {
        let args = EstimatorArgs {
            config: None,
            clamp: true,
            strict_rank: true,
        };
        // Only meaningful when AMES_CONFIG is unset, which is the case under `cargo test`.
        if std::env::var_os(crate::config::CONFIG_ENV).is_none() {
            let cfg = resolve_config(&args).unwrap();
            assert_eq!(cfg.input_policy, InputPolicy::Clamp);
            assert!(!cfg.rank_fallback);
        }
    }

    #[test]
    fn replay_reproduces_seeded_export() {
        let est = Estimator::new(EstimatorConfig::default()).unwrap();
        let attrs = HouseAttributes {
            overall_qual: 9,
            ..HouseAttributes::default()
        };
        let original = run_estimate(&est, &attrs, NoiseMode::Seeded(11)).unwrap();

        let path = std::env::temp_dir().join(format!("ames_replay_{}.json", std::process::id()));
        crate::io::write_prediction_json(&path, &PredictionFile::new(original.clone(), Some(11), 2500.0)).unwrap();
        let (file, mode) = load_replay(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(mode, NoiseMode::Seeded(11));
        let again = run_estimate(&est, &file.prediction.attributes, mode).unwrap();
        assert_eq!(again, original);
    }

    #[test]
    fn replay_of_noiseless_export_stays_noiseless() {
        let est = Estimator::new(EstimatorConfig::default()).unwrap();
        let result = run_estimate(&est, &HouseAttributes::default(), NoiseMode::Off).unwrap();
        assert_eq!(replay_mode(&PredictionFile::new(result.clone(), None, 2500.0)), NoiseMode::Off);

        let noisy = run_estimate(&est, &HouseAttributes::default(), NoiseMode::Seeded(1)).unwrap();
        assert_eq!(replay_mode(&PredictionFile::new(noisy, None, 2500.0)), NoiseMode::Entropy);
    }

    #[test]
    fn invalid_input_becomes_usage_error() {
        let est = Estimator::new(EstimatorConfig::default()).unwrap();
        let attrs = HouseAttributes {
            overall_qual: 0,
            ..HouseAttributes::default()
        };
        let err = run_estimate(&est, &attrs, NoiseMode::Off).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
