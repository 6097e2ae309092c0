//! Estimator configuration: the static tables plus evaluation options.
//!
//! The reference configuration is compiled in. A TOML file can override any
//! part of it; missing sections keep their reference values.
//!
//! ```toml
//! strict_weights = false
//! noise_amplitude = 0.0
//!
//! [[models]]
//! name = "Lasso"
//! weight = 0.6
//! adjustment = { kind = "scale", factor = 1.0 }
//!
//! [[models]]
//! name = "KRR"
//! weight = 0.4
//! adjustment = { kind = "scale", factor = 0.95 }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{InputPolicy, NeighborhoodTier};
use crate::error::AppError;
use crate::models::{PseudoModel, reference_models};

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV: &str = "AMES_CONFIG";

/// Coefficients of the base linear value.
///
/// `raw = area*area_rate + (qual-quality_pivot)*quality_step
///      + (year-year_pivot)*year_step + garage*garage_step + intercept`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseCoefficients {
    pub area_rate: f64,
    pub quality_step: f64,
    pub quality_pivot: i32,
    pub year_step: f64,
    pub year_pivot: i32,
    pub garage_step: f64,
    pub intercept: f64,
}

impl Default for BaseCoefficients {
    fn default() -> Self {
        Self {
            area_rate: 75.0,
            quality_step: 15_000.0,
            quality_pivot: 5,
            year_step: 500.0,
            year_pivot: 1970,
            garage_step: 10_000.0,
            intercept: 30_000.0,
        }
    }
}

/// Everything the estimator needs, injected at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub tiers: Vec<NeighborhoodTier>,
    pub models: Vec<PseudoModel>,
    pub coefficients: BaseCoefficients,
    /// Half-width of the uniform per-model noise.
    pub noise_amplitude: f64,
    /// Require weights to sum to 1 (otherwise they are renormalized).
    pub strict_weights: bool,
    pub input_policy: InputPolicy,
    /// Use a neutral multiplier for in-domain ranks missing from `tiers`.
    pub rank_fallback: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            tiers: reference_tiers(),
            models: reference_models(),
            coefficients: BaseCoefficients::default(),
            noise_amplitude: 2_500.0,
            strict_weights: true,
            input_policy: InputPolicy::Reject,
            rank_fallback: true,
        }
    }
}

impl EstimatorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::new(2, format!("Failed to read config file '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
            .map_err(|e| AppError::new(2, format!("Failed to parse config file '{}': {e}", path.display())))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve the config source: explicit path, then `AMES_CONFIG`, then the reference tables.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, AppError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading estimator config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}

/// Neighborhood tiers ranked by median sale price (report section 1.4.1).
pub fn reference_tiers() -> Vec<NeighborhoodTier> {
    [
        (1, "Tier 1 (MeadowV / IDOTRR)", 0.8),
        (2, "Tier 2 (Mitchel / OldTown)", 0.9),
        (3, "Tier 3 (NAmes / Gilbert)", 1.0),
        (4, "Tier 4 (CollgCr / Crawfor)", 1.15),
        (5, "Tier 5 (NoRidge / StoneBr)", 1.4),
    ]
    .into_iter()
    .map(|(rank, name, price_mod)| NeighborhoodTier {
        rank,
        name: name.to_string(),
        price_mod,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Adjustment;

    #[test]
    fn empty_toml_is_reference_config() {
        let cfg = EstimatorConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, EstimatorConfig::default());
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg = EstimatorConfig::from_toml_str(
            r#"
strict_weights = false
input_policy = "clamp"

[coefficients]
intercept = 0.0

[[models]]
name = "Lasso"
weight = 2.0
adjustment = { kind = "scale", factor = 1.0 }
"#,
        )
        .unwrap();

        assert!(!cfg.strict_weights);
        assert_eq!(cfg.input_policy, InputPolicy::Clamp);
        assert_eq!(cfg.coefficients.intercept, 0.0);
        assert_eq!(cfg.coefficients.area_rate, 75.0);
        assert_eq!(cfg.tiers, reference_tiers());
        assert_eq!(cfg.models.len(), 1);
        assert_eq!(cfg.models[0].adjustment, Adjustment::Scale { factor: 1.0 });
        assert_eq!(cfg.models[0].color, "#94a3b8");
    }

    #[test]
    fn reference_tiers_are_dense_and_ordered() {
        let tiers = reference_tiers();
        let ranks: Vec<i32> = tiers.iter().map(|t| t.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert!(tiers.windows(2).all(|w| w[0].price_mod < w[1].price_mod));
    }

    #[test]
    fn load_missing_file_is_usage_error() {
        let err = EstimatorConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
