//! Pseudo-model evaluation.
//!
//! Each pseudo-model is a plain record. Its behavior is described by an
//! `Adjustment` applied to the tier-adjusted base value, so adding or removing
//! a model is a table change rather than a code change.

use serde::{Deserialize, Serialize};

use crate::domain::HouseAttributes;

/// Deterministic multiplier rule applied to the adjusted base value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Adjustment {
    /// `adjusted * factor`.
    Scale { factor: f64 },
    /// `adjusted * above` when `overall_qual > threshold`, else `adjusted * otherwise`.
    QualityThreshold {
        threshold: i32,
        above: f64,
        otherwise: f64,
    },
}

impl Adjustment {
    /// Multiplier selected for the given attributes.
    pub fn factor(&self, attrs: &HouseAttributes) -> f64 {
        match *self {
            Adjustment::Scale { factor } => factor,
            Adjustment::QualityThreshold {
                threshold,
                above,
                otherwise,
            } => {
                if attrs.overall_qual > threshold {
                    above
                } else {
                    otherwise
                }
            }
        }
    }

    /// Noise-free price for this rule.
    pub fn apply(&self, adjusted: f64, attrs: &HouseAttributes) -> f64 {
        adjusted * self.factor(attrs)
    }

    /// All multipliers this rule can produce (used for validation).
    pub fn factors(&self) -> Vec<f64> {
        match *self {
            Adjustment::Scale { factor } => vec![factor],
            Adjustment::QualityThreshold { above, otherwise, .. } => vec![above, otherwise],
        }
    }
}

/// A named member of the blended ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PseudoModel {
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub role: String,
    /// Display colour as `#rrggbb`.
    #[serde(default = "default_color")]
    pub color: String,
    pub adjustment: Adjustment,
}

fn default_color() -> String {
    "#94a3b8".to_string()
}

impl PseudoModel {
    pub fn new(name: &str, weight: f64, role: &str, color: &str, adjustment: Adjustment) -> Self {
        Self {
            name: name.to_string(),
            weight,
            role: role.to_string(),
            color: color.to_string(),
            adjustment,
        }
    }
}

/// The six-model blend from the report (Table 2).
pub fn reference_models() -> Vec<PseudoModel> {
    vec![
        PseudoModel::new(
            "Lasso",
            0.33,
            "Base model (linear)",
            "#3b82f6",
            Adjustment::Scale { factor: 1.00 },
        ),
        PseudoModel::new(
            "XGBoost",
            0.22,
            "Non-linear interactions",
            "#10b981",
            Adjustment::QualityThreshold {
                threshold: 8,
                above: 1.10,
                otherwise: 1.00,
            },
        ),
        PseudoModel::new(
            "LightGBM",
            0.15,
            "Diversity (histogram)",
            "#f59e0b",
            Adjustment::Scale { factor: 1.02 },
        ),
        PseudoModel::new(
            "GBR",
            0.15,
            "Gradient boosting",
            "#ef4444",
            Adjustment::Scale { factor: 0.98 },
        ),
        PseudoModel::new(
            "ElasticNet",
            0.10,
            "Regularization stability",
            "#6366f1",
            Adjustment::Scale { factor: 0.99 },
        ),
        PseudoModel::new(
            "KRR",
            0.05,
            "Kernel mapping",
            "#8b5cf6",
            Adjustment::Scale { factor: 0.95 },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs_with_qual(q: i32) -> HouseAttributes {
        HouseAttributes {
            overall_qual: q,
            ..HouseAttributes::default()
        }
    }

    #[test]
    fn quality_threshold_is_strictly_greater_than() {
        let rule = Adjustment::QualityThreshold {
            threshold: 8,
            above: 1.10,
            otherwise: 1.00,
        };
        assert_eq!(rule.factor(&attrs_with_qual(8)), 1.00);
        assert_eq!(rule.factor(&attrs_with_qual(9)), 1.10);
    }

    #[test]
    fn reference_weights_sum_to_one() {
        let total: f64 = reference_models().iter().map(|m| m.weight).sum();
        assert!((total - 1.0).abs() < 1e-6, "sum={total}");
    }

    #[test]
    fn adjustment_toml_shape() {
        let rule: Adjustment = toml::from_str("kind = \"scale\"\nfactor = 0.97").unwrap();
        assert_eq!(rule, Adjustment::Scale { factor: 0.97 });
    }
}
