//! Configuration and input validation.

use std::collections::HashSet;

use crate::config::EstimatorConfig;
use crate::domain::{Attribute, HouseAttributes, InputPolicy};
use crate::error::EstimateError;

/// Tolerance for the "weights sum to one" check.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Check the injected tables and return the effective blend weights.
///
/// Under `strict_weights` the weights must already sum to 1; otherwise they are
/// renormalized by their sum.
pub fn validate_config(config: &EstimatorConfig) -> Result<Vec<f64>, EstimateError> {
    if config.models.is_empty() {
        return Err(EstimateError::invalid_config("model table is empty"));
    }

    let mut names = HashSet::new();
    for m in &config.models {
        if !(m.weight.is_finite() && m.weight >= 0.0) {
            return Err(EstimateError::invalid_config(format!(
                "model '{}' has invalid weight {}",
                m.name, m.weight
            )));
        }
        if !names.insert(m.name.as_str()) {
            return Err(EstimateError::invalid_config(format!("duplicate model name '{}'", m.name)));
        }
        if m.adjustment.factors().iter().any(|f| !(f.is_finite() && *f >= 0.0)) {
            return Err(EstimateError::invalid_config(format!(
                "model '{}' has an invalid adjustment factor",
                m.name
            )));
        }
    }

    let mut ranks = HashSet::new();
    for tier in &config.tiers {
        if !Attribute::NeighborhoodRank.contains(tier.rank) {
            return Err(EstimateError::invalid_config(format!(
                "tier rank {} is outside 1..=5",
                tier.rank
            )));
        }
        if !ranks.insert(tier.rank) {
            return Err(EstimateError::invalid_config(format!("duplicate tier rank {}", tier.rank)));
        }
        if !(tier.price_mod.is_finite() && tier.price_mod > 0.0) {
            return Err(EstimateError::invalid_config(format!(
                "tier {} has invalid price_mod {}",
                tier.rank, tier.price_mod
            )));
        }
    }

    let c = &config.coefficients;
    for (name, value) in [
        ("area_rate", c.area_rate),
        ("quality_step", c.quality_step),
        ("year_step", c.year_step),
        ("garage_step", c.garage_step),
        ("intercept", c.intercept),
    ] {
        if !value.is_finite() {
            return Err(EstimateError::invalid_config(format!("coefficient {name} is not finite ({value})")));
        }
    }

    if !(config.noise_amplitude.is_finite() && config.noise_amplitude >= 0.0) {
        return Err(EstimateError::invalid_config(format!(
            "noise amplitude must be >= 0, got {}",
            config.noise_amplitude
        )));
    }

    let total: f64 = config.models.iter().map(|m| m.weight).sum();
    if total <= 0.0 {
        return Err(EstimateError::invalid_config("model weights sum to zero"));
    }

    if (total - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
        return Ok(config.models.iter().map(|m| m.weight).collect());
    }

    if config.strict_weights {
        return Err(EstimateError::invalid_config(format!(
            "model weights sum to {total:.6}, expected 1.0"
        )));
    }

    tracing::warn!(total, "renormalizing model weights");
    Ok(config.models.iter().map(|m| m.weight / total).collect())
}

/// Apply the input policy to `attrs`.
///
/// A non-positive neighborhood rank is rejected under every policy; it is not
/// a tier code at all.
pub fn check_attributes(attrs: &HouseAttributes, policy: InputPolicy) -> Result<HouseAttributes, EstimateError> {
    if attrs.neighborhood_rank <= 0 {
        return Err(EstimateError::invalid_input(
            Attribute::NeighborhoodRank.field_name(),
            attrs.neighborhood_rank.into(),
            "rank must be a positive integer",
        ));
    }

    match policy {
        InputPolicy::Reject => {
            for attr in Attribute::ALL {
                let value = attrs.get(attr);
                if !attr.contains(value) {
                    let (lo, hi) = attr.domain();
                    return Err(EstimateError::invalid_input(
                        attr.field_name(),
                        value.into(),
                        format!("expected {lo}..={hi}"),
                    ));
                }
            }
            Ok(*attrs)
        }
        InputPolicy::Clamp => {
            let clamped = attrs.clamped();
            if clamped != *attrs {
                tracing::debug!(?attrs, ?clamped, "clamped out-of-domain attributes");
            }
            Ok(clamped)
        }
    }
}
