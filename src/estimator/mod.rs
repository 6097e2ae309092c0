//! The ensemble estimator.
//!
//! Pipeline for one call:
//! attributes -> validation -> tier lookup -> base value -> per-model price -> blend
//!
//! The estimator is immutable after construction, so one instance can be shared
//! freely between threads (the batch evaluator does exactly that).

use crate::config::{BaseCoefficients, EstimatorConfig};
use crate::domain::{Attribute, HouseAttributes, InputPolicy, ModelEstimate, NeighborhoodTier, PredictionResult};
use crate::error::EstimateError;
use crate::models::PseudoModel;

pub mod noise;
pub mod validate;

pub use noise::{NoiseSource, UniformNoise, ZeroNoise, row_seed};

/// Multiplier used for in-domain ranks that have no tier entry.
pub const FALLBACK_PRICE_MOD: f64 = 1.0;

/// Noise-free intermediate values of one estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseValue {
    pub attributes: HouseAttributes,
    pub raw: f64,
    pub price_mod: f64,
    pub adjusted: f64,
}

#[derive(Debug, Clone)]
pub struct Estimator {
    tiers: Vec<NeighborhoodTier>,
    models: Vec<PseudoModel>,
    weights: Vec<f64>,
    coefficients: BaseCoefficients,
    noise_amplitude: f64,
    input_policy: InputPolicy,
    rank_fallback: bool,
}

impl Estimator {
    /// Validate `config` and build an estimator from it.
    pub fn new(config: EstimatorConfig) -> Result<Self, EstimateError> {
        let weights = validate::validate_config(&config)?;
        let mut tiers = config.tiers;
        tiers.sort_by_key(|t| t.rank);

        tracing::debug!(
            models = config.models.len(),
            tiers = tiers.len(),
            strict = config.strict_weights,
            "estimator ready"
        );

        Ok(Self {
            tiers,
            models: config.models,
            weights,
            coefficients: config.coefficients,
            noise_amplitude: config.noise_amplitude,
            input_policy: config.input_policy,
            rank_fallback: config.rank_fallback,
        })
    }

    /// Pseudo-models in declaration order.
    pub fn models(&self) -> &[PseudoModel] {
        &self.models
    }

    /// Effective weights, aligned with `models()`.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Tiers sorted by rank.
    pub fn tiers(&self) -> &[NeighborhoodTier] {
        &self.tiers
    }

    pub fn noise_amplitude(&self) -> f64 {
        self.noise_amplitude
    }

    pub fn tier(&self, rank: i32) -> Option<&NeighborhoodTier> {
        self.tiers.iter().find(|t| t.rank == rank)
    }

    /// Multiplier for an already validated rank.
    fn price_mod(&self, rank: i32) -> Result<f64, EstimateError> {
        if let Some(tier) = self.tier(rank) {
            return Ok(tier.price_mod);
        }
        if self.rank_fallback {
            tracing::debug!(rank, "no tier for rank, using neutral multiplier");
            return Ok(FALLBACK_PRICE_MOD);
        }
        Err(EstimateError::invalid_input(
            Attribute::NeighborhoodRank.field_name(),
            rank.into(),
            "no tier configured for this rank",
        ))
    }

    /// Validate `attrs` and compute the tier-adjusted base value.
    pub fn base_value(&self, attrs: &HouseAttributes) -> Result<BaseValue, EstimateError> {
        let attributes = validate::check_attributes(attrs, self.input_policy)?;
        let price_mod = self.price_mod(attributes.neighborhood_rank)?;
        let raw = raw_value(&self.coefficients, &attributes);
        Ok(BaseValue {
            attributes,
            raw,
            price_mod,
            adjusted: raw * price_mod,
        })
    }

    /// Noise-free, unclamped price of every model, in declaration order.
    pub fn deterministic_prices(&self, attrs: &HouseAttributes) -> Result<Vec<f64>, EstimateError> {
        let base = self.base_value(attrs)?;
        Ok(self
            .models
            .iter()
            .map(|m| m.adjustment.apply(base.adjusted, &base.attributes))
            .collect())
    }

    /// Estimate a price for `attrs`, drawing one perturbation per model from `noise`.
    pub fn estimate<N: NoiseSource + ?Sized>(
        &self,
        attrs: &HouseAttributes,
        noise: &mut N,
    ) -> Result<PredictionResult, EstimateError> {
        let base = self.base_value(attrs)?;

        let mut estimates = Vec::with_capacity(self.models.len());
        for (model, &weight) in self.models.iter().zip(&self.weights) {
            let deterministic = model.adjustment.apply(base.adjusted, &base.attributes);
            let price = (deterministic + noise.sample(self.noise_amplitude)).max(0.0);
            estimates.push(ModelEstimate {
                name: model.name.clone(),
                weight,
                color: model.color.clone(),
                deterministic,
                price,
            });
        }

        let final_price = blend(&estimates);
        tracing::debug!(
            adjusted = base.adjusted,
            final_price,
            "estimate computed"
        );

        Ok(PredictionResult {
            attributes: base.attributes,
            raw_value: base.raw,
            price_mod: base.price_mod,
            adjusted_value: base.adjusted,
            estimates,
            final_price,
        })
    }
}

/// Base linear value before the neighborhood multiplier.
pub fn raw_value(c: &BaseCoefficients, attrs: &HouseAttributes) -> f64 {
    f64::from(attrs.gr_liv_area) * c.area_rate
        + (f64::from(attrs.overall_qual) - f64::from(c.quality_pivot)) * c.quality_step
        + (f64::from(attrs.year_built) - f64::from(c.year_pivot)) * c.year_step
        + f64::from(attrs.garage_cars) * c.garage_step
        + c.intercept
}

/// Weighted sum of per-model prices.
pub fn blend(estimates: &[ModelEstimate]) -> f64 {
    estimates.iter().map(|e| e.price * e.weight).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Adjustment;

    fn reference() -> Estimator {
        Estimator::new(EstimatorConfig::default()).unwrap()
    }

    fn sample_attrs() -> HouseAttributes {
        HouseAttributes {
            overall_qual: 7,
            gr_liv_area: 1500,
            year_built: 2003,
            neighborhood_rank: 3,
            garage_cars: 2,
        }
    }

    /// Returns the same offset on every draw.
    struct ConstantNoise(f64);

    impl NoiseSource for ConstantNoise {
        fn sample(&mut self, _amplitude: f64) -> f64 {
            self.0
        }
    }

    #[test]
    fn worked_example_matches_reference_values() {
        let est = reference();
        let result = est.estimate(&sample_attrs(), &mut ZeroNoise).unwrap();

        assert_eq!(result.raw_value, 209_000.0);
        assert_eq!(result.price_mod, 1.0);
        assert_eq!(result.adjusted_value, 209_000.0);

        let expected = [
            ("Lasso", 209_000.0),
            ("XGBoost", 209_000.0),
            ("LightGBM", 213_180.0),
            ("GBR", 204_820.0),
            ("ElasticNet", 206_910.0),
            ("KRR", 198_550.0),
        ];
        assert_eq!(result.estimates.len(), expected.len());
        for (e, (name, price)) in result.estimates.iter().zip(expected) {
            assert_eq!(e.name, name);
            assert!((e.price - price).abs() < 1e-6, "{name}: {}", e.price);
        }

        assert!((result.final_price - 208_268.5).abs() < 1e-6, "{}", result.final_price);
    }

    #[test]
    fn output_order_follows_declaration_order() {
        let est = reference();
        let mut noise = UniformNoise::seeded(3);
        let names: Vec<String> = est
            .estimate(&sample_attrs(), &mut noise)
            .unwrap()
            .estimates
            .into_iter()
            .map(|e| e.name)
            .collect();
        let declared: Vec<String> = est.models().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, declared);
    }

    #[test]
    fn zero_noise_is_deterministic() {
        let est = reference();
        let a = est.estimate(&sample_attrs(), &mut ZeroNoise).unwrap();
        let b = est.estimate(&sample_attrs(), &mut ZeroNoise).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn same_seed_same_result() {
        let est = reference();
        let a = est.estimate(&sample_attrs(), &mut UniformNoise::seeded(99)).unwrap();
        let b = est.estimate(&sample_attrs(), &mut UniformNoise::seeded(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn noise_stays_within_amplitude() {
        let est = reference();
        let mut noise = UniformNoise::seeded(11);
        for _ in 0..200 {
            let r = est.estimate(&sample_attrs(), &mut noise).unwrap();
            for e in &r.estimates {
                assert!((e.price - e.deterministic).abs() <= 2_500.0);
            }
        }
    }

    #[test]
    fn xgboost_threshold_is_strict() {
        let est = reference();
        let at = |q: i32| {
            let attrs = HouseAttributes {
                overall_qual: q,
                ..sample_attrs()
            };
            let r = est.estimate(&attrs, &mut ZeroNoise).unwrap();
            let xgb = r.estimate_for("XGBoost").unwrap().price;
            xgb / r.adjusted_value
        };
        assert!((at(8) - 1.00).abs() < 1e-12);
        assert!((at(9) - 1.10).abs() < 1e-12);
    }

    #[test]
    fn quality_is_monotone_in_deterministic_price() {
        let est = reference();
        for area in [500, 1500, 4000] {
            for rank in 1..=5 {
                let mut prev: Option<Vec<f64>> = None;
                for q in 1..=10 {
                    let attrs = HouseAttributes {
                        overall_qual: q,
                        gr_liv_area: area,
                        neighborhood_rank: rank,
                        ..sample_attrs()
                    };
                    let prices = est.deterministic_prices(&attrs).unwrap();
                    if let Some(p) = &prev {
                        for (lo, hi) in p.iter().zip(&prices) {
                            assert!(hi > lo, "q={q} area={area} rank={rank}: {lo} -> {hi}");
                        }
                    }
                    prev = Some(prices);
                }
            }
        }
    }

    #[test]
    fn prices_are_never_negative() {
        let est = reference();
        let cheapest = HouseAttributes {
            overall_qual: 1,
            gr_liv_area: 500,
            year_built: 1900,
            neighborhood_rank: 1,
            garage_cars: 0,
        };
        let r = est.estimate(&cheapest, &mut UniformNoise::seeded(5)).unwrap();
        assert!(r.raw_value < 0.0);
        assert!(r.estimates.iter().all(|e| e.price == 0.0));
        assert_eq!(r.final_price, 0.0);
    }

    #[test]
    fn negative_noise_is_clamped_at_zero() {
        let est = reference();
        let r = est.estimate(&sample_attrs(), &mut ConstantNoise(-1e9)).unwrap();
        assert!(r.estimates.iter().all(|e| e.price == 0.0));
    }

    #[test]
    fn tier_multiplier_is_applied() {
        let est = reference();
        let attrs = HouseAttributes {
            neighborhood_rank: 5,
            ..sample_attrs()
        };
        let base = est.base_value(&attrs).unwrap();
        assert_eq!(base.price_mod, 1.4);
        assert!((base.adjusted - 209_000.0 * 1.4).abs() < 1e-6);
    }

    #[test]
    fn out_of_domain_input_is_rejected() {
        let est = reference();
        for attrs in [
            HouseAttributes { overall_qual: 11, ..sample_attrs() },
            HouseAttributes { gr_liv_area: 499, ..sample_attrs() },
            HouseAttributes { year_built: 2011, ..sample_attrs() },
            HouseAttributes { neighborhood_rank: 6, ..sample_attrs() },
            HouseAttributes { neighborhood_rank: -1, ..sample_attrs() },
            HouseAttributes { garage_cars: 5, ..sample_attrs() },
        ] {
            let err = est.estimate(&attrs, &mut ZeroNoise).unwrap_err();
            assert!(matches!(err, EstimateError::InvalidInput { .. }), "{attrs:?}");
        }
    }

    #[test]
    fn clamp_policy_estimates_clamped_attributes() {
        let est = Estimator::new(EstimatorConfig {
            input_policy: InputPolicy::Clamp,
            ..EstimatorConfig::default()
        })
        .unwrap();
        let r = est
            .estimate(
                &HouseAttributes {
                    gr_liv_area: 10_000,
                    ..sample_attrs()
                },
                &mut ZeroNoise,
            )
            .unwrap();
        assert_eq!(r.attributes.gr_liv_area, 4000);
    }

    #[test]
    fn unlisted_rank_falls_back_or_fails() {
        let mut cfg = EstimatorConfig::default();
        cfg.tiers.retain(|t| t.rank != 4);
        let attrs = HouseAttributes {
            neighborhood_rank: 4,
            ..sample_attrs()
        };

        let lenient = Estimator::new(cfg.clone()).unwrap();
        assert_eq!(lenient.base_value(&attrs).unwrap().price_mod, FALLBACK_PRICE_MOD);

        let strict = Estimator::new(EstimatorConfig {
            rank_fallback: false,
            ..cfg
        })
        .unwrap();
        assert!(matches!(
            strict.base_value(&attrs),
            Err(EstimateError::InvalidInput { field: "neighborhood_rank", .. })
        ));
    }

    #[test]
    fn renormalized_weights_blend_to_convex_combination() {
        let est = Estimator::new(EstimatorConfig {
            strict_weights: false,
            models: vec![
                PseudoModel::new("A", 2.0, "", "#000000", Adjustment::Scale { factor: 1.0 }),
                PseudoModel::new("B", 2.0, "", "#000000", Adjustment::Scale { factor: 0.5 }),
            ],
            ..EstimatorConfig::default()
        })
        .unwrap();
        let r = est.estimate(&sample_attrs(), &mut ZeroNoise).unwrap();
        assert!((r.final_price - 209_000.0 * 0.75).abs() < 1e-6);
    }

    #[test]
    fn extreme_pivots_do_not_overflow() {
        let mut config = EstimatorConfig::default();
        config.coefficients.quality_pivot = i32::MIN;
        config.coefficients.year_pivot = i32::MAX;
        let est = Estimator::new(config).unwrap();
        let r = est.estimate(&sample_attrs(), &mut ZeroNoise).unwrap();
        assert!(r.raw_value.is_finite());
    }

    #[test]
    fn nan_coefficient_fails_construction() {
        let mut config = EstimatorConfig::default();
        config.coefficients.intercept = f64::NAN;
        assert!(matches!(
            Estimator::new(config),
            Err(EstimateError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn estimator_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Estimator>();
    }
}
