//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the estimator stays free of presentation concerns
//! - output changes are localized (and covered by golden tests)

use crate::catalog::{
    self, Coefficient, MODEL_PERFORMANCE, NEGATIVE_COEFFICIENTS, PIPELINE, POSITIVE_COEFFICIENTS, SUMMARY,
    TOP_FEATURES,
};
use crate::data::ScatterData;
use crate::domain::PredictionResult;
use crate::estimator::Estimator;
use crate::plot::{Bar, render_bars, render_scatter};

/// Price that fills a whole bar in the per-model breakdown.
pub const PRICE_BAR_FULL_SCALE: f64 = 400_000.0;

/// How the noise for a prediction was drawn (for the summary header).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseLabel {
    Off,
    Seeded { seed: u64, amplitude: f64 },
    Entropy { amplitude: f64 },
}

/// Format a single prediction: inputs, intermediate values, final price, breakdown.
pub fn format_prediction(result: &PredictionResult, estimator: &Estimator, noise: NoiseLabel, bar_width: usize) -> String {
    let a = &result.attributes;
    let tier_name = estimator
        .tier(a.neighborhood_rank)
        .map(|t| t.name.as_str())
        .unwrap_or("unlisted");

    let mut out = String::new();
    out.push_str("=== ames - Ensemble price estimate ===\n");
    out.push_str(&format!(
        "Input: qual={} area={}sqft year={} tier={} ({tier_name}) garage={}\n",
        a.overall_qual, a.gr_liv_area, a.year_built, a.neighborhood_rank, a.garage_cars
    ));
    out.push_str(&format!(
        "Base: raw={} x {:.2} = {}\n",
        fmt_usd(result.raw_value),
        result.price_mod,
        fmt_usd(result.adjusted_value)
    ));
    out.push_str(&match noise {
        NoiseLabel::Off => "Noise: off\n".to_string(),
        NoiseLabel::Seeded { seed, amplitude } => {
            format!("Noise: uniform +/-{} (seed={seed})\n", fmt_thousands(amplitude))
        }
        NoiseLabel::Entropy { amplitude } => format!("Noise: uniform +/-{}\n", fmt_thousands(amplitude)),
    });

    out.push_str(&format!(
        "\nFinal price (weighted ensemble): {}\n\n",
        fmt_usd(result.final_price)
    ));

    out.push_str("Per-model estimates:\n");
    out.push_str(&format!("{:<12} {:>6} {:>12} {:>12}\n", "model", "weight", "price", "noise-free"));
    out.push_str(&format!("{:-<12} {:->6} {:->12} {:->12}\n", "", "", "", ""));
    for e in &result.estimates {
        out.push_str(&format!(
            "{:<12} {:>6.2} {:>12} {:>12}\n",
            truncate(&e.name, 12),
            e.weight,
            fmt_usd(e.price),
            fmt_usd(e.deterministic)
        ));
    }

    out.push('\n');
    let bars: Vec<Bar> = result
        .estimates
        .iter()
        .map(|e| Bar::new(e.name.clone(), e.price, fmt_usd(e.price)))
        .collect();
    out.push_str(&render_bars(&bars, PRICE_BAR_FULL_SCALE, bar_width));
    out
}

/// Headline numbers and the modelling pipeline.
pub fn format_overview() -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", SUMMARY.title));
    out.push_str(&format!(
        "Data: {} samples, {} features\n",
        SUMMARY.samples, SUMMARY.features
    ));
    out.push_str(&format!(
        "Public score: {:.5} | Final RMSLE: {:.4} | {}-model ensemble\n",
        SUMMARY.public_score, SUMMARY.final_rmsle, SUMMARY.ensemble_size
    ));
    out.push_str("\nPipeline:\n");
    for (i, (stage, details)) in PIPELINE.iter().enumerate() {
        out.push_str(&format!("{}. {stage:<20} {details}\n", i + 1));
    }
    out
}

/// Single-model RMSLE comparison.
pub fn format_models(bar_width: usize) -> String {
    let best = catalog::best_single_model();
    let mut out = String::new();
    out.push_str("Single-model performance (RMSLE, lower is better):\n");
    out.push_str(&format!("  {:<14} {:>7} {:<7} {}\n", "model", "rmsle", "family", "notes"));
    for m in &MODEL_PERFORMANCE {
        let mark = if m.name == best.name { "*" } else { " " };
        out.push_str(&format!(
            "{mark} {:<14} {:>7.4} {:<7} {}\n",
            m.name,
            m.rmsle,
            m.family.display_name(),
            m.description
        ));
    }

    // Bars start at 0.10 so the differences are visible, like the report's chart.
    let floor = 0.10;
    let bars: Vec<Bar> = MODEL_PERFORMANCE
        .iter()
        .map(|m| Bar::new(m.name, m.rmsle - floor, format!("{:.4}", m.rmsle)))
        .collect();
    out.push('\n');
    out.push_str(&render_bars(&bars, 0.15 - floor, bar_width));
    out
}

/// Ensemble weights of the configured pseudo-models.
pub fn format_weights(estimator: &Estimator, bar_width: usize) -> String {
    let mut out = String::new();
    out.push_str("Ensemble weights:\n");
    out.push_str(&format!("{:<12} {:>6} {:<8} {}\n", "model", "weight", "color", "role"));
    for (m, w) in estimator.models().iter().zip(estimator.weights()) {
        out.push_str(
            format!("{:<12} {:>6.2} {:<8} {}\n", truncate(&m.name, 12), w, m.color, m.role)
                .trim_end(),
        );
        out.push('\n');
    }
    let bars: Vec<Bar> = estimator
        .models()
        .iter()
        .zip(estimator.weights())
        .map(|(m, &w)| Bar::new(m.name.clone(), w, format!("{:.0}%", w * 100.0)))
        .collect();
    out.push('\n');
    out.push_str(&render_bars(&bars, 1.0, bar_width));
    out
}

/// Neighborhood tiers and their price multipliers.
pub fn format_tiers(estimator: &Estimator) -> String {
    let mut out = String::new();
    out.push_str("Neighborhood tiers (by median sale price):\n");
    for t in estimator.tiers() {
        out.push_str(&format!("{} {:<30} x{:.2}\n", t.rank, t.name, t.price_mod));
    }
    out
}

/// Correlations, Lasso coefficients and the outlier scatter.
pub fn format_eda(scatter: &ScatterData, width: usize, height: usize) -> String {
    let mut out = String::new();

    out.push_str("Top correlations with SalePrice:\n");
    let bars: Vec<Bar> = TOP_FEATURES
        .iter()
        .map(|f| {
            Bar::new(
                f.feature,
                f.correlation,
                format!("{:.2} ({})", f.correlation, f.category.display_name()),
            )
        })
        .collect();
    out.push_str(&render_bars(&bars, 1.0, width / 2));

    out.push_str(&format!(
        "\nOutliers: {} of {} points above {:.0} sq ft\n",
        scatter.stats.n_outliers, scatter.stats.n_points, scatter.threshold
    ));
    out.push_str(&render_scatter(&scatter.points, scatter.threshold, width, height));

    out.push_str("\nLasso coefficients, top positive drivers:\n");
    out.push_str(&coefficient_bars(&POSITIVE_COEFFICIENTS, width / 2));
    out.push_str("\nLasso coefficients, top negative drivers:\n");
    out.push_str(&coefficient_bars(&NEGATIVE_COEFFICIENTS, width / 2));
    out
}

fn coefficient_bars(coefs: &[Coefficient], width: usize) -> String {
    let scale = coefs.iter().map(|c| c.value.abs()).fold(0.0, f64::max);
    let bars: Vec<Bar> = coefs
        .iter()
        .map(|c| Bar::new(c.name, c.value, format!("{:+.4}", c.value)))
        .collect();
    render_bars(&bars, scale, width)
}

/// `$1,234,567` (rounded to whole dollars).
pub fn fmt_usd(v: f64) -> String {
    if v < 0.0 {
        format!("-${}", fmt_thousands(-v))
    } else {
        format!("${}", fmt_thousands(v))
    }
}

/// `1,234,567` (rounded, non-negative input).
pub fn fmt_thousands(v: f64) -> String {
    let digits = format!("{:.0}", v.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EstimatorConfig;
    use crate::data::generate_scatter;
    use crate::domain::HouseAttributes;
    use crate::estimator::ZeroNoise;

    fn reference() -> Estimator {
        Estimator::new(EstimatorConfig::default()).unwrap()
    }

    #[test]
    fn usd_formatting() {
        assert_eq!(fmt_usd(0.0), "$0");
        assert_eq!(fmt_usd(999.4), "$999");
        assert_eq!(fmt_usd(208_268.4), "$208,268");
        assert_eq!(fmt_usd(1_234_567.0), "$1,234,567");
        assert_eq!(fmt_usd(-27_500.0), "-$27,500");
    }

    #[test]
    fn prediction_summary_lists_every_model() {
        let est = reference();
        let result = est.estimate(&HouseAttributes::default(), &mut ZeroNoise).unwrap();
        let txt = format_prediction(&result, &est, NoiseLabel::Off, 20);

        assert!(txt.contains("Input: qual=7 area=1500sqft year=2003 tier=3 (Tier 3 (NAmes / Gilbert)) garage=2"));
        assert!(txt.contains("Base: raw=$209,000 x 1.00 = $209,000"));
        assert!(txt.contains("Noise: off"));
        assert!(txt.contains(&format!("Final price (weighted ensemble): {}", fmt_usd(result.final_price))));
        for m in est.models() {
            assert!(txt.contains(&m.name), "missing {}", m.name);
        }
        assert!(txt.contains("KRR            0.05     $198,550     $198,550"));
    }

    #[test]
    fn weights_table_shows_percentages() {
        let txt = format_weights(&reference(), 10);
        assert!(txt.contains("Lasso          0.33 #3b82f6  Base model (linear)"));
        assert!(txt.contains("33%"));
    }

    #[test]
    fn models_table_marks_best() {
        let txt = format_models(10);
        assert!(txt.contains("* Lasso"));
        assert!(txt.contains("  Random Forest"));
    }

    #[test]
    fn eda_mentions_outliers() {
        let scatter = generate_scatter(50, 1).unwrap();
        let txt = format_eda(&scatter, 40, 10);
        assert!(txt.contains("Outliers: 2 of 50 points above 4000 sq ft"));
        assert!(txt.contains("MSZoning_C (all)"));
        assert!(txt.contains("-0.2709"));
    }

    #[test]
    fn overview_lists_pipeline() {
        let txt = format_overview();
        assert!(txt.contains("Public score: 0.12024 | Final RMSLE: 0.1099 | 6-model ensemble"));
        assert!(txt.contains("2. Cleaning"));
    }
}
