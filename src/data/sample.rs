//! Synthetic area-vs-price sample for the outlier chart.
//!
//! The report's scatter plot is reproduced with generated data: a noisy linear
//! relationship on a log scale, plus the two famous training-set outliers
//! (very large houses that sold cheaply).

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Uniform;

use crate::catalog::SUMMARY;
use crate::error::AppError;

/// The report's two known outliers: `(area, price)`.
pub const KNOWN_OUTLIERS: [(f64, f64); 2] = [(4500.0, 180_000.0), (5200.0, 185_000.0)];

/// Default number of generated points.
pub const DEFAULT_SCATTER_POINTS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    /// Above-ground living area (sq ft).
    pub area: f64,
    /// Sale price (USD).
    pub price: f64,
    /// Flagged by the cleaning rule.
    pub outlier: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterStats {
    pub n_points: usize,
    pub n_outliers: usize,
    pub area_min: f64,
    pub area_max: f64,
    pub price_min: f64,
    pub price_max: f64,
}

#[derive(Debug, Clone)]
pub struct ScatterData {
    pub points: Vec<ScatterPoint>,
    pub threshold: f64,
    pub stats: ScatterStats,
}

/// Generate `n` scatter points from `seed`.
///
/// The first two points are always `KNOWN_OUTLIERS`; the rest follow
/// `price = (10000 + 80*area + U[-25000, 25000)) * exp(U[-0.1, 0.1))`.
pub fn generate_scatter(n: usize, seed: u64) -> Result<ScatterData, AppError> {
    if n < KNOWN_OUTLIERS.len() + 1 {
        return Err(AppError::new(
            2,
            format!("Scatter needs at least {} points.", KNOWN_OUTLIERS.len() + 1),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let area_dist = Uniform::new(500.0_f64, 3500.0);
    let price_noise = Uniform::new(-25_000.0_f64, 25_000.0);
    let log_noise = Uniform::new(-0.1_f64, 0.1);

    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        if let Some(&(area, price)) = KNOWN_OUTLIERS.get(i) {
            points.push(ScatterPoint {
                area,
                price,
                outlier: false,
            });
            continue;
        }

        let area = area_dist.sample(&mut rng);
        let linear = 10_000.0 + area * 80.0 + price_noise.sample(&mut rng);
        // The linear part stays positive for areas >= 500.
        let price = linear * log_noise.sample(&mut rng).exp();
        points.push(ScatterPoint {
            area,
            price,
            outlier: false,
        });
    }

    let threshold = SUMMARY.outlier_area_threshold;
    flag_outliers(&mut points, threshold);

    let stats = compute_stats(&points).ok_or_else(|| AppError::new(4, "Failed to compute scatter stats."))?;
    Ok(ScatterData {
        points,
        threshold,
        stats,
    })
}

/// Apply the cleaning rule: living area above `threshold` is an outlier.
pub fn flag_outliers(points: &mut [ScatterPoint], threshold: f64) {
    for p in points {
        p.outlier = p.area > threshold;
    }
}

fn compute_stats(points: &[ScatterPoint]) -> Option<ScatterStats> {
    if points.is_empty() {
        return None;
    }
    let mut stats = ScatterStats {
        n_points: points.len(),
        n_outliers: 0,
        area_min: f64::INFINITY,
        area_max: f64::NEG_INFINITY,
        price_min: f64::INFINITY,
        price_max: f64::NEG_INFINITY,
    };
    for p in points {
        if p.outlier {
            stats.n_outliers += 1;
        }
        stats.area_min = stats.area_min.min(p.area);
        stats.area_max = stats.area_max.max(p.area);
        stats.price_min = stats.price_min.min(p.price);
        stats.price_max = stats.price_max.max(p.price);
    }
    Some(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_outliers_are_first_and_flagged() {
        let data = generate_scatter(DEFAULT_SCATTER_POINTS, 42).unwrap();
        assert_eq!(data.points.len(), DEFAULT_SCATTER_POINTS);
        assert_eq!((data.points[0].area, data.points[0].price), KNOWN_OUTLIERS[0]);
        assert_eq!((data.points[1].area, data.points[1].price), KNOWN_OUTLIERS[1]);
        assert!(data.points[0].outlier && data.points[1].outlier);
        assert_eq!(data.stats.n_outliers, 2);
    }

    #[test]
    fn generated_points_stay_in_range() {
        let data = generate_scatter(500, 7).unwrap();
        for p in &data.points[2..] {
            assert!((500.0..3500.0).contains(&p.area));
            assert!(!p.outlier);
            // (10000 + 80*500 - 25000) * e^-0.1 is the smallest possible price.
            assert!(p.price > 22_000.0, "price={}", p.price);
        }
    }

    #[test]
    fn same_seed_same_scatter() {
        let a = generate_scatter(50, 9).unwrap();
        let b = generate_scatter(50, 9).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn too_few_points_is_rejected() {
        assert_eq!(generate_scatter(2, 1).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn flag_outliers_uses_strict_threshold() {
        let mut pts = vec![
            ScatterPoint { area: 4000.0, price: 1.0, outlier: true },
            ScatterPoint { area: 4000.5, price: 1.0, outlier: false },
        ];
        flag_outliers(&mut pts, 4000.0);
        assert!(!pts[0].outlier);
        assert!(pts[1].outlier);
    }
}
