//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed to the estimator as plain values
//! - exported to JSON/CSV
//! - loaded from a TOML configuration file

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One of the five house attributes the simulator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    OverallQual,
    GrLivArea,
    YearBuilt,
    NeighborhoodRank,
    GarageCars,
}

impl Attribute {
    /// Declaration order, also the row order of the TUI settings panel.
    pub const ALL: [Attribute; 5] = [
        Attribute::OverallQual,
        Attribute::GrLivArea,
        Attribute::YearBuilt,
        Attribute::NeighborhoodRank,
        Attribute::GarageCars,
    ];

    /// Snake-case field name (CSV headers, error messages).
    pub fn field_name(self) -> &'static str {
        match self {
            Attribute::OverallQual => "overall_qual",
            Attribute::GrLivArea => "gr_liv_area",
            Attribute::YearBuilt => "year_built",
            Attribute::NeighborhoodRank => "neighborhood_rank",
            Attribute::GarageCars => "garage_cars",
        }
    }

    /// Column name as it appears in the Ames dataset.
    pub fn dataset_name(self) -> &'static str {
        match self {
            Attribute::OverallQual => "OverallQual",
            Attribute::GrLivArea => "GrLivArea",
            Attribute::YearBuilt => "YearBuilt",
            Attribute::NeighborhoodRank => "NeighborhoodRank",
            Attribute::GarageCars => "GarageCars",
        }
    }

    /// Human-readable label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            Attribute::OverallQual => "Overall quality",
            Attribute::GrLivArea => "Living area (sq ft)",
            Attribute::YearBuilt => "Year built",
            Attribute::NeighborhoodRank => "Neighborhood tier",
            Attribute::GarageCars => "Garage (cars)",
        }
    }

    /// Inclusive domain `(min, max)`.
    pub fn domain(self) -> (i32, i32) {
        match self {
            Attribute::OverallQual => (1, 10),
            Attribute::GrLivArea => (500, 4000),
            Attribute::YearBuilt => (1900, 2010),
            Attribute::NeighborhoodRank => (1, 5),
            Attribute::GarageCars => (0, 4),
        }
    }

    /// Step size used by interactive controls.
    pub fn step(self) -> i32 {
        match self {
            Attribute::GrLivArea => 50,
            _ => 1,
        }
    }

    pub fn contains(self, value: i32) -> bool {
        let (lo, hi) = self.domain();
        (lo..=hi).contains(&value)
    }
}

/// Input to a single estimate.
///
/// Values are signed so out-of-domain input (e.g. a negative area coming from a
/// CSV file) can be represented and rejected with a precise error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseAttributes {
    pub overall_qual: i32,
    pub gr_liv_area: i32,
    pub year_built: i32,
    pub neighborhood_rank: i32,
    pub garage_cars: i32,
}

impl Default for HouseAttributes {
    /// The simulator's starting point: a typical mid-2000s house in a middle tier.
    fn default() -> Self {
        Self {
            overall_qual: 7,
            gr_liv_area: 1500,
            year_built: 2003,
            neighborhood_rank: 3,
            garage_cars: 2,
        }
    }
}

impl HouseAttributes {
    pub fn get(&self, attr: Attribute) -> i32 {
        match attr {
            Attribute::OverallQual => self.overall_qual,
            Attribute::GrLivArea => self.gr_liv_area,
            Attribute::YearBuilt => self.year_built,
            Attribute::NeighborhoodRank => self.neighborhood_rank,
            Attribute::GarageCars => self.garage_cars,
        }
    }

    pub fn set(&mut self, attr: Attribute, value: i32) {
        match attr {
            Attribute::OverallQual => self.overall_qual = value,
            Attribute::GrLivArea => self.gr_liv_area = value,
            Attribute::YearBuilt => self.year_built = value,
            Attribute::NeighborhoodRank => self.neighborhood_rank = value,
            Attribute::GarageCars => self.garage_cars = value,
        }
    }

    /// Move `attr` by `steps` control steps, staying inside its domain.
    pub fn nudge(&mut self, attr: Attribute, steps: i32) {
        let (lo, hi) = attr.domain();
        let next = self
            .get(attr)
            .saturating_add(steps.saturating_mul(attr.step()))
            .clamp(lo, hi);
        self.set(attr, next);
    }

    /// Return a copy with every field clamped into its domain.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for attr in Attribute::ALL {
            let (lo, hi) = attr.domain();
            out.set(attr, self.get(attr).clamp(lo, hi));
        }
        out
    }
}

/// A coarse price-multiplier bucket for a group of neighborhoods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborhoodTier {
    pub rank: i32,
    pub name: String,
    pub price_mod: f64,
}

/// What to do with attributes outside their domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    /// Fail with `InvalidInput`.
    #[default]
    Reject,
    /// Clamp into the domain before estimating.
    Clamp,
}

/// One pseudo-model's contribution to a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEstimate {
    pub name: String,
    /// Effective blend weight (after renormalization, if any).
    pub weight: f64,
    pub color: String,
    /// Noise-free price before clamping.
    pub deterministic: f64,
    /// Final price: `max(0, deterministic + noise)`.
    pub price: f64,
}

/// Output of a single estimate.
///
/// Recomputed on every input change; never stored by the estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Attributes actually used (after clamping, if enabled).
    pub attributes: HouseAttributes,
    pub raw_value: f64,
    pub price_mod: f64,
    pub adjusted_value: f64,
    /// Per-model estimates in table declaration order.
    pub estimates: Vec<ModelEstimate>,
    pub final_price: f64,
}

impl PredictionResult {
    pub fn estimate_for(&self, name: &str) -> Option<&ModelEstimate> {
        self.estimates.iter().find(|e| e.name == name)
    }
}
