//! Static report content: headline scores, single-model results, feature
//! correlations and Lasso coefficients from the Ames house-price study.
//!
//! Nothing here is computed; these are the published numbers the dashboard
//! displays next to the simulator.

/// Kind of learner, used to group the single-model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    Linear,
    Tree,
    Kernel,
}

impl ModelFamily {
    pub fn display_name(self) -> &'static str {
        match self {
            ModelFamily::Linear => "Linear",
            ModelFamily::Tree => "Tree",
            ModelFamily::Kernel => "Kernel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPerformance {
    pub name: &'static str,
    /// Cross-validated root-mean-squared log error (lower is better).
    pub rmsle: f64,
    pub family: ModelFamily,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureCategory {
    Space,
    Quality,
    History,
    Location,
}

impl FeatureCategory {
    pub fn display_name(self) -> &'static str {
        match self {
            FeatureCategory::Space => "Space",
            FeatureCategory::Quality => "Quality",
            FeatureCategory::History => "History",
            FeatureCategory::Location => "Location",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureCorrelation {
    pub feature: &'static str,
    /// Pearson correlation with sale price.
    pub correlation: f64,
    pub category: FeatureCategory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficient {
    pub name: &'static str,
    pub value: f64,
}

/// Headline numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectSummary {
    pub title: &'static str,
    pub samples: usize,
    pub features: usize,
    pub public_score: f64,
    pub final_rmsle: f64,
    pub ensemble_size: usize,
    /// Training rows with `GrLivArea` above this were dropped as outliers.
    pub outlier_area_threshold: f64,
}

pub const SUMMARY: ProjectSummary = ProjectSummary {
    title: "House price prediction on the Ames dataset",
    samples: 1460,
    features: 79,
    public_score: 0.12024,
    final_rmsle: 0.1099,
    ensemble_size: 6,
    outlier_area_threshold: 4000.0,
};

/// Pipeline stages shown on the overview page: `(stage, details)`.
pub const PIPELINE: [(&str, &str); 4] = [
    ("Raw data", "1460 samples, 79 features"),
    ("Cleaning", "drop GrLivArea > 4000; median / None imputation"),
    ("Feature engineering", "log1p target; Box-Cox on skewed features; neighborhood ranking"),
    ("Ensemble", "six heterogeneous models, weighted blending"),
];

pub const MODEL_PERFORMANCE: [ModelPerformance; 4] = [
    ModelPerformance {
        name: "Lasso",
        rmsle: 0.1099,
        family: ModelFamily::Linear,
        description: "High bias / low variance (best single model)",
    },
    ModelPerformance {
        name: "KRR",
        rmsle: 0.1153,
        family: ModelFamily::Kernel,
        description: "Medium bias / medium variance",
    },
    ModelPerformance {
        name: "XGBoost",
        rmsle: 0.1162,
        family: ModelFamily::Tree,
        description: "Low bias / high variance",
    },
    ModelPerformance {
        name: "Random Forest",
        rmsle: 0.1385,
        family: ModelFamily::Tree,
        description: "Low bias / low variance (bagging)",
    },
];

pub const TOP_FEATURES: [FeatureCorrelation; 8] = [
    FeatureCorrelation { feature: "OverallQual", correlation: 0.79, category: FeatureCategory::Quality },
    FeatureCorrelation { feature: "GrLivArea", correlation: 0.71, category: FeatureCategory::Space },
    FeatureCorrelation { feature: "GarageCars", correlation: 0.64, category: FeatureCategory::Space },
    FeatureCorrelation { feature: "TotalBsmtSF", correlation: 0.61, category: FeatureCategory::Space },
    FeatureCorrelation { feature: "FullBath", correlation: 0.56, category: FeatureCategory::Quality },
    FeatureCorrelation { feature: "YearBuilt", correlation: 0.52, category: FeatureCategory::History },
    FeatureCorrelation { feature: "MasVnrArea", correlation: 0.47, category: FeatureCategory::Quality },
    FeatureCorrelation { feature: "Fireplaces", correlation: 0.46, category: FeatureCategory::Quality },
];

pub const POSITIVE_COEFFICIENTS: [Coefficient; 10] = [
    Coefficient { name: "GrLivArea", value: 0.1113 },
    Coefficient { name: "TotalSF", value: 0.1110 },
    Coefficient { name: "OverallQual", value: 0.1031 },
    Coefficient { name: "Neighborhood_Crawfor", value: 0.0977 },
    Coefficient { name: "YearBuilt", value: 0.0867 },
    Coefficient { name: "Neighborhood_StoneBr", value: 0.0724 },
    Coefficient { name: "Functional_Typ", value: 0.0714 },
    Coefficient { name: "Exterior1st_BrkFace", value: 0.0580 },
    Coefficient { name: "KitchenQual_Ex", value: 0.0564 },
    Coefficient { name: "BsmtFinSF1", value: 0.0501 },
];

pub const NEGATIVE_COEFFICIENTS: [Coefficient; 10] = [
    Coefficient { name: "MSZoning_C (all)", value: -0.2709 },
    Coefficient { name: "SaleCondition_Abnorml", value: -0.0479 },
    Coefficient { name: "CentralAir_N", value: -0.0447 },
    Coefficient { name: "MSZoning_RM", value: -0.0401 },
    Coefficient { name: "BldgType_Duplex", value: -0.0305 },
    Coefficient { name: "KitchenAbvGr", value: -0.0289 },
    Coefficient { name: "Neighborhood_Edwards", value: -0.0281 },
    Coefficient { name: "SaleType_WD", value: -0.0253 },
    Coefficient { name: "Condition1_Artery", value: -0.0199 },
    Coefficient { name: "Neighborhood_Mitchel", value: -0.0198 },
];

/// The single model with the lowest RMSLE.
pub fn best_single_model() -> &'static ModelPerformance {
    MODEL_PERFORMANCE
        .iter()
        .min_by(|a, b| a.rmsle.partial_cmp(&b.rmsle).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(&MODEL_PERFORMANCE[0])
}
