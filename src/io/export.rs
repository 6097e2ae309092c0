//! Export a single prediction to JSON.
//!
//! The file carries enough context (inputs, noise settings, timestamp) to make
//! a seeded prediction reproducible later.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::PredictionResult;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFile {
    pub tool: String,
    pub generated_at: DateTime<Local>,
    /// `None` when noise was disabled or drawn from entropy.
    pub seed: Option<u64>,
    pub noise_amplitude: f64,
    pub prediction: PredictionResult,
}

impl PredictionFile {
    pub fn new(prediction: PredictionResult, seed: Option<u64>, noise_amplitude: f64) -> Self {
        Self {
            tool: format!("ames {}", env!("CARGO_PKG_VERSION")),
            generated_at: Local::now(),
            seed,
            noise_amplitude,
            prediction,
        }
    }
}

/// Write a prediction file as pretty-printed JSON.
pub fn write_prediction_json(path: &Path, file: &PredictionFile) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(file)
        .map_err(|e| AppError::new(4, format!("Failed to serialize prediction: {e}")))?;

    let mut out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    out.write_all(json.as_bytes())
        .and_then(|_| out.write_all(b"\n"))
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), "wrote prediction export");
    Ok(())
}

/// Read a prediction file written by `write_prediction_json`.
pub fn read_prediction_json(path: &Path) -> Result<PredictionFile, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(2, format!("Failed to read prediction JSON '{}': {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| AppError::new(2, format!("Invalid prediction JSON '{}': {e}", path.display())))
}
