//! Read/write fit JSON files.
//!
//! Fit JSON is the "portable" representation of a fitted Steinmetz model:
//! - coefficients (`k`, `a`, `b`) and diagnostics
//! - run metadata (tool, timestamp, source, dataset ranges)
//! - every input point with its fitted value, for re-plotting without the CSV
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{CurveFile, FitResult, PredictedPoint};
use crate::error::AppError;
use crate::io::ingest::IngestedData;

/// Assemble the saved representation of a fit.
pub fn build_curve_file(ingest: &IngestedData, fit: &FitResult, predictions: &[PredictedPoint]) -> CurveFile {
    CurveFile {
        tool: "corefit".to_string(),
        generated_at: Utc::now(),
        source: ingest.source.clone(),
        model: fit.model,
        quality: fit.quality.clone(),
        stats: ingest.stats.clone(),
        points: predictions.to_vec(),
    }
}

/// Write a fit JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;

    Ok(())
}

/// Read a fit JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    let curve: CurveFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))?;
    Ok(curve)
}
