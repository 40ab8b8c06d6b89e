//! CSV exports.
//!
//! - per-point fit results (measured vs fitted), easy to consume in spreadsheets
//! - raw measurements (used by `corefit sample`), readable by the ingest module

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{Measurement, PredictedPoint};
use crate::error::AppError;

/// Write per-point results to a CSV file.
pub fn write_results_csv(path: &Path, predictions: &[PredictedPoint]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_results(file, predictions)
}

fn write_results<W: Write>(mut out: W, predictions: &[PredictedPoint]) -> Result<(), AppError> {
    writeln!(out, "coreloss,bac,fs,predicted_coreloss,log_residual")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for p in predictions {
        let m = &p.measurement;
        writeln!(
            out,
            "{},{},{},{:.10},{:.10}",
            m.coreloss, m.bac, m.fs, p.predicted_coreloss, p.log_residual
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write raw measurements to a CSV file with `coreloss,bac,fs` headers.
pub fn write_measurements_csv(path: &Path, points: &[Measurement]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
    write_measurements(file, points)
}

fn write_measurements<W: Write>(mut out: W, points: &[Measurement]) -> Result<(), AppError> {
    writeln!(out, "coreloss,bac,fs")
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;
    for m in points {
        writeln!(out, "{},{},{}", m.coreloss, m.bac, m.fs)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }
    Ok(())
}
