//! Reporting utilities: per-point predictions, residual rankings, and
//! formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

pub mod format;

pub use format::*;

use crate::domain::{FitResult, Measurement, PredictedPoint};
use crate::error::AppError;
use crate::models::{predict, predict_log};

/// Largest log residuals on each side (top-N each).
#[derive(Debug, Clone)]
pub struct Rankings {
    /// Positive residuals: measured loss above the fit.
    pub under_predicted: Vec<PredictedPoint>,
    /// Negative residuals: measured loss below the fit.
    pub over_predicted: Vec<PredictedPoint>,
}

/// Reapply the fitted coefficients to every measurement, preserving input order.
pub fn compute_predictions(points: &[Measurement], fit: &FitResult) -> Result<Vec<PredictedPoint>, AppError> {
    let mut out = Vec::with_capacity(points.len());
    for m in points {
        let predicted_coreloss = predict(&fit.model, m.bac, m.fs);
        if !predicted_coreloss.is_finite() {
            return Err(AppError::new(4, "Non-finite model prediction during residual computation."));
        }
        let log_residual = m.coreloss.ln() - predict_log(&fit.model, m.bac, m.fs);
        out.push(PredictedPoint {
            measurement: *m,
            predicted_coreloss,
            log_residual,
        });
    }
    Ok(out)
}

/// Rank the top under- and over-predicted points by log residual.
///
/// Only strictly positive (resp. negative) residuals are listed.
pub fn rank_residuals(predictions: &[PredictedPoint], top_n: usize) -> Rankings {
    let mut sorted = predictions.to_vec();
    sorted.sort_by(|a, b| b.log_residual.total_cmp(&a.log_residual));

    let under_predicted = sorted
        .iter()
        .filter(|p| p.log_residual > 0.0)
        .take(top_n)
        .cloned()
        .collect();
    let over_predicted = sorted
        .iter()
        .rev()
        .filter(|p| p.log_residual < 0.0)
        .take(top_n)
        .cloned()
        .collect();

    Rankings {
        under_predicted,
        over_predicted,
    }
}
