//! Steinmetz model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given (bac, fs) pair (for the normal equations)
//! - predict the loss given fitted coefficients (for residuals/plots)
//!
//! In log space the model is linear: `ln(loss) = ln(k) + a·ln(bac) + b·ln(fs)`.

use nalgebra::Vector3;

use crate::domain::SteinmetzModel;

/// Number of non-constant predictors (`ln bac`, `ln fs`).
pub const PREDICTORS: usize = 2;

/// Design row `[1, ln(bac), ln(fs)]`, intercept first.
///
/// Non-positive inputs yield non-finite entries; callers must check.
pub fn design_row(bac: f64, fs: f64) -> Vector3<f64> {
    Vector3::new(1.0, bac.ln(), fs.ln())
}

/// Predict `ln(loss)` at (bac, fs).
pub fn predict_log(model: &SteinmetzModel, bac: f64, fs: f64) -> f64 {
    model.k.ln() + model.a * bac.ln() + model.b * fs.ln()
}

/// Predict `loss = k · bac^a · fs^b`.
pub fn predict(model: &SteinmetzModel, bac: f64, fs: f64) -> f64 {
    model.k * bac.powf(model.a) * fs.powf(model.b)
}
