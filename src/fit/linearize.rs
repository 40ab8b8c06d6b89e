//! Log-linearization of the Steinmetz power law.
//!
//! `loss = k · bac^a · fs^b` becomes `ln(loss) = ln(k) + a·ln(bac) + b·ln(fs)`,
//! an ordinary linear regression on the design rows `[1, ln bac, ln fs]`.

use nalgebra::Vector3;

use crate::domain::Measurement;
use crate::error::FitError;
use crate::models::design_row;

/// Design matrix rows and log-loss targets, index-aligned with the input.
#[derive(Debug, Clone)]
pub struct LogLinearized {
    pub rows: Vec<Vector3<f64>>,
    pub y: Vec<f64>,
}

/// Map each measurement to its design row and target.
///
/// Positivity is the ingest layer's job; a non-positive or non-finite
/// component is still rejected here so it cannot leak out as NaN.
pub fn linearize(points: &[Measurement]) -> Result<LogLinearized, FitError> {
    let mut rows = Vec::with_capacity(points.len());
    let mut y = Vec::with_capacity(points.len());

    for (index, p) in points.iter().enumerate() {
        if !p.is_valid() {
            return Err(FitError::InvalidMeasurement { index });
        }
        rows.push(design_row(p.bac, p.fs));
        y.push(p.coreloss.ln());
    }

    Ok(LogLinearized { rows, y })
}
