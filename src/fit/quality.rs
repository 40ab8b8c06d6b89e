//! Goodness-of-fit diagnostics in log space.
//!
//! Given design rows `A`, targets `y` and coefficients `x`:
//! - `SSt = Σ(y − ȳ)²`, `SSr = Σ(y − A·x)²`
//! - `R² = 1 − SSr/SSt`
//! - `adj R² = 1 − (1 − R²)(n − 1)/(n − p − 1)`
//! - `RMSE = sqrt(SSr/n)`, `MAE = mean |y − A·x|`
//!
//! Degenerate cases never produce NaN/∞:
//! - `SSt` at rounding level fails with `DegenerateVariance`
//! - `n = p + 1` reports the adjusted R² as `None`

use nalgebra::Vector3;

use crate::domain::FitQuality;
use crate::error::FitError;

/// Relative size of the log-loss spread treated as "no variance at all".
const VARIANCE_EPS: f64 = 1e-12;

/// Evaluate fit quality for `p` non-constant predictors.
pub fn evaluate(
    rows: &[Vector3<f64>],
    y: &[f64],
    x: &Vector3<f64>,
    predictors: usize,
) -> Result<FitQuality, FitError> {
    let n = y.len();
    if n == 0 || rows.len() != n || n <= predictors {
        return Err(FitError::InsufficientData {
            n,
            min: predictors + 1,
        });
    }
    let nf = n as f64;

    let mean = y.iter().sum::<f64>() / nf;
    let ss_total: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();

    let residuals: Vec<f64> = rows.iter().zip(y.iter()).map(|(r, &yi)| yi - r.dot(x)).collect();
    let ss_residual: f64 = residuals.iter().map(|r| r * r).sum();
    let abs_sum: f64 = residuals.iter().map(|r| r.abs()).sum();

    if !(ss_total.is_finite() && ss_residual.is_finite() && abs_sum.is_finite()) {
        return Err(FitError::NumericalFailure("non-finite sum of squares"));
    }

    let y_scale = y.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    if ss_total <= nf * (VARIANCE_EPS * y_scale).powi(2) {
        return Err(FitError::DegenerateVariance);
    }

    let r_squared = 1.0 - ss_residual / ss_total;

    let dof = n - predictors - 1;
    let adjusted_r_squared = if dof == 0 {
        None
    } else {
        Some(1.0 - (1.0 - r_squared) * (nf - 1.0) / dof as f64)
    };

    let rmse = (ss_residual / nf).sqrt();
    let mae = abs_sum / nf;

    Ok(FitQuality {
        r_squared,
        adjusted_r_squared,
        rmse,
        mae,
        n,
    })
}
