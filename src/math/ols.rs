//! Normal-equation least squares for the fixed 3-parameter problem.
//!
//! We solve
//!
//! ```text
//! minimize ‖A·x − y‖²   with A = n × 3,   x = (AᵀA)⁻¹ Aᵀy
//! ```
//!
//! Implementation choices:
//! - The Gram matrix is always 3×3, so its determinant and inverse use the
//!   closed-form cofactor formulas. No decomposition, no dynamic shapes.
//! - Predictor columns and the target are centered on their means before
//!   accumulating sums (the shift is undone on the intercept). The slopes and
//!   the determinant are unchanged, the Gram sums lose far less precision to
//!   cancellation, and `G₁₁`/`G₂₂` become centered sums of squares that do
//!   not depend on row order.
//! - Singularity is judged scale-free against `G₀₀·G₁₁·G₂₂` (Hadamard bound).
//!   On centered columns that ratio is `1 − ρ²` of the two predictors.

use nalgebra::{Matrix3, Vector3};
use tracing::debug;

use crate::error::FitError;

/// Parameters in the regression (intercept + two slopes).
pub const PARAMS: usize = 3;

/// `det(G) / (G₀₀·G₁₁·G₂₂)` at or below this is treated as singular.
const SINGULAR_RATIO: f64 = 1e-12;

/// Accumulate the Gram matrix `AᵀA`.
pub fn gram_matrix(rows: &[Vector3<f64>]) -> Matrix3<f64> {
    rows.iter()
        .fold(Matrix3::zeros(), |acc, r| acc + r * r.transpose())
}

/// Accumulate `Aᵀy`.
pub fn moment_vector(rows: &[Vector3<f64>], y: &[f64]) -> Vector3<f64> {
    rows.iter()
        .zip(y.iter())
        .fold(Vector3::zeros(), |acc, (r, &yi)| acc + r * yi)
}

/// Cofactor matrix `C` with `C[i][j] = (−1)^{i+j} · minor(i, j)`.
fn cofactors(m: &Matrix3<f64>) -> Matrix3<f64> {
    let c00 = m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)];
    let c01 = -(m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)]);
    let c02 = m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)];

    let c10 = -(m[(0, 1)] * m[(2, 2)] - m[(0, 2)] * m[(2, 1)]);
    let c11 = m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)];
    let c12 = -(m[(0, 0)] * m[(2, 1)] - m[(0, 1)] * m[(2, 0)]);

    let c20 = m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)];
    let c21 = -(m[(0, 0)] * m[(1, 2)] - m[(0, 2)] * m[(1, 0)]);
    let c22 = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];

    Matrix3::new(c00, c01, c02, c10, c11, c12, c20, c21, c22)
}

/// Determinant by cofactor expansion along the first row.
pub fn determinant(m: &Matrix3<f64>) -> f64 {
    let c = cofactors(m);
    m[(0, 0)] * c[(0, 0)] + m[(0, 1)] * c[(0, 1)] + m[(0, 2)] * c[(0, 2)]
}

/// Closed-form inverse `adj(m) / det`.
///
/// The caller must have rejected a (numerically) zero determinant.
pub fn cofactor_inverse(m: &Matrix3<f64>, det: f64) -> Matrix3<f64> {
    cofactors(m).transpose() / det
}

/// True when the Gram matrix is numerically singular.
///
/// `det` must be `determinant(gram)`.
pub fn is_singular(gram: &Matrix3<f64>, det: f64) -> bool {
    let scale = gram[(0, 0)] * gram[(1, 1)] * gram[(2, 2)];
    if !(scale.is_finite() && scale > 0.0) {
        return true;
    }
    det / scale <= SINGULAR_RATIO
}

/// Solve the normal equations for `x = [intercept, slope₁, slope₂]`.
///
/// `rows` are design rows `[1, u, v]` and `y` the targets (same length, n ≥ 3).
pub fn solve_normal_equations(rows: &[Vector3<f64>], y: &[f64]) -> Result<Vector3<f64>, FitError> {
    let n = rows.len();
    if n < PARAMS || y.len() != n {
        return Err(FitError::InsufficientData {
            n: n.min(y.len()),
            min: PARAMS,
        });
    }

    // Center on the column means (see module docs).
    let nf = n as f64;
    let center = rows.iter().fold(Vector3::zeros(), |acc, r| acc + r) / nf;
    let y_mean = y.iter().sum::<f64>() / nf;
    let centered: Vec<Vector3<f64>> = rows
        .iter()
        .map(|r| Vector3::new(r[0], r[1] - center[1], r[2] - center[2]))
        .collect();
    let y_centered: Vec<f64> = y.iter().map(|v| v - y_mean).collect();

    let gram = gram_matrix(&centered);
    let moments = moment_vector(&centered, &y_centered);

    let det = determinant(&gram);
    if !det.is_finite() {
        return Err(FitError::NumericalFailure("non-finite Gram determinant"));
    }
    debug!(
        n,
        det,
        det_ratio = det / (gram[(0, 0)] * gram[(1, 1)] * gram[(2, 2)]),
        "normal equations assembled"
    );
    if is_singular(&gram, det) {
        return Err(FitError::SingularSystem);
    }

    let beta = cofactor_inverse(&gram, det) * moments;

    let slope_u = beta[1];
    let slope_v = beta[2];
    let intercept = beta[0] + y_mean - slope_u * center[1] - slope_v * center[2];
    let x = Vector3::new(intercept, slope_u, slope_v);

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(FitError::NumericalFailure("non-finite regression coefficients"))
    }
}
