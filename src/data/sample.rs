//! Synthetic core-loss datasets drawn from a known Steinmetz model.
//!
//! Points lie on a grid: log-spaced flux densities × the given frequencies.
//! Noise is multiplicative (zero-mean Gaussian on `ln(loss)`), which is the
//! error model the log-space regression assumes.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{Measurement, SteinmetzModel};
use crate::error::AppError;
use crate::models::predict;

#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub model: SteinmetzModel,
    pub bac_min: f64,
    pub bac_max: f64,
    pub bac_steps: usize,
    pub frequencies: Vec<f64>,
    /// Standard deviation of the noise on `ln(loss)`.
    pub noise: f64,
    pub seed: u64,
}

/// Generate the dataset described by `spec` (deterministic per seed).
pub fn generate_sample(spec: &SampleSpec) -> Result<Vec<Measurement>, AppError> {
    if !(spec.bac_min.is_finite() && spec.bac_min > 0.0 && spec.bac_max.is_finite() && spec.bac_max >= spec.bac_min) {
        return Err(AppError::new(2, "Invalid bac range for sample generation."));
    }
    if spec.bac_steps == 0 {
        return Err(AppError::new(2, "bac steps must be > 0."));
    }
    if spec.frequencies.is_empty() || spec.frequencies.iter().any(|f| !(f.is_finite() && *f > 0.0)) {
        return Err(AppError::new(2, "Frequencies must be a non-empty list of positive numbers."));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(AppError::new(2, "Noise must be a non-negative number."));
    }
    if !(spec.model.k.is_finite() && spec.model.k > 0.0) {
        return Err(AppError::new(2, "k must be a positive number."));
    }

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let bacs = log_space(spec.bac_min, spec.bac_max, spec.bac_steps);
    let mut points = Vec::with_capacity(bacs.len() * spec.frequencies.len());

    for &fs in &spec.frequencies {
        for &bac in &bacs {
            let clean = predict(&spec.model, bac, fs);
            let shock = if spec.noise > 0.0 {
                (spec.noise * normal.sample(&mut rng)).exp()
            } else {
                1.0
            };
            let coreloss = clean * shock;
            if !(coreloss.is_finite() && coreloss > 0.0) {
                return Err(AppError::new(
                    4,
                    format!("Generated loss out of range at bac={bac}, fs={fs}."),
                ));
            }
            points.push(Measurement::new(coreloss, bac, fs));
        }
    }

    Ok(points)
}

fn log_space(min: f64, max: f64, steps: usize) -> Vec<f64> {
    if steps == 1 || max == min {
        return vec![min];
    }
    let (lo, hi) = (min.ln(), max.ln());
    (0..steps)
        .map(|i| {
            let u = i as f64 / (steps as f64 - 1.0);
            (lo + u * (hi - lo)).exp()
        })
        .collect()
}
