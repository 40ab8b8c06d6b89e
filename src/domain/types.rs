//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or predictions

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exponent range considered typical for ferrite materials.
///
/// Fitted `a`/`b` outside this range are flagged in reports, not rejected.
pub const TYPICAL_EXPONENT_RANGE: (f64, f64) = (1.1, 3.9);

/// One observed (loss, flux density, frequency) triple.
///
/// Units are whatever the data source uses (typically mW/cm³, T, kHz). The
/// fit is unit-agnostic apart from the meaning of `k`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub coreloss: f64,
    pub bac: f64,
    pub fs: f64,
}

impl Measurement {
    pub fn new(coreloss: f64, bac: f64, fs: f64) -> Self {
        Self { coreloss, bac, fs }
    }

    /// True when every component is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.coreloss, self.bac, self.fs]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Fitted Steinmetz coefficients: `loss = k · bac^a · fs^b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SteinmetzModel {
    pub k: f64,
    pub a: f64,
    pub b: f64,
}

impl SteinmetzModel {
    pub fn a_out_of_range(&self) -> bool {
        outside_typical_range(self.a)
    }

    pub fn b_out_of_range(&self) -> bool {
        outside_typical_range(self.b)
    }
}

fn outside_typical_range(v: f64) -> bool {
    let (lo, hi) = TYPICAL_EXPONENT_RANGE;
    v < lo || v > hi
}

/// Goodness-of-fit diagnostics.
///
/// `rmse` and `mae` are on the natural-log scale of loss; they are not
/// comparable with errors in raw loss units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitQuality {
    pub r_squared: f64,
    /// `None` when `n = predictors + 1`, where the correction divides by zero.
    pub adjusted_r_squared: Option<f64>,
    pub rmse: f64,
    pub mae: f64,
    pub n: usize,
}

/// Fit output: coefficients plus diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: SteinmetzModel,
    pub quality: FitQuality,
}

/// A measurement paired with its fitted value (used for charts, rankings and exports).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedPoint {
    pub measurement: Measurement,
    pub predicted_coreloss: f64,
    /// `ln(coreloss) - ln(predicted)`; positive means the model under-predicts.
    pub log_residual: f64,
}

/// Summary stats about the points actually used for fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub coreloss_min: f64,
    pub coreloss_max: f64,
    pub bac_min: f64,
    pub bac_max: f64,
    pub fs_min: f64,
    pub fs_max: f64,
    pub distinct_frequencies: usize,
}

impl DatasetStats {
    /// Compute stats over a non-empty slice.
    pub fn from_measurements(points: &[Measurement]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mut stats = DatasetStats {
            n_points: points.len(),
            coreloss_min: f64::INFINITY,
            coreloss_max: f64::NEG_INFINITY,
            bac_min: f64::INFINITY,
            bac_max: f64::NEG_INFINITY,
            fs_min: f64::INFINITY,
            fs_max: f64::NEG_INFINITY,
            distinct_frequencies: 0,
        };

        let mut freqs: Vec<f64> = Vec::with_capacity(points.len());
        for p in points {
            stats.coreloss_min = stats.coreloss_min.min(p.coreloss);
            stats.coreloss_max = stats.coreloss_max.max(p.coreloss);
            stats.bac_min = stats.bac_min.min(p.bac);
            stats.bac_max = stats.bac_max.max(p.bac);
            stats.fs_min = stats.fs_min.min(p.fs);
            stats.fs_max = stats.fs_max.max(p.fs);
            freqs.push(p.fs);
        }
        freqs.sort_by(f64::total_cmp);
        freqs.dedup();
        stats.distinct_frequencies = freqs.len();

        Some(stats)
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_paths: Vec<PathBuf>,
    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Print results as JSON instead of the text report.
    pub json: bool,

    pub export_results: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

/// A saved fit file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    /// Input the fit was computed from (file path, or a free-form label).
    pub source: String,
    pub model: SteinmetzModel,
    pub quality: FitQuality,
    pub stats: DatasetStats,
    pub points: Vec<PredictedPoint>,
}
