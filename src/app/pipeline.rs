//! Shared "fit pipeline" logic used by the CLI handlers.
//!
//! ingest -> fit -> predictions -> rankings
//!
//! Several input files are fitted concurrently; each file is an independent
//! engine call and results come back in the order the files were given.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::domain::{FitResult, PredictedPoint};
use crate::error::AppError;
use crate::fit::fit_steinmetz;
use crate::io::ingest::{IngestedData, load_measurements};
use crate::report::{Rankings, compute_predictions, rank_residuals};

/// All computed outputs of a single fitted dataset.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedData,
    pub fit: FitResult,
    pub predictions: Vec<PredictedPoint>,
    pub rankings: Rankings,
}

/// Load one CSV and run the full pipeline on it.
pub fn run_fit(path: &Path, top_n: usize) -> Result<RunOutput, AppError> {
    let ingest = load_measurements(path)?;
    run_fit_on(ingest, top_n)
}

/// Run the pipeline on already-ingested data.
pub fn run_fit_on(ingest: IngestedData, top_n: usize) -> Result<RunOutput, AppError> {
    let fit = fit_steinmetz(&ingest.points)?;
    info!(
        source = %ingest.source,
        k = fit.model.k,
        a = fit.model.a,
        b = fit.model.b,
        r_squared = fit.quality.r_squared,
        "fit complete"
    );

    let predictions = compute_predictions(&ingest.points, &fit)?;
    let rankings = rank_residuals(&predictions, top_n);

    Ok(RunOutput {
        ingest,
        fit,
        predictions,
        rankings,
    })
}

/// Fit every file in `paths` concurrently. Output order matches `paths`.
pub fn run_fits(paths: &[PathBuf], top_n: usize) -> Vec<Result<RunOutput, AppError>> {
    info!(files = paths.len(), "fitting batch");
    paths.par_iter().map(|path| run_fit(path, top_n)).collect()
}
