//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input observations (`Measurement`)
//! - fit outputs (`FitResult`, `SteinmetzModel`, `FitQuality`)
//! - per-point predictions, dataset stats and the saved fit file

pub mod types;

pub use types::*;
