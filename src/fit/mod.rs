//! Steinmetz regression engine.
//!
//! Responsibilities:
//!
//! - map measurements to log-space design rows (`linearize`)
//! - solve the normal equations and back-transform the coefficients (`fitter`)
//! - compute fit diagnostics in log space (`quality`)

pub mod fitter;
pub mod linearize;
pub mod quality;

pub use fitter::*;
pub use linearize::*;
pub use quality::*;
