//! Mathematical utilities: closed-form 3×3 normal-equation solver.

pub mod ols;

pub use ols::*;
