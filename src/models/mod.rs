//! Steinmetz power-law model.
//!
//! Implemented as small, pure functions so the fitting code and the reporting
//! code share one definition of the model.

pub mod model;

pub use model::*;
