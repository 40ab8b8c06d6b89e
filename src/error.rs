//! Error types.
//!
//! Two layers:
//! - [`FitError`]: typed failures of the regression engine (pure math, no I/O)
//! - [`AppError`]: user-facing error carrying a process exit code
//!
//! Exit codes used throughout the binary:
//! - `2` usage, file or format problems
//! - `3` insufficient data
//! - `4` computation failure

/// Terminal failure of a single Steinmetz fit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// Fewer measurements than free parameters.
    #[error("Fitting requires at least {min} data points (got {n}).")]
    InsufficientData { n: usize, min: usize },

    /// The Gram matrix `AᵀA` is numerically singular.
    ///
    /// Happens when the log-predictors are collinear, e.g. every point shares
    /// one frequency, or flux density is an exact power of frequency.
    #[error(
        "Singular system: ln(bac) and ln(fs) are collinear across the data, so no unique fit exists."
    )]
    SingularSystem,

    /// A measurement whose logarithm is undefined reached the math stage.
    #[error("Measurement #{index} has a non-positive or non-finite component.")]
    InvalidMeasurement { index: usize },

    /// All log-losses are identical, so R² is undefined.
    #[error("Degenerate data: every core-loss value is identical, R² is undefined.")]
    DegenerateVariance,

    /// Overflow / NaN detected after the fact.
    #[error("Numerical failure: {0}")]
    NumericalFailure(&'static str),
}

impl FitError {
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::InsufficientData { .. } => 3,
            _ => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
