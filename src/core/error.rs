use thiserror::Error;

/// Errors that can occur while normalizing, fitting or transforming SPD matrix sets
#[derive(Debug, Error, Clone)]
pub enum Error {
    /// Input cannot be normalized into a (n_matrices, n_channels, n_channels) stack
    #[error("shape error: {0}")]
    Shape(String),

    /// Per-sample sequences disagree with the number of matrices
    #[error("length mismatch for {what}: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Dimension mismatch
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Mean and dispersion are undefined below two samples per domain
    #[error("domain '{domain}' has {got} matrices, at least {min} are required")]
    TooFewSamples {
        domain: String,
        min: usize,
        got: usize,
    },

    /// Iterative mean ran out of iterations
    #[error("mean did not converge after {iterations} iterations (criterion {criterion:.3e})")]
    NotConverged { iterations: usize, criterion: f64 },

    /// Matrix is not symmetric positive definite
    #[error("matrix not positive definite: {0}")]
    NotPositiveDefinite(String),

    /// Metric name not recognized
    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    /// Domain absent from the fitted statistics
    #[error("domain '{0}' was not seen during fit")]
    UnknownDomain(String),

    /// Fitted state accessed before fit
    #[error("{0} is not fitted yet")]
    NotFitted(&'static str),

    /// Computation failed (e.g., zero dispersion)
    #[error("computation failed: {0}")]
    ComputationFailed(String),

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical error from ndarray-linalg
    #[error("linear algebra error: {0}")]
    LinalgError(String),
}

/// Convert ndarray-linalg errors to Error
impl From<ndarray_linalg::error::LinalgError> for Error {
    fn from(err: ndarray_linalg::error::LinalgError) -> Self {
        Error::LinalgError(format!("{:?}", err))
    }
}

/// Result type for SPD transfer operations
pub type Result<T> = std::result::Result<T, Error>;
