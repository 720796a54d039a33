//! Error types for the retail-forecast library.

use thiserror::Error;

/// Result type alias for forecasting operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Problems with the input data or the derived yearly series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Nothing left after date parsing and cutoff filtering.
    #[error("no yearly observations left after filtering")]
    EmptySeries,

    /// A required input field was absent.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Years are not strictly increasing by one.
    #[error("years must be contiguous and ascending: {previous} followed by {next}")]
    NonContiguousYears { previous: i32, next: i32 },

    /// Residuals were requested before the trend model was fitted.
    #[error("residuals have not been attached to the series")]
    MissingResiduals,

    /// Per-year values do not line up with the series.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A yearly total was negative or not finite.
    #[error("invalid total for year {year}: {value}")]
    InvalidTotal { year: i32, value: f64 },

    /// Configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures while estimating model parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelFitError {
    /// Series too short for the requested model order.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// The optimiser produced non-finite parameters or likelihood.
    #[error("numerical non-convergence: {0}")]
    NonConvergence(String),

    /// No labeled rows were available for training.
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// A configuration value is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Failures while producing predictions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    NotFitted,

    /// A feature row could not be used as model input.
    #[error("malformed feature row: {0}")]
    MalformedFeatures(String),

    /// The combined forecast for a year is NaN or infinite.
    #[error("forecast for {year} is not finite")]
    NonFiniteForecast { year: i32 },
}

/// Top-level error for every fallible operation in the crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("model fit error: {0}")]
    ModelFit(#[from] ModelFitError),

    #[error("predict error: {0}")]
    Predict(#[from] PredictError),
}

impl ForecastError {
    /// Short name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::Data(_) => "DataError",
            ForecastError::ModelFit(_) => "ModelFitError",
            ForecastError::Predict(_) => "PredictError",
        }
    }
}
