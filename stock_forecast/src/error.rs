//! Error types for the stock_forecast crate

use polars::prelude::PolarsError;
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Loading and validating the input table
    Input,
    /// Closing price overview charts
    Overview,
    /// Rolling statistics and the unit-root test
    Stationarity,
    /// Multiplicative seasonal decomposition
    Decomposition,
    /// Log transform and rolling statistics of the logged series
    TrendElimination,
    /// Diagnostic train/test partition
    TrainTestSplit,
    /// Order search, fit and forecast
    AutoArima,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Input => "input",
            Stage::Overview => "overview",
            Stage::Stationarity => "stationarity test",
            Stage::Decomposition => "seasonal decomposition",
            Stage::TrendElimination => "trend elimination",
            Stage::TrainTestSplit => "train/test split",
            Stage::AutoArima => "auto ARIMA",
        };
        f.write_str(name)
    }
}

/// Custom error types for the stock_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// A stage's input violated one of its preconditions
    #[error("{stage} precondition failed for input of length {len}: {reason}")]
    Precondition {
        stage: Stage,
        len: usize,
        reason: String,
    },

    /// The order search found no candidate with a finite information criterion
    #[error("order search exhausted its bounds: {tried} candidate orders tried on {len} observations, none produced a finite {criterion}")]
    SearchExhausted {
        tried: usize,
        len: usize,
        criterion: String,
    },

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from configuration parsing
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from numerical routines
    #[error("Math error: {0}")]
    MathError(#[from] series_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

impl ForecastError {
    /// Precondition failure attributed to `stage`
    pub fn precondition(stage: Stage, len: usize, reason: impl Into<String>) -> Self {
        ForecastError::Precondition {
            stage,
            len,
            reason: reason.into(),
        }
    }

    /// Stage the error is attributed to, when it carries one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ForecastError::Precondition { stage, .. } => Some(*stage),
            ForecastError::SearchExhausted { .. } => Some(Stage::AutoArima),
            _ => None,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
