//! # Series Math
//!
//! Numerical building blocks shared by the forecasting stages.
//! This crate provides rolling window statistics, series transforms,
//! ordinary least squares, kernel density estimation and a derivative-free
//! optimiser.

use thiserror::Error;

pub mod kde;
pub mod optimize;
pub mod regression;
pub mod rolling;
pub mod stats;
pub mod transform;

/// Errors that can occur in series calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for series math operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MathError::InsufficientData("need 12 values, have 3".to_string());
        assert_eq!(
            err.to_string(),
            "Insufficient data for calculation: need 12 values, have 3"
        );
    }
}
