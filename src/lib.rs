//! # Stonks Rabbi
//!
//! Daily stock price analysis and seasonal ARIMA forecasting.
//!
//! This crate re-exports the workspace libraries:
//!
//! - [`series_math`]: rolling statistics, differencing, least squares, kernel density, Nelder-Mead
//! - [`stock_forecast`]: data loading, the analysis stages and the automatic SARIMA forecaster
//!
//! ## Example
//!
//! ```
//! use stonks_rabbi::stock_forecast::synthetic::{generate_close, SyntheticConfig};
//! use stonks_rabbi::stock_forecast::stationarity::assess_stationarity;
//!
//! let close = generate_close(&SyntheticConfig::default()).unwrap();
//! let report = assess_stationarity(&close, 12).unwrap();
//! assert_eq!(report.summary().labels().len(), 7);
//! ```

pub use series_math;
pub use stock_forecast;

pub use stock_forecast::{DataLoader, ForecastPipeline, PipelineConfig, PipelineReport};
