//! # Stock Forecast
//!
//! Exploratory analysis and automatic seasonal ARIMA forecasting for daily stock prices.
//!
//! ## Features
//!
//! - OHLCV loading from CSV files or polars data frames
//! - Closing price overview: price line, kernel density, daily change, rolling average
//! - Stationarity assessment with rolling statistics and the augmented Dickey-Fuller test
//! - Classical additive and multiplicative seasonal decomposition
//! - Log-scale trend elimination
//! - Positional train/test partitioning
//! - Stepwise or exhaustive SARIMA order search with residual diagnostics
//!
//! Every stage runs independently: a [`PipelineReport`] keeps one `Result` per stage
//! so a failing stage never hides the output of the others.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stock_forecast::{DataLoader, ForecastPipeline, PipelineConfig};
//!
//! let data = DataLoader::from_csv("AAPL.csv")?;
//! let pipeline = ForecastPipeline::new(PipelineConfig::default())?;
//! let report = pipeline.run(&data);
//!
//! if let Ok(arima) = &report.auto_arima {
//!     println!("{}", arima.summary_text());
//! }
//! for (stage, err) in report.failures() {
//!     eprintln!("{}: {}", stage, err);
//! }
//! # Ok::<(), stock_forecast::ForecastError>(())
//! ```

pub mod chart;
pub mod config;
pub mod data;
pub mod decomposition;
pub mod detrend;
pub mod diagnostics;
mod distributions;
pub mod error;
pub mod forecaster;
pub mod metrics;
pub mod models;
pub mod overview;
pub mod pipeline;
pub mod search;
pub mod split;
pub mod stationarity;
pub mod synthetic;

// Re-export commonly used types
pub use crate::chart::{Chart, Summary, Trace};
pub use crate::config::{AutoArimaConfig, InformationCriterion, PipelineConfig, SplitConfig};
pub use crate::data::{DataLoader, OhlcvRecord, OhlcvSeries, TimeSeries};
pub use crate::error::{ForecastError, Result, Stage};
pub use crate::forecaster::{AutoArima, AutoArimaReport};
pub use crate::models::{ForecastResult, SarimaOrder, TrainedForecastModel};
pub use crate::pipeline::{ForecastPipeline, PipelineReport};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
