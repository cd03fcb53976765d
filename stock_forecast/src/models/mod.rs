//! Forecasting models for time series data

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Non-seasonal order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ModelOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

/// Seasonal order `(P, D, Q, m)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }
}

/// Full SARIMA specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SarimaOrder {
    pub order: ModelOrder,
    pub seasonal: SeasonalOrder,
    pub intercept: bool,
}

impl SarimaOrder {
    /// Order with an intercept whenever the total differencing is below two
    pub fn new(order: ModelOrder, seasonal: SeasonalOrder) -> Self {
        Self {
            order,
            seasonal,
            intercept: order.d + seasonal.d < 2,
        }
    }

    /// Number of ARMA coefficients, excluding intercept and variance
    pub fn arma_params(&self) -> usize {
        self.order.p + self.order.q + self.seasonal.p + self.seasonal.q
    }

    /// Highest lag of the expanded autoregressive polynomial
    pub fn ar_lag(&self) -> usize {
        self.order.p + self.seasonal.period * self.seasonal.p
    }

    /// Highest lag of the expanded moving-average polynomial
    pub fn ma_lag(&self) -> usize {
        self.order.q + self.seasonal.period * self.seasonal.q
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.order.p, self.order.d, self.order.q)?;
        if self.seasonal.period > 1 {
            write!(
                f,
                "({},{},{})[{}]",
                self.seasonal.p, self.seasonal.d, self.seasonal.q, self.seasonal.period
            )?;
        }
        if self.intercept {
            write!(f, " intercept")?;
        }
        Ok(())
    }
}

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Dates the forecast is aligned to (optional)
    dates: Option<Vec<NaiveDate>>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ForecastingError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            dates: None,
        })
    }

    /// Align the forecast to a date index of the same length
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.len() != self.horizons {
            return Err(ForecastError::ForecastingError(format!(
                "Dates length ({}) doesn't match horizons ({})",
                dates.len(),
                self.horizons
            )));
        }
        self.dates = Some(dates);
        Ok(self)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the dates, if aligned
    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    /// Dated forecast as a time series
    pub fn to_series(&self, name: impl Into<String>) -> Result<TimeSeries> {
        let dates = self.dates.clone().ok_or_else(|| {
            ForecastError::ForecastingError("Forecast is not aligned to dates".to_string())
        })?;
        TimeSeries::new(name, dates, self.values.clone())
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Generate forecast for future periods
    fn forecast(&self, horizons: usize) -> Result<ForecastResult>;

    /// In-sample one-step residuals
    fn residuals(&self) -> &[f64];

    /// Name of the model
    fn name(&self) -> &str;
}

pub mod sarima;
