//! Pipeline configuration loaded from TOML

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Information criterion minimised by the order search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InformationCriterion {
    Aic,
    Bic,
    Aicc,
}

impl fmt::Display for InformationCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InformationCriterion::Aic => f.write_str("AIC"),
            InformationCriterion::Bic => f.write_str("BIC"),
            InformationCriterion::Aicc => f.write_str("AICc"),
        }
    }
}

/// Diagnostic train/test partition settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Observations dropped from the front before partitioning
    pub drop_leading: usize,
    /// Boundary position as a fraction of the full series length
    pub train_fraction: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            drop_leading: 3,
            train_fraction: 0.9,
        }
    }
}

/// Settings of the automatic SARIMA stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoArimaConfig {
    pub train_fraction: f64,
    pub start_p: usize,
    pub start_q: usize,
    pub start_seasonal_ar: usize,
    pub start_seasonal_ma: usize,
    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
    pub max_seasonal_ar: usize,
    pub max_seasonal_ma: usize,
    /// Upper bound on p + q + P + Q
    pub max_order: usize,
    pub seasonal_period: usize,
    pub seasonal_differencing: usize,
    pub criterion: InformationCriterion,
    /// Stepwise search when true, exhaustive grid otherwise
    pub stepwise: bool,
    /// Cap on candidate fits in one search
    pub max_fits: usize,
    /// Significance level of the differencing pretests
    pub alpha: f64,
    /// Minimum series length as a multiple of the seasonal period
    pub min_length_multiple: usize,
}

impl Default for AutoArimaConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.7,
            start_p: 0,
            start_q: 0,
            start_seasonal_ar: 0,
            start_seasonal_ma: 1,
            max_p: 3,
            max_q: 3,
            max_d: 5,
            max_seasonal_ar: 2,
            max_seasonal_ma: 2,
            max_order: 5,
            seasonal_period: 7,
            seasonal_differencing: 0,
            criterion: InformationCriterion::Aic,
            stepwise: true,
            max_fits: 100,
            alpha: 0.05,
            min_length_multiple: 3,
        }
    }
}

/// Parameters of every pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rolling window of the stationarity and trend elimination stages
    pub rolling_window: usize,
    /// Period of the seasonal decomposition
    pub seasonal_period: usize,
    /// Points in the closing price density curve
    pub distribution_points: usize,
    /// Rolling window of the overview moving average
    pub overview_rolling_window: usize,
    /// Bins of the closing price and volume histograms
    pub histogram_bins: usize,
    pub split: SplitConfig,
    pub auto_arima: AutoArimaConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rolling_window: 12,
            seasonal_period: 30,
            distribution_points: 1000,
            overview_rolling_window: 30,
            histogram_bins: 20,
            split: SplitConfig::default(),
            auto_arima: AutoArimaConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ForecastError::ConfigError(e.to_string()))
    }

    /// Check every parameter range
    pub fn validate(&self) -> Result<()> {
        if self.rolling_window < 2 {
            return Err(invalid("rolling_window", self.rolling_window, "must be at least 2"));
        }
        if self.seasonal_period < 2 {
            return Err(invalid("seasonal_period", self.seasonal_period, "must be at least 2"));
        }
        if self.distribution_points < 2 {
            return Err(invalid(
                "distribution_points",
                self.distribution_points,
                "must be at least 2",
            ));
        }
        if self.overview_rolling_window == 0 {
            return Err(invalid(
                "overview_rolling_window",
                self.overview_rolling_window,
                "must be positive",
            ));
        }
        if self.histogram_bins == 0 {
            return Err(invalid("histogram_bins", self.histogram_bins, "must be positive"));
        }
        check_fraction("split.train_fraction", self.split.train_fraction)?;

        let arima = &self.auto_arima;
        check_fraction("auto_arima.train_fraction", arima.train_fraction)?;
        if arima.seasonal_period < 2 {
            return Err(invalid(
                "auto_arima.seasonal_period",
                arima.seasonal_period,
                "must be at least 2",
            ));
        }
        if arima.start_p > arima.max_p
            || arima.start_q > arima.max_q
            || arima.start_seasonal_ar > arima.max_seasonal_ar
            || arima.start_seasonal_ma > arima.max_seasonal_ma
        {
            return Err(ForecastError::ConfigError(
                "auto_arima start orders must not exceed their maxima".to_string(),
            ));
        }
        if arima.start_p + arima.start_q + arima.start_seasonal_ar + arima.start_seasonal_ma
            > arima.max_order
        {
            return Err(invalid(
                "auto_arima.max_order",
                arima.max_order,
                "is below the sum of the start orders",
            ));
        }
        if arima.max_fits == 0 {
            return Err(invalid("auto_arima.max_fits", arima.max_fits, "must be positive"));
        }
        if !(arima.alpha > 0.0 && arima.alpha < 1.0) {
            return Err(invalid("auto_arima.alpha", arima.alpha, "must lie in (0, 1)"));
        }
        if arima.min_length_multiple == 0 {
            return Err(invalid(
                "auto_arima.min_length_multiple",
                arima.min_length_multiple,
                "must be positive",
            ));
        }

        Ok(())
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(name, value, "must lie in [0, 1)"))
    }
}

fn invalid(name: &str, value: impl fmt::Display, reason: &str) -> ForecastError {
    ForecastError::ConfigError(format!("{} = {} {}", name, value, reason))
}
