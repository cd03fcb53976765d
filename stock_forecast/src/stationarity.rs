//! Stationarity assessment: rolling statistics and the augmented Dickey–Fuller test

use crate::chart::{Chart, Summary, Trace};
use crate::data::TimeSeries;
use crate::distributions::normal_cdf;
use crate::error::{ForecastError, Result, Stage};
use chrono::NaiveDate;
use series_math::regression::{ols, OlsFit};
use series_math::rolling::{rolling_mean, rolling_std};
use series_math::transform::difference;
use tracing::{debug, info};

// MacKinnon (1994) p-value surface, constant term, one variable
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// Rolling mean and sample standard deviation over a date index
#[derive(Debug, Clone, PartialEq)]
pub struct RollingStatistics {
    pub window: usize,
    pub dates: Vec<NaiveDate>,
    /// Absent for the first `window - 1` positions
    pub mean: Vec<Option<f64>>,
    /// Absent for the first `window - 1` positions
    pub std_dev: Vec<Option<f64>>,
}

impl RollingStatistics {
    pub fn compute(series: &TimeSeries, window: usize) -> Result<Self> {
        Ok(Self {
            window,
            dates: series.dates().to_vec(),
            mean: rolling_mean(series.values(), window)?,
            std_dev: rolling_std(series.values(), window)?,
        })
    }
}

/// How the number of lagged differences is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagSelection {
    /// Minimise AIC over `0..=maxlag` with the default lag cap
    Aic,
    /// Use exactly this many lagged differences
    Fixed(usize),
}

/// Finite-sample critical values of the test statistic
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
    pub one_percent: f64,
    pub five_percent: f64,
    pub ten_percent: f64,
}

impl CriticalValues {
    /// MacKinnon (2010) response surfaces for a regression with a constant
    pub fn for_observations(nobs: usize) -> Self {
        let n = nobs as f64;
        Self {
            one_percent: -3.43035 - 6.5393 / n - 16.786 / n.powi(2) - 79.433 / n.powi(3),
            five_percent: -2.86154 - 2.8903 / n - 4.234 / n.powi(2) - 40.04 / n.powi(3),
            ten_percent: -2.56677 - 1.5384 / n - 2.809 / n.powi(2),
        }
    }
}

/// Outcome of an augmented Dickey–Fuller test
#[derive(Debug, Clone, PartialEq)]
pub struct AdfResult {
    pub statistic: f64,
    /// In [0, 1]
    pub p_value: f64,
    pub used_lag: usize,
    pub nobs: usize,
    pub critical_values: CriticalValues,
    /// Minimum AIC of the lag search, when one ran
    pub best_ic: Option<f64>,
}

impl AdfResult {
    /// Whether the unit root is rejected at `alpha`
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Default lag cap `ceil(12·(n/100)^(1/4))`, limited to `n/2 - 2`
pub fn default_max_lag(n: usize) -> usize {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    schwert.min((n / 2).saturating_sub(2))
}

/// Augmented Dickey–Fuller test with a constant term
pub fn adf_test(data: &[f64], lags: LagSelection) -> Result<AdfResult> {
    let n = data.len();
    if n < 6 {
        return Err(ForecastError::InvalidParameter(format!(
            "ADF test needs at least 6 observations, have {}",
            n
        )));
    }

    let xdiff = difference(data, 1);
    let m = xdiff.len();

    let (used_lag, best_ic) = match lags {
        LagSelection::Fixed(lag) => {
            if 2 * lag + 4 > m {
                return Err(ForecastError::InvalidParameter(format!(
                    "ADF lag {} too large for {} observations",
                    lag, n
                )));
            }
            (lag, None)
        }
        LagSelection::Aic => {
            let max_lag = default_max_lag(n);
            let mut best: Option<(usize, f64)> = None;
            // Every lag is scored on the rows the longest lag can use
            for lag in 0..=max_lag {
                let aic = match adf_regression(data, &xdiff, lag, max_lag) {
                    Ok(fit) => fit.aic(),
                    Err(_) => continue,
                };
                if best.map_or(true, |(_, ic)| aic < ic) {
                    best = Some((lag, aic));
                }
            }
            let (lag, ic) = best.ok_or_else(|| {
                ForecastError::ForecastingError(
                    "ADF lag search found no estimable regression".to_string(),
                )
            })?;
            (lag, Some(ic))
        }
    };

    let fit = adf_regression(data, &xdiff, used_lag, used_lag)?;
    let statistic = fit.t_value(0).ok_or_else(|| {
        ForecastError::ForecastingError("ADF regression has no level coefficient".to_string())
    })?;
    let p_value = mackinnon_p_value(statistic)?;

    debug!(
        "ADF statistic {:.4} (p = {:.4}) with {} lags on {} observations",
        statistic, p_value, used_lag, fit.nobs
    );

    Ok(AdfResult {
        statistic,
        p_value,
        used_lag,
        nobs: fit.nobs,
        critical_values: CriticalValues::for_observations(fit.nobs),
        best_ic,
    })
}

/// Regress `Δx[t]` on `x[t]`, `Δx[t-1..=t-lag]` and a constant for `t >= start`
fn adf_regression(x: &[f64], xdiff: &[f64], lag: usize, start: usize) -> Result<OlsFit> {
    let rows: Vec<Vec<f64>> = (start..xdiff.len())
        .map(|t| {
            let mut row = Vec::with_capacity(lag + 2);
            row.push(x[t]);
            row.extend((1..=lag).map(|j| xdiff[t - j]));
            row.push(1.0);
            row
        })
        .collect();

    Ok(ols(&rows, &xdiff[start..])?)
}

/// Approximate p-value of a test statistic, MacKinnon (1994)
pub fn mackinnon_p_value(statistic: f64) -> Result<f64> {
    if statistic > TAU_MAX {
        return Ok(1.0);
    }
    if statistic < TAU_MIN {
        return Ok(0.0);
    }

    let coefficients: &[f64] = if statistic <= TAU_STAR {
        &TAU_SMALL_P
    } else {
        &TAU_LARGE_P
    };
    let z = coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * statistic + c);

    normal_cdf(z)
}

/// Rolling statistics and unit-root test of a closing price series
#[derive(Debug, Clone, PartialEq)]
pub struct StationarityReport {
    pub observed: TimeSeries,
    pub rolling: RollingStatistics,
    pub adf: AdfResult,
}

impl StationarityReport {
    pub fn chart(&self) -> Chart {
        Chart::new("Rolling Mean and Standard Deviation", "Date", "Price")
            .with_trace(Trace::from_series("Original", &self.observed))
            .with_trace(Trace::from_dates(
                "Rolling Mean",
                &self.rolling.dates,
                self.rolling.mean.clone(),
            ))
            .with_trace(Trace::from_dates(
                "Rolling Std",
                &self.rolling.dates,
                self.rolling.std_dev.clone(),
            ))
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::new("Results of Dickey-Fuller Test");
        summary.push("Test Statistics", self.adf.statistic);
        summary.push("p-value", self.adf.p_value);
        summary.push("No. of lags used", self.adf.used_lag as f64);
        summary.push("Number of observations used", self.adf.nobs as f64);
        summary.push("critical value (1%)", self.adf.critical_values.one_percent);
        summary.push("critical value (5%)", self.adf.critical_values.five_percent);
        summary.push("critical value (10%)", self.adf.critical_values.ten_percent);
        summary
    }
}

/// Compute the rolling statistics and ADF test of `series`
pub fn assess_stationarity(series: &TimeSeries, window: usize) -> Result<StationarityReport> {
    let stage = Stage::Stationarity;
    series.require_min_len(stage, 1, "stationarity test")?;
    series.require_min_len(stage, window.max(6), "rolling window")?;
    series.require_finite(stage)?;
    series.require_non_constant(stage)?;

    let rolling = RollingStatistics::compute(series, window)?;
    let adf = adf_test(series.values(), LagSelection::Aic)?;

    info!(
        "Stationarity of {}: statistic {:.4}, p-value {:.4}",
        series.name(),
        adf.statistic,
        adf.p_value
    );

    Ok(StationarityReport {
        observed: series.clone(),
        rolling,
        adf,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_max_lag() {
        assert_eq!(default_max_lag(100), 12);
        assert_eq!(default_max_lag(400), 17);
        assert_eq!(default_max_lag(20), 8);
    }

    #[test]
    fn test_critical_values_large_sample() {
        let cv = CriticalValues::for_observations(1_000_000);
        assert_relative_eq!(cv.one_percent, -3.43035, epsilon = 1e-4);
        assert_relative_eq!(cv.five_percent, -2.86154, epsilon = 1e-4);
        assert_relative_eq!(cv.ten_percent, -2.56677, epsilon = 1e-4);
    }

    #[test]
    fn test_mackinnon_p_value_bounds() {
        assert_eq!(mackinnon_p_value(3.0).unwrap(), 1.0);
        assert_eq!(mackinnon_p_value(-20.0).unwrap(), 0.0);
        // Close to the 5% critical value for large samples
        let p = mackinnon_p_value(-2.86).unwrap();
        assert!(p > 0.04 && p < 0.06, "p = {}", p);
    }
}
