//! Classical seasonal decomposition by moving averages

use crate::chart::{Chart, Trace};
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result, Stage};
use chrono::NaiveDate;
use tracing::info;

/// How the components combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompositionModel {
    /// observed = trend + seasonal + residual
    Additive,
    /// observed = trend · seasonal · residual
    Multiplicative,
}

/// Components aligned to the input index
///
/// Trend and residual are absent at the `period / 2` positions at each end.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalDecomposition {
    pub model: DecompositionModel,
    pub period: usize,
    pub observed: TimeSeries,
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

impl SeasonalDecomposition {
    pub fn dates(&self) -> &[NaiveDate] {
        self.observed.dates()
    }

    /// Recombine the components where the trend is defined
    pub fn reconstruct(&self) -> Vec<Option<f64>> {
        self.trend
            .iter()
            .zip(&self.seasonal)
            .zip(&self.residual)
            .map(|((t, s), r)| match (t, r) {
                (Some(t), Some(r)) => Some(match self.model {
                    DecompositionModel::Additive => t + s + r,
                    DecompositionModel::Multiplicative => t * s * r,
                }),
                _ => None,
            })
            .collect()
    }

    /// One chart per component: observed, trend, seasonality, residual
    pub fn charts(&self) -> Vec<Chart> {
        let dates = self.dates();
        vec![
            Chart::new("Observed Component", "Date", "Price")
                .with_trace(Trace::from_series("Observed", &self.observed)),
            Chart::new("Trend Component", "Date", "Price")
                .with_trace(Trace::from_dates("Trend", dates, self.trend.clone())),
            Chart::new("Seasonality Component", "Date", "Price").with_trace(Trace::from_dates(
                "Seasonality",
                dates,
                self.seasonal.iter().map(|v| Some(*v)).collect(),
            )),
            Chart::new("Residual Component", "Date", "Price")
                .with_trace(Trace::from_dates("Residual", dates, self.residual.clone())),
        ]
    }
}

/// Decompose `series` into trend, seasonal and residual components
pub fn seasonal_decompose(
    series: &TimeSeries,
    period: usize,
    model: DecompositionModel,
) -> Result<SeasonalDecomposition> {
    let stage = Stage::Decomposition;
    if period < 2 {
        return Err(ForecastError::InvalidParameter(format!(
            "Seasonal period must be at least 2, got {}",
            period
        )));
    }
    series.require_min_len(stage, 2 * period, &format!("period {}", period))?;
    series.require_finite(stage)?;
    if model == DecompositionModel::Multiplicative {
        series.require_positive(stage, "multiplicative model")?;
    }

    let values = series.values();
    let trend = centered_moving_average(values, period);

    let detrended: Vec<Option<f64>> = values
        .iter()
        .zip(&trend)
        .map(|(x, t)| {
            t.map(|t| match model {
                DecompositionModel::Additive => x - t,
                DecompositionModel::Multiplicative => x / t,
            })
        })
        .collect();

    let mut indices: Vec<f64> = (0..period)
        .map(|phase| {
            let (sum, count) = detrended
                .iter()
                .skip(phase)
                .step_by(period)
                .flatten()
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            // With n >= 2·period every phase has a defined value
            sum / count.max(1) as f64
        })
        .collect();

    let centre = indices.iter().sum::<f64>() / period as f64;
    for index in indices.iter_mut() {
        match model {
            DecompositionModel::Additive => *index -= centre,
            DecompositionModel::Multiplicative => *index /= centre,
        }
    }

    let seasonal: Vec<f64> = (0..values.len()).map(|i| indices[i % period]).collect();
    let residual = values
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((x, t), s)| {
            t.map(|t| match model {
                DecompositionModel::Additive => x - t - s,
                DecompositionModel::Multiplicative => x / (t * s),
            })
        })
        .collect();

    info!(
        "Decomposed {} observations of {} with period {}",
        values.len(),
        series.name(),
        period
    );

    Ok(SeasonalDecomposition {
        model,
        period,
        observed: series.clone(),
        trend,
        seasonal,
        residual,
    })
}

/// Two-sided moving average; even periods use the `[0.5, 1, …, 1, 0.5] / period` filter
fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let half = period / 2;
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] = 0.5 / period as f64;
        w[period] = 0.5 / period as f64;
        w
    } else {
        vec![1.0 / period as f64; period]
    };

    let n = values.len();
    (0..n)
        .map(|i| {
            if i < half || i + half >= n {
                return None;
            }
            Some(
                weights
                    .iter()
                    .zip(&values[i - half..])
                    .map(|(w, x)| w * x)
                    .sum(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_centered_moving_average_even_period() {
        let values: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let trend = centered_moving_average(&values, 4);

        assert_eq!(trend[0], None);
        assert_eq!(trend[1], None);
        // A linear input is reproduced exactly
        assert_relative_eq!(trend[2].unwrap(), 2.0);
        assert_relative_eq!(trend[7].unwrap(), 7.0);
        assert_eq!(trend[8], None);
    }

    #[test]
    fn test_centered_moving_average_odd_period() {
        let values = [1.0, 2.0, 6.0, 4.0, 5.0];
        let trend = centered_moving_average(&values, 3);
        assert_eq!(trend[0], None);
        assert_relative_eq!(trend[1].unwrap(), 3.0);
        assert_relative_eq!(trend[3].unwrap(), 5.0);
        assert_eq!(trend[4], None);
    }
}
