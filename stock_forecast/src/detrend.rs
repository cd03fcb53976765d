//! Trend elimination: log transform and rolling statistics of the logged series

use crate::chart::{Chart, Trace};
use crate::data::TimeSeries;
use crate::error::{Result, Stage};
use crate::stationarity::RollingStatistics;
use series_math::transform::log;
use tracing::info;

/// Logged closing prices with their rolling mean and standard deviation
#[derive(Debug, Clone, PartialEq)]
pub struct TrendElimination {
    pub logged: TimeSeries,
    pub rolling: RollingStatistics,
}

impl TrendElimination {
    pub fn chart(&self) -> Chart {
        Chart::new("Moving Average", "Date", "Log Price")
            .with_trace(Trace::from_dates(
                "Standard Deviation",
                &self.rolling.dates,
                self.rolling.std_dev.clone(),
            ))
            .with_trace(Trace::from_dates(
                "Mean",
                &self.rolling.dates,
                self.rolling.mean.clone(),
            ))
    }
}

/// Log `series` and compute rolling statistics over `window`
pub fn eliminate_trend(series: &TimeSeries, window: usize) -> Result<TrendElimination> {
    let stage = Stage::TrendElimination;
    series.require_min_len(stage, window.max(1), "rolling window")?;
    series.require_finite(stage)?;
    series.require_positive(stage, "log transform")?;

    let logged = series.with_values(format!("log {}", series.name()), log(series.values())?)?;
    let rolling = RollingStatistics::compute(&logged, window)?;

    info!("Eliminated trend of {} with window {}", series.name(), window);

    Ok(TrendElimination { logged, rolling })
}
