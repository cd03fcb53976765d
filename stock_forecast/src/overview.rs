//! Company overview: closing price views and the trading views of the full OHLCV table

use crate::chart::{Chart, Summary, Trace};
use crate::data::{OhlcvColumn, OhlcvSeries, TimeSeries};
use crate::error::{ForecastError, Result, Stage};
use chrono::Datelike;
use series_math::kde::GaussianKde;
use series_math::regression::ols;
use series_math::rolling::rolling_mean;
use series_math::stats::{histogram, mean, Histogram};
use series_math::transform::pct_change;
use std::collections::BTreeMap;
use tracing::info;

/// Mean close of one calendar year
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyClose {
    pub year: i32,
    pub observations: usize,
    pub mean_close: f64,
    /// Percent change of the mean from the previous year in the data
    pub change_pct: Option<f64>,
}

/// Descriptive views of a closing price series
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyOverview {
    pub close: TimeSeries,
    pub distribution_grid: Vec<f64>,
    pub distribution_density: Vec<f64>,
    /// Fractional change from the previous close; absent for the first day
    pub daily_pct_change: Vec<Option<f64>>,
    pub rolling_window: usize,
    pub rolling_average: Vec<Option<f64>>,
    pub yearly: Vec<YearlyClose>,
}

impl CompanyOverview {
    pub fn closing_price_chart(&self) -> Chart {
        Chart::new("Stock Closing Price", "Date", "Close Prices")
            .with_trace(Trace::from_series("Close", &self.close))
    }

    pub fn distribution_chart(&self) -> Chart {
        Chart::new("Distribution of Stock Closing Prices", "Price", "Density").with_trace(
            Trace::from_numbers("Close", &self.distribution_grid, &self.distribution_density),
        )
    }

    pub fn pct_change_chart(&self) -> Chart {
        Chart::new(
            "Daily Percentage Change in Closing Price",
            "Date",
            "Percentage Change",
        )
        .with_trace(Trace::from_dates(
            "daily_pct_change",
            self.close.dates(),
            self.daily_pct_change.clone(),
        ))
    }

    pub fn rolling_average_chart(&self) -> Chart {
        Chart::new(
            format!(
                "Rolling Average of Closing Price over {} Days",
                self.rolling_window
            ),
            "Date",
            "Price",
        )
        .with_trace(Trace::from_dates(
            "rolling_avg",
            self.close.dates(),
            self.rolling_average.clone(),
        ))
    }

    pub fn charts(&self) -> Vec<Chart> {
        vec![
            self.closing_price_chart(),
            self.distribution_chart(),
            self.pct_change_chart(),
            self.rolling_average_chart(),
        ]
    }

    /// Mean close per year
    pub fn yearly_summary(&self) -> Summary {
        let mut summary = Summary::new("Mean Closing Price by Year");
        for year in &self.yearly {
            summary.push(year.year.to_string(), year.mean_close);
        }
        summary
    }
}

/// Build the overview of a closing price series
pub fn company_overview(
    close: &TimeSeries,
    distribution_points: usize,
    rolling_window: usize,
) -> Result<CompanyOverview> {
    let stage = Stage::Overview;
    close.require_min_len(stage, 2, "price distribution")?;
    close.require_finite(stage)?;
    close.require_non_constant(stage)?;

    let kde = GaussianKde::new(close.values())?;
    let (distribution_grid, distribution_density) = kde.evaluate_grid(distribution_points)?;

    let overview = CompanyOverview {
        close: close.clone(),
        distribution_grid,
        distribution_density,
        daily_pct_change: pct_change(close.values()),
        rolling_window,
        rolling_average: rolling_mean(close.values(), rolling_window)?,
        yearly: yearly_close(close),
    };

    info!(
        "Overview of {} covering {} years",
        close.name(),
        overview.yearly.len()
    );
    Ok(overview)
}

/// Group closes by calendar year
pub fn yearly_close(close: &TimeSeries) -> Vec<YearlyClose> {
    let mut totals: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (date, value) in close.dates().iter().zip(close.values()) {
        let entry = totals.entry(date.year()).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let mut previous: Option<f64> = None;
    totals
        .into_iter()
        .map(|(year, (sum, count))| {
            let mean_close = sum / count as f64;
            let change_pct = previous
                .filter(|p| *p != 0.0)
                .map(|p| (mean_close / p - 1.0) * 100.0);
            previous = Some(mean_close);
            YearlyClose {
                year,
                observations: count,
                mean_close,
                change_pct,
            }
        })
        .collect()
}

/// Least squares line of volume on closing price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trendline {
    pub intercept: f64,
    pub slope: f64,
    /// Coefficient of determination
    pub r_squared: f64,
}

impl Trendline {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Views of a trading history that read every OHLCV column
#[derive(Debug, Clone, PartialEq)]
pub struct TradingOverview {
    pub open: TimeSeries,
    pub high: TimeSeries,
    pub low: TimeSeries,
    pub close: TimeSeries,
    pub volume: TimeSeries,
    pub close_histogram: Histogram,
    pub volume_histogram: Histogram,
    pub trendline: Trendline,
}

impl TradingOverview {
    fn year_span(&self) -> String {
        let dates = self.close.dates();
        match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => format!("{}-{}", first.year(), last.year()),
            _ => String::new(),
        }
    }

    pub fn volume_chart(&self) -> Chart {
        Chart::new("Volume of Stocks Traded over Time", "Date", "Volume")
            .with_trace(Trace::from_series("Volume", &self.volume))
    }

    pub fn open_close_chart(&self) -> Chart {
        Chart::new(
            format!("Opening vs Closing Price {}", self.year_span()),
            "Date",
            "Price",
        )
        .with_trace(Trace::from_series("Open", &self.open))
        .with_trace(Trace::from_series("Close", &self.close))
    }

    pub fn high_low_chart(&self) -> Chart {
        Chart::new(format!("High vs Low {}", self.year_span()), "Date", "Price")
            .with_trace(Trace::from_series("High", &self.high))
            .with_trace(Trace::from_series("Low", &self.low))
    }

    /// One trace per candle component, sharing the date axis
    pub fn candlestick_chart(&self) -> Chart {
        Chart::new("Candlestick Price Movement", "Date", "Price")
            .with_trace(Trace::from_series("Open", &self.open))
            .with_trace(Trace::from_series("High", &self.high))
            .with_trace(Trace::from_series("Low", &self.low))
            .with_trace(Trace::from_series("Close", &self.close))
    }

    pub fn close_histogram_chart(&self) -> Chart {
        histogram_chart(
            "Distribution of Closing Price",
            "Closing Price",
            &self.close_histogram,
        )
    }

    pub fn volume_histogram_chart(&self) -> Chart {
        histogram_chart(
            "Distribution of Volume Traded",
            "Volume",
            &self.volume_histogram,
        )
    }

    /// Scatter of volume against close with the fitted trendline
    pub fn close_volume_chart(&self) -> Chart {
        let mut x = self.close.values().to_vec();
        x.sort_by(|a, b| a.total_cmp(b));
        let fitted: Vec<f64> = x.iter().map(|v| self.trendline.predict(*v)).collect();
        Chart::new("Closing Price vs Volume Traded", "Closing Price", "Volume")
            .with_trace(Trace::from_numbers(
                "Volume",
                self.close.values(),
                self.volume.values(),
            ))
            .with_trace(Trace::from_numbers("OLS trendline", &x, &fitted))
    }

    pub fn charts(&self) -> Vec<Chart> {
        vec![
            self.volume_chart(),
            self.open_close_chart(),
            self.high_low_chart(),
            self.candlestick_chart(),
            self.close_histogram_chart(),
            self.volume_histogram_chart(),
            self.close_volume_chart(),
        ]
    }

    pub fn trendline_summary(&self) -> Summary {
        let mut summary = Summary::new("OLS Trendline of Volume on Closing Price");
        summary.push("Intercept", self.trendline.intercept);
        summary.push("Slope", self.trendline.slope);
        summary.push("R-squared", self.trendline.r_squared);
        summary
    }
}

fn histogram_chart(title: &str, x_label: &str, hist: &Histogram) -> Chart {
    let counts: Vec<f64> = hist.counts.iter().map(|c| *c as f64).collect();
    Chart::new(title, x_label, "Count").with_trace(Trace::from_numbers(
        x_label,
        &hist.centers(),
        &counts,
    ))
}

/// Build the trading views of an OHLCV history with `bins` histogram bins
pub fn trading_overview(data: &OhlcvSeries, bins: usize) -> Result<TradingOverview> {
    let stage = Stage::Overview;
    let close = data.close();
    close.require_min_len(stage, 3, "closing price vs volume trendline")?;

    let columns = [
        OhlcvColumn::Open,
        OhlcvColumn::High,
        OhlcvColumn::Low,
        OhlcvColumn::Close,
        OhlcvColumn::Volume,
    ];
    for column in columns {
        data.column(column).require_finite(stage)?;
    }
    close.require_non_constant(stage)?;

    let volume = data.column(OhlcvColumn::Volume);
    let trendline = fit_trendline(close.values(), volume.values()).map_err(|e| {
        ForecastError::precondition(stage, close.len(), format!("volume trendline: {}", e))
    })?;

    let overview = TradingOverview {
        open: data.column(OhlcvColumn::Open),
        high: data.column(OhlcvColumn::High),
        low: data.column(OhlcvColumn::Low),
        close_histogram: histogram(close.values(), bins)?,
        volume_histogram: histogram(volume.values(), bins)?,
        close,
        volume,
        trendline,
    };

    info!(
        "Trading overview of {}: volume slope {:.4} per unit of price",
        data.symbol(),
        overview.trendline.slope
    );
    Ok(overview)
}

/// Regress `y` on `x` with a constant
fn fit_trendline(x: &[f64], y: &[f64]) -> Result<Trendline> {
    let design: Vec<Vec<f64>> = x.iter().map(|v| vec![1.0, *v]).collect();
    let fit = ols(&design, y)?;
    let y_mean = mean(y)?;
    let total: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if total > 0.0 { 1.0 - fit.ssr / total } else { 0.0 };
    Ok(Trendline {
        intercept: fit.params[0],
        slope: fit.params[1],
        r_squared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    #[test]
    fn test_yearly_close() {
        let dates = vec![
            NaiveDate::from_ymd_opt(2021, 12, 30).unwrap(),
            NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
            NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
        ];
        let close = TimeSeries::new("Close", dates, vec![10.0, 12.0, 16.5]).unwrap();
        let years = yearly_close(&close);

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2021);
        assert_relative_eq!(years[0].mean_close, 11.0);
        assert_eq!(years[0].change_pct, None);
        assert_relative_eq!(years[1].change_pct.unwrap(), 50.0);
    }

    #[test]
    fn test_trendline_recovers_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [10.0, 8.0, 6.0, 4.0];
        let line = fit_trendline(&x, &y).unwrap();

        assert_relative_eq!(line.intercept, 12.0, epsilon = 1e-9);
        assert_relative_eq!(line.slope, -2.0, epsilon = 1e-9);
        assert_relative_eq!(line.r_squared, 1.0, epsilon = 1e-9);
        assert_relative_eq!(line.predict(5.0), 2.0, epsilon = 1e-9);
    }
}
