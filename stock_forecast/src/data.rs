//! Time series and OHLCV data handling

use crate::error::{ForecastError, Result, Stage};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Named series of values on a strictly increasing date index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series from parallel date and value vectors
    ///
    /// Dates must already be strictly increasing; gaps are allowed.
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }

        if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ForecastError::DataError(format!(
                "Dates must be strictly increasing: {} at index {} follows {}",
                dates[i + 1],
                i + 1,
                dates[i]
            )));
        }

        Ok(Self {
            name: name.into(),
            dates,
            values,
        })
    }

    /// Create a series from `(date, value)` pairs in any order
    pub fn from_unsorted(name: impl Into<String>, mut pairs: Vec<(NaiveDate, f64)>) -> Result<Self> {
        pairs.sort_by_key(|(date, _)| *date);
        if let Some(w) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ForecastError::DataError(format!(
                "Duplicate date {} in series",
                w[0].0
            )));
        }

        let (dates, values) = pairs.into_iter().unzip();
        Self::new(name, dates, values)
    }

    /// Name of the series
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Date index
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Values aligned to the date index
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Check if the time series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get the length of the time series
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Get a slice of the data from start to end index
    pub fn slice(&self, start: usize, end: Option<usize>) -> Result<Self> {
        let end = end.unwrap_or(self.len());
        if start > end || end > self.len() {
            return Err(ForecastError::DataError(format!(
                "Slice {}..{} out of bounds for series of length {}",
                start,
                end,
                self.len()
            )));
        }

        Ok(Self {
            name: self.name.clone(),
            dates: self.dates[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// New series on the same date index with different values
    pub fn with_values(&self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.len() {
            return Err(ForecastError::DataError(format!(
                "Values length ({}) doesn't match index length ({})",
                values.len(),
                self.len()
            )));
        }

        Ok(Self {
            name: name.into(),
            dates: self.dates.clone(),
            values,
        })
    }

    /// Append `other`, which must start after this series ends
    pub fn concat(&self, other: &TimeSeries) -> Result<Self> {
        let mut dates = self.dates.clone();
        dates.extend_from_slice(&other.dates);
        let mut values = self.values.clone();
        values.extend_from_slice(&other.values);
        Self::new(self.name.clone(), dates, values)
    }

    /// Calculate the mean of the values
    pub fn mean(&self) -> Result<f64> {
        Ok(series_math::stats::mean(&self.values)?)
    }

    /// Calculate the sample standard deviation of the values
    pub fn std_dev(&self) -> Result<f64> {
        Ok(series_math::stats::std_dev(&self.values, 1)?)
    }

    pub(crate) fn require_min_len(&self, stage: Stage, min: usize, what: &str) -> Result<()> {
        if self.len() < min {
            return Err(ForecastError::precondition(
                stage,
                self.len(),
                format!("{} requires at least {} observations", what, min),
            ));
        }
        Ok(())
    }

    pub(crate) fn require_finite(&self, stage: Stage) -> Result<()> {
        if let Some(i) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::precondition(
                stage,
                self.len(),
                format!("value at {} ({}) is not finite", self.dates[i], self.values[i]),
            ));
        }
        Ok(())
    }

    pub(crate) fn require_positive(&self, stage: Stage, what: &str) -> Result<()> {
        if let Some(i) = self.values.iter().position(|v| *v <= 0.0) {
            return Err(ForecastError::precondition(
                stage,
                self.len(),
                format!(
                    "{} requires strictly positive values, found {} at {}",
                    what, self.values[i], self.dates[i]
                ),
            ));
        }
        Ok(())
    }

    pub(crate) fn require_non_constant(&self, stage: Stage) -> Result<()> {
        if series_math::stats::is_constant(&self.values) {
            return Err(ForecastError::precondition(
                stage,
                self.len(),
                "series is constant",
            ));
        }
        Ok(())
    }
}

/// One trading day of a security
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

/// The six columns of an OHLCV table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OhlcvColumn {
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

impl OhlcvColumn {
    /// All columns in table order
    pub const ALL: [OhlcvColumn; 6] = [
        OhlcvColumn::Open,
        OhlcvColumn::High,
        OhlcvColumn::Low,
        OhlcvColumn::Close,
        OhlcvColumn::AdjClose,
        OhlcvColumn::Volume,
    ];

    /// Conventional column header
    pub fn name(&self) -> &'static str {
        match self {
            OhlcvColumn::Open => "Open",
            OhlcvColumn::High => "High",
            OhlcvColumn::Low => "Low",
            OhlcvColumn::Close => "Close",
            OhlcvColumn::AdjClose => "Adj Close",
            OhlcvColumn::Volume => "Volume",
        }
    }

    fn value(&self, record: &OhlcvRecord) -> f64 {
        match self {
            OhlcvColumn::Open => record.open,
            OhlcvColumn::High => record.high,
            OhlcvColumn::Low => record.low,
            OhlcvColumn::Close => record.close,
            OhlcvColumn::AdjClose => record.adj_close,
            OhlcvColumn::Volume => record.volume,
        }
    }
}

/// Daily OHLCV history of a single symbol, sorted by date
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvSeries {
    symbol: String,
    records: Vec<OhlcvRecord>,
}

impl OhlcvSeries {
    /// Create a history from records in any order; dates must be unique
    pub fn new(symbol: impl Into<String>, mut records: Vec<OhlcvRecord>) -> Result<Self> {
        let symbol = symbol.into();
        if records.is_empty() {
            return Err(ForecastError::DataError(format!(
                "No rows for symbol {}",
                symbol
            )));
        }

        records.sort_by_key(|r| r.date);
        if let Some(w) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ForecastError::DataError(format!(
                "Duplicate date {} for symbol {}",
                w[0].date, symbol
            )));
        }

        Ok(Self { symbol, records })
    }

    /// Ticker symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Rows in date order
    pub fn records(&self) -> &[OhlcvRecord] {
        &self.records
    }

    /// Number of trading days
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if there are no rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Date index
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }

    /// One column as a time series
    pub fn column(&self, column: OhlcvColumn) -> TimeSeries {
        // Dates were sorted and de-duplicated on construction
        TimeSeries {
            name: column.name().to_string(),
            dates: self.dates(),
            values: self.records.iter().map(|r| column.value(r)).collect(),
        }
    }

    /// Closing prices, the only column the forecasting stages read
    pub fn close(&self) -> TimeSeries {
        self.column(OhlcvColumn::Close)
    }

    /// Render as a polars DataFrame with conventional headers
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self
            .records
            .iter()
            .map(|r| r.date.format("%Y-%m-%d").to_string())
            .collect();

        let mut columns = vec![Series::new("Date", dates)];
        for column in OhlcvColumn::ALL {
            let values: Vec<f64> = self.records.iter().map(|r| column.value(r)).collect();
            columns.push(Series::new(column.name(), values));
        }

        Ok(DataFrame::new(columns)?)
    }
}

/// Data loader for OHLCV tables
#[derive(Debug)]
pub struct DataLoader;

/// Resolved header names of an input table
#[derive(Debug)]
struct ColumnMap {
    date: String,
    close: String,
    open: Option<String>,
    high: Option<String>,
    low: Option<String>,
    adj_close: Option<String>,
    volume: Option<String>,
}

impl DataLoader {
    /// Load an OHLCV table from a CSV file; the symbol is the file stem
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<OhlcvSeries> {
        let path = path.as_ref();
        let symbol = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_uppercase();
        Self::from_csv_with_symbol(&symbol, path)
    }

    /// Load an OHLCV table from a CSV file for an explicit symbol
    pub fn from_csv_with_symbol<P: AsRef<Path>>(symbol: &str, path: P) -> Result<OhlcvSeries> {
        info!("Loading {} history from {}", symbol, path.as_ref().display());
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(symbol, &df)
    }

    /// Create an OHLCV history from an existing DataFrame
    pub fn from_dataframe(symbol: &str, df: &DataFrame) -> Result<OhlcvSeries> {
        let map = Self::detect_columns(df)?;

        let dates = date_column(df, &map.date)?;
        let close = float_column(df, &map.close)?;
        let fallback = |name: &Option<String>, label: &str| -> Result<Vec<f64>> {
            match name {
                Some(name) => float_column(df, name),
                None => {
                    debug!("No {} column for {}, using Close", label, symbol);
                    Ok(close.clone())
                }
            }
        };
        let open = fallback(&map.open, "Open")?;
        let high = fallback(&map.high, "High")?;
        let low = fallback(&map.low, "Low")?;
        let adj_close = fallback(&map.adj_close, "Adj Close")?;
        let volume = match &map.volume {
            Some(name) => float_column(df, name)?,
            None => {
                debug!("No Volume column for {}, using zeros", symbol);
                vec![0.0; close.len()]
            }
        };

        let records = (0..dates.len())
            .map(|i| OhlcvRecord {
                date: dates[i],
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                adj_close: adj_close[i],
                volume: volume[i],
            })
            .collect();

        let series = OhlcvSeries::new(symbol, records)?;
        info!("Loaded {} rows for {}", series.len(), symbol);
        Ok(series)
    }

    /// Match headers case- and punctuation-insensitively
    fn detect_columns(df: &DataFrame) -> Result<ColumnMap> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let find = |candidates: &[&str]| -> Option<String> {
            names
                .iter()
                .find(|name| candidates.contains(&normalise(name).as_str()))
                .cloned()
        };

        let date = find(&["date", "datetime", "timestamp", "time"]).ok_or_else(|| {
            ForecastError::DataError("No date column found in data".to_string())
        })?;
        let close = find(&["close", "price"]).ok_or_else(|| {
            ForecastError::DataError("No close column found in data".to_string())
        })?;

        Ok(ColumnMap {
            date,
            close,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            adj_close: find(&["adjclose", "adjustedclose"]),
            volume: find(&["volume", "vol"]),
        })
    }
}

fn normalise(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    let values = series.f64()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                ForecastError::DataError(format!(
                    "Column '{}' has a missing value at row {}",
                    name, row
                ))
            })
        })
        .collect()
}

fn date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let series = df.column(name)?.cast(&DataType::Utf8)?;
    let values = series.utf8()?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let raw = value.ok_or_else(|| {
                ForecastError::DataError(format!("Missing date at row {}", row))
            })?;
            parse_date(raw)
        })
        .collect()
}

/// Parse a calendar date in the formats market data exports commonly use
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Ok(date);
        }
    }

    // Timestamps such as "2023-01-03 00:00:00" or "2023-01-03T00:00:00-05:00"
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .ok_or_else(|| ForecastError::DataError(format!("Unrecognised date '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    #[test]
    fn test_unsorted_pairs_are_sorted() {
        let series =
            TimeSeries::from_unsorted("Close", vec![(day(3), 3.0), (day(1), 1.0), (day(2), 2.0)])
                .unwrap();
        assert_eq!(series.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_non_increasing_dates_rejected() {
        assert!(TimeSeries::new("x", vec![day(2), day(1)], vec![1.0, 2.0]).is_err());
        assert!(TimeSeries::from_unsorted("x", vec![(day(1), 1.0), (day(1), 2.0)]).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2023-01-15").unwrap(), day(15));
        assert_eq!(parse_date("01/15/2023").unwrap(), day(15));
        assert_eq!(parse_date("2023-01-15 00:00:00").unwrap(), day(15));
        assert!(parse_date("not-a-date").is_err());
    }

    #[test]
    fn test_normalise_headers() {
        assert_eq!(normalise("Adj Close"), "adjclose");
        assert_eq!(normalise("adj_close"), "adjclose");
    }
}
