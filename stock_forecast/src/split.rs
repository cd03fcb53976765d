//! Positional train/test partitioning

use crate::chart::{Chart, Trace};
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result, Stage};
use tracing::debug;

/// Train prefix and test suffix of a trimmed series
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDataset {
    pub train: TimeSeries,
    pub test: TimeSeries,
    /// Series the partitions were taken from, before trimming
    pub source: TimeSeries,
}

impl SplitDataset {
    /// `train ++ test`, the trimmed input
    pub fn rejoin(&self) -> Result<TimeSeries> {
        self.train.concat(&self.test)
    }

    /// Full series in one trace and the test suffix on top
    pub fn chart(&self) -> Chart {
        Chart::new("Train Test Split", "Dates", "Closing Prices")
            .with_trace(Trace::from_series("Train data", &self.source))
            .with_trace(Trace::from_series("Test data", &self.test))
    }
}

/// Boundary position `floor(len · fraction)`
pub fn split_boundary(len: usize, train_fraction: f64) -> usize {
    (len as f64 * train_fraction).floor() as usize
}

/// Drop `drop_leading` observations, then split at `floor(len · train_fraction)`
///
/// The boundary is computed over the full series, so the training partition
/// holds `boundary - drop_leading` observations.
pub fn train_test_split(
    series: &TimeSeries,
    drop_leading: usize,
    train_fraction: f64,
    stage: Stage,
) -> Result<SplitDataset> {
    if !(0.0..1.0).contains(&train_fraction) {
        return Err(ForecastError::InvalidParameter(format!(
            "Train fraction must lie in [0, 1), got {}",
            train_fraction
        )));
    }
    series.require_min_len(stage, (drop_leading + 1).max(4), "train/test split")?;

    let boundary = split_boundary(series.len(), train_fraction);
    if boundary <= drop_leading {
        return Err(ForecastError::precondition(
            stage,
            series.len(),
            format!(
                "train partition is empty: boundary {} (fraction {}) does not exceed the {} dropped observations",
                boundary, train_fraction, drop_leading
            ),
        ));
    }
    if boundary >= series.len() {
        return Err(ForecastError::precondition(
            stage,
            series.len(),
            format!("test partition is empty at fraction {}", train_fraction),
        ));
    }

    let train = series.slice(drop_leading, Some(boundary))?;
    let test = series.slice(boundary, None)?;
    debug!(
        "Split {} observations into {} train and {} test",
        series.len(),
        train.len(),
        test.len()
    );

    Ok(SplitDataset {
        train,
        test,
        source: series.clone(),
    })
}
