//! Seeded synthetic price series with a linear trend and weekly seasonality

use crate::data::{OhlcvRecord, OhlcvSeries, TimeSeries};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Shape of the generated series: `base + slope·t + amplitude·sin(2πt/period) + noise`
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub length: usize,
    pub start: NaiveDate,
    pub base: f64,
    pub slope: f64,
    pub amplitude: f64,
    pub period: f64,
    pub noise_std: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            length: 400,
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            base: 100.0,
            slope: 0.5,
            amplitude: 10.0,
            period: 7.0,
            noise_std: 1.0,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    /// Noise-free value at step `t`
    pub fn signal(&self, t: usize) -> f64 {
        let t = t as f64;
        self.base + self.slope * t + self.amplitude * (2.0 * PI * t / self.period).sin()
    }

    fn noise(&self) -> Result<Normal<f64>> {
        if self.period <= 0.0 {
            return Err(ForecastError::InvalidParameter(format!(
                "Synthetic period must be positive, got {}",
                self.period
            )));
        }
        Normal::new(0.0, self.noise_std).map_err(|e| {
            ForecastError::InvalidParameter(format!(
                "Invalid noise standard deviation {}: {}",
                self.noise_std, e
            ))
        })
    }
}

/// `count` consecutive weekdays from `start`, `start` included when it is one
pub fn business_days(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    std::iter::successors(Some(start), |d| d.succ_opt())
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .take(count)
        .collect()
}

/// Closing prices on business days
pub fn generate_close(config: &SyntheticConfig) -> Result<TimeSeries> {
    let noise = config.noise()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let values = (0..config.length)
        .map(|t| config.signal(t) + noise.sample(&mut rng))
        .collect();
    TimeSeries::new("Close", business_days(config.start, config.length), values)
}

/// Full daily bars around the closes of [`generate_close`]
pub fn generate_ohlcv(symbol: &str, config: &SyntheticConfig) -> Result<OhlcvSeries> {
    let close = generate_close(config)?;
    let wick = config.noise()?;
    // Offset so bar extras do not replay the close noise
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));

    let mut previous = None;
    let records = close
        .dates()
        .iter()
        .zip(close.values())
        .map(|(date, &close)| {
            let open = previous.unwrap_or(close);
            previous = Some(close);
            let high = open.max(close) + wick.sample(&mut rng).abs() / 2.0;
            let low = open.min(close) - wick.sample(&mut rng).abs() / 2.0;
            OhlcvRecord {
                date: *date,
                open,
                high,
                low,
                close,
                adj_close: close,
                volume: rng.gen_range(1_000_000.0..2_000_000.0_f64).round(),
            }
        })
        .collect();

    OhlcvSeries::new(symbol, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_business_days_skip_weekends() {
        // 2020-01-03 is a Friday
        let start = NaiveDate::from_ymd_opt(2020, 1, 3).unwrap();
        let days = business_days(start, 3);
        assert_eq!(
            days,
            vec![
                start,
                NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
                NaiveDate::from_ymd_opt(2020, 1, 7).unwrap(),
            ]
        );
    }

    #[test]
    fn test_same_seed_same_series() {
        let config = SyntheticConfig::default();
        let a = generate_close(&config).unwrap();
        let b = generate_close(&config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 400);
    }

    #[test]
    fn test_noise_free_series_is_the_signal() {
        let config = SyntheticConfig {
            noise_std: 0.0,
            length: 20,
            ..SyntheticConfig::default()
        };
        let close = generate_close(&config).unwrap();
        for (t, value) in close.values().iter().enumerate() {
            assert_relative_eq!(*value, config.signal(t));
        }
    }

    #[test]
    fn test_ohlcv_bars_are_consistent() {
        let data = generate_ohlcv("SYN", &SyntheticConfig::default()).unwrap();
        assert_eq!(data.symbol(), "SYN");
        for record in data.records() {
            assert!(record.low <= record.open.min(record.close));
            assert!(record.high >= record.open.max(record.close));
            assert!(record.volume >= 1_000_000.0);
        }
    }

    #[test]
    fn test_negative_noise_rejected() {
        let config = SyntheticConfig {
            noise_std: -1.0,
            ..SyntheticConfig::default()
        };
        assert!(generate_close(&config).is_err());
    }
}
