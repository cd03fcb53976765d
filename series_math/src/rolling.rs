//! Rolling window statistics
//!
//! A fixed-size trailing window in the manner of pandas' `rolling(n)`:
//! a statistic is only defined once the window holds `period` values, so
//! the first `period - 1` positions of a rolled series are `None`.

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Trailing window over the most recent `period` values
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl RollingWindow {
    /// Create a new rolling window with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        })
    }

    /// Push a new value, evicting the oldest once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }
    }

    /// Whether the window holds `period` values
    pub fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    /// Mean of the window, once full
    pub fn mean(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        // Recomputed from the window so long runs do not accumulate drift
        Some(self.values.iter().sum::<f64>() / self.period as f64)
    }

    /// Sample standard deviation (ddof = 1) of the window, once full
    pub fn std_dev(&self) -> Option<f64> {
        if !self.is_full() || self.period < 2 {
            return None;
        }

        let mean = self.mean()?;
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (self.period - 1) as f64;

        Some(variance.sqrt())
    }

    /// Running sum of the values currently in the window
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the window, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
        self.sum = 0.0;
    }
}

/// Rolling mean aligned to `data`; `None` until the window fills
pub fn rolling_mean(data: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    roll(data, period, RollingWindow::mean)
}

/// Rolling sample standard deviation aligned to `data`; `None` until the window fills
pub fn rolling_std(data: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    roll(data, period, RollingWindow::std_dev)
}

fn roll<F>(data: &[f64], period: usize, statistic: F) -> Result<Vec<Option<f64>>>
where
    F: Fn(&RollingWindow) -> Option<f64>,
{
    let mut window = RollingWindow::new(period)?;

    Ok(data
        .iter()
        .map(|&value| {
            window.update(value);
            statistic(&window)
        })
        .collect())
}
