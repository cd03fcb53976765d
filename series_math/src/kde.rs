//! Gaussian kernel density estimation

use crate::stats::{linspace, min_max, std_dev};
use crate::{MathError, Result};

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Univariate Gaussian KDE with Scott's rule bandwidth
#[derive(Debug, Clone)]
pub struct GaussianKde {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Fit a KDE to `samples`; needs at least two distinct values
    pub fn new(samples: &[f64]) -> Result<Self> {
        if samples.len() < 2 {
            return Err(MathError::InsufficientData(format!(
                "Density estimate needs at least 2 samples, have {}",
                samples.len()
            )));
        }
        if samples.iter().any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Density estimate needs finite samples".to_string(),
            ));
        }

        let sigma = std_dev(samples, 1)?;
        if sigma == 0.0 {
            return Err(MathError::CalculationError(
                "Density estimate undefined for a constant sample".to_string(),
            ));
        }

        // Scott's factor n^(-1/5) applied to the sample standard deviation
        let bandwidth = sigma * (samples.len() as f64).powf(-0.2);

        Ok(Self {
            samples: samples.to_vec(),
            bandwidth,
        })
    }

    /// Kernel bandwidth
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Estimated density at `x`
    pub fn density(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let total: f64 = self
            .samples
            .iter()
            .map(|s| {
                let z = (x - s) / h;
                (-0.5 * z * z).exp()
            })
            .sum();

        total * INV_SQRT_2PI / (h * self.samples.len() as f64)
    }

    /// Density evaluated on `points` evenly spaced values spanning the sample range
    pub fn evaluate_grid(&self, points: usize) -> Result<(Vec<f64>, Vec<f64>)> {
        let (lo, hi) = min_max(&self.samples)?;
        let grid = linspace(lo, hi, points);
        let density = grid.iter().map(|&x| self.density(x)).collect();
        Ok((grid, density))
    }
}
