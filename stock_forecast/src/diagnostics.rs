//! Residual diagnostics of a fitted model

use crate::chart::{Chart, Summary, Trace};
use crate::distributions::{chi2_survival, f_two_sided_p, normal_pdf, normal_quantile};
use crate::error::{ForecastError, Result};
use series_math::kde::GaussianKde;
use series_math::stats::{autocorrelation, is_constant, kurtosis, linspace, min_max, skewness};

const DENSITY_POINTS: usize = 100;

/// Statistic with its p-value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Plots and tests describing how close residuals are to white noise
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualDiagnostics {
    /// Residuals divided by their root mean square
    pub standardized: Vec<f64>,
    /// Grid, kernel density and N(0,1) density of the standardized residuals
    pub density_grid: Vec<f64>,
    pub kde: Vec<f64>,
    pub normal_density: Vec<f64>,
    /// `(theoretical, sample)` quantile pairs
    pub qq_points: Vec<(f64, f64)>,
    /// Autocorrelations at lags `1..=lags`
    pub acf: Vec<f64>,
    /// 95% band for white noise autocorrelations
    pub acf_bound: f64,
    pub ljung_box: TestResult,
    pub jarque_bera: TestResult,
    pub heteroskedasticity: TestResult,
    pub skew: f64,
    pub kurtosis: f64,
}

impl ResidualDiagnostics {
    /// Diagnose `residuals` with autocorrelation tests up to `lags`
    pub fn compute(residuals: &[f64], lags: usize) -> Result<Self> {
        let n = residuals.len();
        if lags == 0 || n < lags + 2 || n < 6 {
            return Err(ForecastError::InvalidParameter(format!(
                "Residual diagnostics with {} lags need at least {} residuals, have {}",
                lags,
                (lags + 2).max(6),
                n
            )));
        }
        if is_constant(residuals) {
            return Err(ForecastError::InvalidParameter(
                "Residual diagnostics undefined for constant residuals".to_string(),
            ));
        }

        let scale = (residuals.iter().map(|e| e * e).sum::<f64>() / n as f64).sqrt();
        let standardized: Vec<f64> = residuals.iter().map(|e| e / scale).collect();

        let kde = GaussianKde::new(&standardized)?;
        let (lo, hi) = min_max(&standardized)?;
        let density_grid = linspace(lo, hi, DENSITY_POINTS);
        let kde_values = density_grid.iter().map(|x| kde.density(*x)).collect();
        let normal_density = density_grid
            .iter()
            .map(|x| normal_pdf(*x))
            .collect::<Result<Vec<f64>>>()?;

        let mut sorted = standardized.clone();
        sorted.sort_by(f64::total_cmp);
        let qq_points = sorted
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                let position = (i + 1) as f64 / (n + 1) as f64;
                Ok((normal_quantile(position)?, *sample))
            })
            .collect::<Result<Vec<(f64, f64)>>>()?;

        let acf = autocorrelation(residuals, lags)?[1..].to_vec();
        let acf_bound = 1.96 / (n as f64).sqrt();

        let skew = skewness(residuals)?;
        let kurt = kurtosis(residuals)?;

        Ok(Self {
            standardized,
            density_grid,
            kde: kde_values,
            normal_density,
            qq_points,
            ljung_box: ljung_box(&acf, n)?,
            jarque_bera: jarque_bera(n, skew, kurt)?,
            heteroskedasticity: heteroskedasticity(residuals)?,
            acf,
            acf_bound,
            skew,
            kurtosis: kurt,
        })
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::new("Residual Diagnostics");
        summary.push(format!("Ljung-Box (L{}) (Q)", self.acf.len()), self.ljung_box.statistic);
        summary.push("Prob(Q)", self.ljung_box.p_value);
        summary.push("Jarque-Bera (JB)", self.jarque_bera.statistic);
        summary.push("Prob(JB)", self.jarque_bera.p_value);
        summary.push("Heteroskedasticity (H)", self.heteroskedasticity.statistic);
        summary.push("Prob(H) (two-sided)", self.heteroskedasticity.p_value);
        summary.push("Skew", self.skew);
        summary.push("Kurtosis", self.kurtosis);
        summary
    }

    /// Standardized residuals, density, Q-Q plot and correlogram
    pub fn charts(&self) -> Vec<Chart> {
        let index: Vec<f64> = (0..self.standardized.len()).map(|i| i as f64).collect();
        let lags: Vec<f64> = (1..=self.acf.len()).map(|l| l as f64).collect();
        let (theoretical, sample): (Vec<f64>, Vec<f64>) = self.qq_points.iter().copied().unzip();

        vec![
            Chart::new("Standardized residual", "Observation", "Residual")
                .with_trace(Trace::from_numbers("Standardized residual", &index, &self.standardized)),
            Chart::new("Histogram plus estimated density", "Residual", "Density")
                .with_trace(Trace::from_numbers("KDE", &self.density_grid, &self.kde))
                .with_trace(Trace::from_numbers("N(0,1)", &self.density_grid, &self.normal_density)),
            Chart::new("Normal Q-Q", "Theoretical Quantiles", "Sample Quantiles")
                .with_trace(Trace::from_numbers("Sample quantiles", &theoretical, &sample))
                .with_trace(Trace::from_numbers("Reference line", &theoretical, &theoretical)),
            Chart::new("Correlogram", "Lag", "Autocorrelation")
                .with_trace(Trace::from_numbers("ACF", &lags, &self.acf))
                .with_trace(Trace::from_numbers("Upper bound", &lags, &vec![self.acf_bound; lags.len()]))
                .with_trace(Trace::from_numbers("Lower bound", &lags, &vec![-self.acf_bound; lags.len()])),
        ]
    }
}

/// Ljung–Box portmanteau statistic over the given autocorrelations
fn ljung_box(acf: &[f64], n: usize) -> Result<TestResult> {
    let nf = n as f64;
    let statistic = nf
        * (nf + 2.0)
        * acf
            .iter()
            .enumerate()
            .map(|(i, r)| r * r / (nf - (i + 1) as f64))
            .sum::<f64>();
    Ok(TestResult {
        statistic,
        p_value: chi2_survival(statistic, acf.len())?,
    })
}

fn jarque_bera(n: usize, skew: f64, kurtosis: f64) -> Result<TestResult> {
    let statistic = n as f64 / 6.0 * (skew.powi(2) + (kurtosis - 3.0).powi(2) / 4.0);
    Ok(TestResult {
        statistic,
        p_value: chi2_survival(statistic, 2)?,
    })
}

/// Ratio of squared residuals in the last third to the first third
fn heteroskedasticity(residuals: &[f64]) -> Result<TestResult> {
    let h = residuals.len() / 3;
    let sum_squares = |slice: &[f64]| slice.iter().map(|e| e * e).sum::<f64>();
    let early = sum_squares(&residuals[..h]);
    let late = sum_squares(&residuals[residuals.len() - h..]);
    if early == 0.0 {
        return Ok(TestResult {
            statistic: f64::INFINITY,
            p_value: 0.0,
        });
    }

    let statistic = late / early;
    Ok(TestResult {
        statistic,
        p_value: f_two_sided_p(statistic, h, h)?,
    })
}
