//! Ordinary least squares
//!
//! Small dense regressions (unit-root tests, lag searches) solved through
//! the normal equations with a Cholesky factorisation.

use crate::{MathError, Result};
use nalgebra::{DMatrix, DVector};

/// Result of an OLS regression
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// Estimated coefficients, in design column order
    pub params: Vec<f64>,
    /// Standard errors of the coefficients
    pub std_errors: Vec<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    /// Number of observations used
    pub nobs: usize,
}

impl OlsFit {
    /// t statistic of the coefficient at `idx`
    pub fn t_value(&self, idx: usize) -> Option<f64> {
        let param = self.params.get(idx)?;
        let se = self.std_errors.get(idx)?;
        Some(param / se)
    }

    /// Residual degrees of freedom
    pub fn df_resid(&self) -> usize {
        self.nobs - self.params.len()
    }

    /// Gaussian log-likelihood at the least squares estimate
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.params.len() as f64
    }

    /// Bayesian information criterion
    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood() + self.params.len() as f64 * (self.nobs as f64).ln()
    }
}

/// Regress `response` on the rows of `design`
pub fn ols(design: &[Vec<f64>], response: &[f64]) -> Result<OlsFit> {
    let n = design.len();
    let k = design.first().map(Vec::len).unwrap_or(0);

    if k == 0 {
        return Err(MathError::InvalidInput(
            "Design matrix has no columns".to_string(),
        ));
    }
    if response.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but response has {} values",
            n,
            response.len()
        )));
    }
    if design.iter().any(|row| row.len() != k) {
        return Err(MathError::InvalidInput(
            "Design rows have inconsistent widths".to_string(),
        ));
    }
    if n <= k {
        return Err(MathError::InsufficientData(format!(
            "Regression with {} regressors needs more than {} observations, have {}",
            k, k, n
        )));
    }

    let x = DMatrix::from_fn(n, k, |i, j| design[i][j]);
    let y = DVector::from_column_slice(response);

    let xt = x.transpose();
    let xtx = &xt * &x;
    let singular = || MathError::CalculationError("Design matrix is singular".to_string());
    let chol = xtx.cholesky().ok_or_else(singular)?;

    // Near-collinear columns can survive the factorisation with a vanishing pivot
    let pivots = chol.l().diagonal();
    let (lo, hi) = pivots
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), &d| (lo.min(d), hi.max(d)));
    if lo <= 0.0 || lo / hi < 1e-7 {
        return Err(singular());
    }

    let xtx_inv = chol.inverse();

    let beta = &xtx_inv * (&xt * &y);
    let residuals = &y - &x * &beta;
    let ssr = residuals.norm_squared();
    let sigma2 = ssr / (n - k) as f64;

    let std_errors = (0..k)
        .map(|i| (sigma2 * xtx_inv[(i, i)]).max(0.0).sqrt())
        .collect();

    Ok(OlsFit {
        params: beta.iter().copied().collect(),
        std_errors,
        ssr,
        nobs: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_line() {
        let design: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let response: Vec<f64> = (0..10).map(|i| 1.0 + 2.0 * i as f64).collect();

        let fit = ols(&design, &response).unwrap();
        assert_relative_eq!(fit.params[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.params[1], 2.0, epsilon = 1e-9);
        assert!(fit.ssr < 1e-12);
        assert_eq!(fit.df_resid(), 8);
    }

    #[test]
    fn test_noisy_line_standard_errors() {
        let design: Vec<Vec<f64>> = (0..50).map(|i| vec![1.0, i as f64]).collect();
        let response: Vec<f64> = (0..50)
            .map(|i| 3.0 + 0.5 * i as f64 + if i % 2 == 0 { 0.4 } else { -0.4 })
            .collect();

        let fit = ols(&design, &response).unwrap();
        assert_relative_eq!(fit.params[1], 0.5, epsilon = 0.01);
        assert!(fit.std_errors.iter().all(|se| *se > 0.0));
        assert!(fit.t_value(1).unwrap() > 10.0);
        assert!(fit.aic().is_finite());
        assert!(fit.bic() > fit.aic());
    }

    #[test]
    fn test_singular_design() {
        let design: Vec<Vec<f64>> = (0..10).map(|_| vec![1.0, 2.0]).collect();
        let response: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert!(ols(&design, &response).is_err());
    }

    #[test]
    fn test_too_few_rows() {
        let design = vec![vec![1.0, 0.0], vec![1.0, 1.0]];
        assert!(matches!(
            ols(&design, &[1.0, 2.0]),
            Err(MathError::InsufficientData(_))
        ));
    }
}
