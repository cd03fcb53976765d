//! Reference distribution lookups used by the statistical tests

use crate::error::{ForecastError, Result};
use statrs::distribution::{ChiSquared, Continuous, ContinuousCDF, FisherSnedecor, Normal};

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| ForecastError::ForecastingError(e.to_string()))
}

/// Standard normal CDF
pub(crate) fn normal_cdf(x: f64) -> Result<f64> {
    Ok(standard_normal()?.cdf(x))
}

/// Standard normal density
pub(crate) fn normal_pdf(x: f64) -> Result<f64> {
    Ok(standard_normal()?.pdf(x))
}

/// Standard normal quantile
pub(crate) fn normal_quantile(p: f64) -> Result<f64> {
    Ok(standard_normal()?.inverse_cdf(p))
}

/// Two-sided p-value of a z statistic
pub(crate) fn normal_two_sided_p(z: f64) -> Result<f64> {
    Ok(2.0 * (1.0 - normal_cdf(z.abs())?))
}

/// Upper tail probability of a chi-squared statistic
pub(crate) fn chi2_survival(x: f64, df: usize) -> Result<f64> {
    let chi2 =
        ChiSquared::new(df as f64).map_err(|e| ForecastError::ForecastingError(e.to_string()))?;
    Ok(1.0 - chi2.cdf(x))
}

/// Two-sided p-value of an F statistic
pub(crate) fn f_two_sided_p(x: f64, df1: usize, df2: usize) -> Result<f64> {
    let f = FisherSnedecor::new(df1 as f64, df2 as f64)
        .map_err(|e| ForecastError::ForecastingError(e.to_string()))?;
    let upper = 1.0 - f.cdf(x);
    Ok((2.0 * upper.min(1.0 - upper)).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_reference_values() {
        assert_relative_eq!(normal_cdf(0.0).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(normal_pdf(0.0).unwrap(), 0.398942, epsilon = 1e-6);
        assert_relative_eq!(normal_quantile(0.975).unwrap(), 1.959964, epsilon = 1e-5);
        assert_relative_eq!(normal_two_sided_p(1.959964).unwrap(), 0.05, epsilon = 1e-5);
        assert_relative_eq!(chi2_survival(18.307, 10).unwrap(), 0.05, epsilon = 1e-3);
        assert_relative_eq!(f_two_sided_p(1.0, 20, 20).unwrap(), 1.0, epsilon = 1e-6);
    }
}
