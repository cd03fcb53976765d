//! Descriptive statistics over plain slices

use crate::{MathError, Result};

fn require_len(data: &[f64], min: usize, what: &str) -> Result<()> {
    if data.len() < min {
        return Err(MathError::InsufficientData(format!(
            "{} needs at least {} values, have {}",
            what,
            min,
            data.len()
        )));
    }
    Ok(())
}

/// Arithmetic mean
pub fn mean(data: &[f64]) -> Result<f64> {
    require_len(data, 1, "Mean")?;
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample)
pub fn variance(data: &[f64], ddof: usize) -> Result<f64> {
    require_len(data, ddof + 1, "Variance")?;
    let m = mean(data)?;
    let ss: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    Ok(ss / (data.len() - ddof) as f64)
}

/// Standard deviation with `ddof` delta degrees of freedom
pub fn std_dev(data: &[f64], ddof: usize) -> Result<f64> {
    Ok(variance(data, ddof)?.sqrt())
}

/// True when every value equals the first (within a relative tolerance)
pub fn is_constant(data: &[f64]) -> bool {
    match data.first() {
        None => true,
        Some(&first) => {
            let scale = first.abs().max(1.0);
            data.iter().all(|v| (v - first).abs() <= 1e-12 * scale)
        }
    }
}

/// Sample skewness (biased moment estimator, as used by Jarque–Bera)
pub fn skewness(data: &[f64]) -> Result<f64> {
    require_len(data, 3, "Skewness")?;
    let m = mean(data)?;
    let n = data.len() as f64;
    let m2 = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return Err(MathError::CalculationError(
            "Skewness undefined for zero variance".to_string(),
        ));
    }
    let m3 = data.iter().map(|x| (x - m).powi(3)).sum::<f64>() / n;
    Ok(m3 / m2.powf(1.5))
}

/// Sample kurtosis (not excess; a normal sample is near 3)
pub fn kurtosis(data: &[f64]) -> Result<f64> {
    require_len(data, 4, "Kurtosis")?;
    let m = mean(data)?;
    let n = data.len() as f64;
    let m2 = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return Err(MathError::CalculationError(
            "Kurtosis undefined for zero variance".to_string(),
        ));
    }
    let m4 = data.iter().map(|x| (x - m).powi(4)).sum::<f64>() / n;
    Ok(m4 / (m2 * m2))
}

/// Autocorrelation function for lags `0..=max_lag`
///
/// Uses the biased estimator (denominator `n` at every lag), so the result
/// is a valid autocorrelation sequence.
pub fn autocorrelation(data: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    require_len(data, 2, "Autocorrelation")?;
    let n = data.len();
    let max_lag = max_lag.min(n - 1);
    let m = mean(data)?;
    let denom: f64 = data.iter().map(|x| (x - m).powi(2)).sum();

    if denom == 0.0 {
        return Err(MathError::CalculationError(
            "Autocorrelation undefined for a constant series".to_string(),
        ));
    }

    Ok((0..=max_lag)
        .map(|lag| {
            data[lag..]
                .iter()
                .zip(data[..n - lag].iter())
                .map(|(a, b)| (a - m) * (b - m))
                .sum::<f64>()
                / denom
        })
        .collect())
}

/// Minimum and maximum of a non-empty slice
pub fn min_max(data: &[f64]) -> Result<(f64, f64)> {
    require_len(data, 1, "Range")?;
    Ok(data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        }))
}

/// `count` evenly spaced points from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Equal-width bin counts over the range of the data
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` ascending bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Midpoint of every bin
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }
}

/// Count `data` into `bins` equal-width bins; the last bin includes its upper edge
///
/// Constant data is centred in a range of width one.
pub fn histogram(data: &[f64], bins: usize) -> Result<Histogram> {
    require_len(data, 1, "Histogram")?;
    if bins == 0 {
        return Err(MathError::InvalidInput(
            "Histogram needs at least one bin".to_string(),
        ));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Histogram input must be finite".to_string(),
        ));
    }

    let (mut lo, mut hi) = min_max(data)?;
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0; bins];
    for v in data {
        let bin = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[bin] += 1;
    }

    Ok(Histogram {
        edges: linspace(lo, hi, bins + 1),
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_variance() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&data).unwrap(), 5.0);
        assert_relative_eq!(variance(&data, 0).unwrap(), 4.0);
        assert_relative_eq!(std_dev(&data, 0).unwrap(), 2.0);
        assert_relative_eq!(variance(&data, 1).unwrap(), 32.0 / 7.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(mean(&[]).is_err());
        assert!(variance(&[1.0], 1).is_err());
    }

    #[test]
    fn test_is_constant() {
        assert!(is_constant(&[3.0, 3.0, 3.0]));
        assert!(!is_constant(&[3.0, 3.0, 3.1]));
    }

    #[test]
    fn test_symmetric_skewness() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(skewness(&data).unwrap(), 0.0, epsilon = 1e-12);
        // uniform-like sample is platykurtic
        assert!(kurtosis(&data).unwrap() < 3.0);
    }

    #[test]
    fn test_autocorrelation() {
        let data = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let acf = autocorrelation(&data, 2).unwrap();
        assert_relative_eq!(acf[0], 1.0);
        assert!(acf[1] < -0.8);
        assert!(acf[2] > 0.6);
        assert!(autocorrelation(&[2.0, 2.0, 2.0], 1).is_err());
    }

    #[test]
    fn test_linspace() {
        let points = linspace(0.0, 1.0, 5);
        assert_eq!(points, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let data = [0.0, 1.0, 1.5, 2.0, 3.9, 4.0];
        let hist = histogram(&data, 4).unwrap();

        assert_eq!(hist.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(hist.counts, vec![1, 2, 1, 2]);
        assert_eq!(hist.centers(), vec![0.5, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn test_histogram_of_constant_data() {
        let hist = histogram(&[3.0; 5], 2).unwrap();
        assert_eq!(hist.edges, vec![2.5, 3.0, 3.5]);
        assert_eq!(hist.counts, vec![0, 5]);
        assert!(histogram(&[], 3).is_err());
        assert!(histogram(&[1.0], 0).is_err());
    }
}
