//! Series transforms: logs, differencing and its inverse, percentage change

use crate::{MathError, Result};

/// Natural log of every value; all values must be strictly positive
pub fn log(data: &[f64]) -> Result<Vec<f64>> {
    if let Some((idx, value)) = data
        .iter()
        .enumerate()
        .find(|(_, v)| **v <= 0.0 || !v.is_finite())
    {
        return Err(MathError::InvalidInput(format!(
            "Log transform needs strictly positive finite values, found {} at index {}",
            value, idx
        )));
    }

    Ok(data.iter().map(|v| v.ln()).collect())
}

/// Lagged difference `x[t] - x[t - lag]`; the result is `lag` values shorter
pub fn difference(data: &[f64], lag: usize) -> Vec<f64> {
    if lag == 0 {
        return data.to_vec();
    }
    if data.len() <= lag {
        return Vec::new();
    }

    data[lag..]
        .iter()
        .zip(data.iter())
        .map(|(current, previous)| current - previous)
        .collect()
}

/// Undo one lag-`lag` difference of a forecast
///
/// `history` is the undifferenced series the forecast continues; each
/// restored value adds back the value `lag` steps earlier.
pub fn undifference(history: &[f64], diffs: &[f64], lag: usize) -> Result<Vec<f64>> {
    if lag == 0 || history.len() < lag {
        return Err(MathError::InsufficientData(format!(
            "Undoing a lag {} difference needs at least {} historical values, have {}",
            lag,
            lag.max(1),
            history.len()
        )));
    }

    let mut extended = history[history.len() - lag..].to_vec();
    for diff in diffs {
        let restored = diff + extended[extended.len() - lag];
        extended.push(restored);
    }

    Ok(extended.split_off(lag))
}

/// Fractional change from the previous value; the first entry is `None`
pub fn pct_change(data: &[f64]) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(data.len());
    if data.is_empty() {
        return result;
    }

    result.push(None);
    for w in data.windows(2) {
        if w[0] == 0.0 {
            result.push(None);
        } else {
            result.push(Some(w[1] / w[0] - 1.0));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_rejects_non_positive() {
        assert!(log(&[1.0, 0.0, 2.0]).is_err());
        assert!(log(&[1.0, -3.0]).is_err());
        let logged = log(&[1.0, std::f64::consts::E]).unwrap();
        assert_relative_eq!(logged[1], 1.0);
    }

    #[test]
    fn test_difference() {
        let data = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&data, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&difference(&data, 1), 1), vec![1.0, 1.0, 1.0]);
        assert_eq!(difference(&data, 2), vec![5.0, 7.0, 9.0]);
        assert!(difference(&data, 5).is_empty());
    }

    #[test]
    fn test_undifference_seasonal_lag() {
        let data = vec![1.0, 2.0, 3.0, 1.5, 2.5, 3.5, 2.0, 3.0];
        let diffs = difference(&data, 3);
        let restored = undifference(&data[..5], &diffs[2..], 3).unwrap();
        assert_eq!(restored, data[5..].to_vec());
        assert!(undifference(&data[..2], &diffs, 3).is_err());
    }

    #[test]
    fn test_pct_change() {
        let changes = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(changes[0], None);
        assert_relative_eq!(changes[1].unwrap(), 0.1);
        assert_relative_eq!(changes[2].unwrap(), -0.1);
    }
}
