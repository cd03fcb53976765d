//! Seasonal ARIMA estimated by conditional sum of squares
//!
//! After differencing, the (optionally demeaned) series `z` follows
//! `φ(B)Φ(B^m) z_t = θ(B)Θ(B^m) e_t`. Residuals are computed recursively from
//! a conditioning start with earlier errors set to zero, and the variance is
//! concentrated out of the Gaussian likelihood. Coefficients outside the
//! stationary and invertible regions score an infinite objective.

use super::{ForecastResult, SarimaOrder, TrainedForecastModel};
use crate::config::InformationCriterion;
use crate::distributions::normal_two_sided_p;
use crate::error::{ForecastError, Result};
use nalgebra::DMatrix;
use series_math::optimize::NelderMead;
use series_math::stats::mean;
use series_math::transform::{difference, undifference};
use std::f64::consts::PI;
use std::fmt;
use std::iter::repeat;
use tracing::debug;

/// Largest admissible reflection coefficient magnitude
const ROOT_BOUND: f64 = 0.999;
const HESSIAN_STEP: f64 = 1e-4;

/// Unfitted SARIMA specification
#[derive(Debug, Clone)]
pub struct SarimaModel {
    order: SarimaOrder,
    name: String,
    conditioning_start: Option<usize>,
    optimizer: NelderMead,
}

impl SarimaModel {
    pub fn new(order: SarimaOrder) -> Self {
        Self {
            order,
            name: order.to_string(),
            conditioning_start: None,
            optimizer: NelderMead::new(),
        }
    }

    /// Start the residual recursion at this position of the differenced series
    ///
    /// Models compared on the same data need the same start; it is raised to
    /// the model's own autoregressive lag when lower.
    pub fn with_conditioning_start(mut self, start: usize) -> Self {
        self.conditioning_start = Some(start);
        self
    }

    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    /// Estimate the coefficients on `values`
    pub fn fit(&self, values: &[f64]) -> Result<FittedSarima> {
        let order = self.order;
        if order.seasonal.period == 0 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal period must be positive".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "{} needs finite observations",
                order
            )));
        }

        let (levels, w) = differencing_levels(values, &order);
        let start = self
            .conditioning_start
            .unwrap_or(0)
            .max(order.ar_lag());
        let k = order.arma_params() + usize::from(order.intercept) + 1;
        if w.len() < start + k + 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "{} needs more than {} observations after differencing, have {}",
                order,
                start + k + 1,
                w.len()
            )));
        }

        let level = if order.intercept { mean(&w)? } else { 0.0 };
        let z: Vec<f64> = w.iter().map(|v| v - level).collect();
        let n_eff = (z.len() - start) as f64;

        let objective = |params: &[f64]| -> f64 {
            match Polynomials::from_params(&order, params) {
                Some(poly) => {
                    let sse: f64 = css_errors(&z, &poly, start)[start..]
                        .iter()
                        .map(|e| e * e)
                        .sum();
                    n_eff / 2.0 * (sse / n_eff).ln()
                }
                None => f64::INFINITY,
            }
        };

        let minimum = self
            .optimizer
            .minimize(&objective, &vec![0.0; order.arma_params()])?;
        let poly = Polynomials::from_params(&order, &minimum.point).ok_or_else(|| {
            ForecastError::ForecastingError(format!("{} left the admissible region", order))
        })?;

        let errors = css_errors(&z, &poly, start);
        let residuals = errors[start..].to_vec();
        let sse: f64 = residuals.iter().map(|e| e * e).sum();
        let sigma2 = sse / n_eff;
        let log_likelihood = -n_eff / 2.0 * ((2.0 * PI * sigma2).ln() + 1.0);

        let kf = k as f64;
        let aic = -2.0 * log_likelihood + 2.0 * kf;
        let bic = -2.0 * log_likelihood + kf * n_eff.ln();
        let aicc = if n_eff - kf - 1.0 > 0.0 {
            aic + 2.0 * kf * (kf + 1.0) / (n_eff - kf - 1.0)
        } else {
            f64::INFINITY
        };

        let std_errors = hessian_std_errors(&objective, &minimum.point);
        let coefficients = coefficient_table(
            &order,
            &minimum.point,
            &std_errors,
            &poly,
            level,
            sigma2,
            n_eff,
        )?;

        debug!(
            "{}: log-likelihood {:.3}, AIC {:.3} after {} iterations",
            order, log_likelihood, aic, minimum.iterations
        );

        Ok(FittedSarima {
            order,
            name: self.name.clone(),
            levels,
            level,
            poly,
            z,
            errors,
            conditioning_start: start,
            coefficients,
            residuals,
            sigma2,
            log_likelihood,
            aic,
            bic,
            aicc,
            nobs: n_eff as usize,
            converged: minimum.converged,
        })
    }
}

/// Non-zero terms `(lag, coefficient)` of the expanded lag polynomials
#[derive(Debug, Clone, PartialEq)]
struct Polynomials {
    /// `a_k` in `z_t = Σ a_k z_{t-k} + …`
    ar: Vec<(usize, f64)>,
    /// `b_k` in `… + e_t + Σ b_k e_{t-k}`
    ma: Vec<(usize, f64)>,
}

impl Polynomials {
    /// Expand `[φ, θ, Φ, Θ]`, or `None` outside the admissible region
    fn from_params(order: &SarimaOrder, params: &[f64]) -> Option<Self> {
        let (p, q) = (order.order.p, order.order.q);
        let (sp, sq) = (order.seasonal.p, order.seasonal.q);
        let phi = &params[..p];
        let theta = &params[p..p + q];
        let seasonal_phi = &params[p + q..p + q + sp];
        let seasonal_theta = &params[p + q + sp..p + q + sp + sq];

        let negated = |c: &[f64]| c.iter().map(|v| -v).collect::<Vec<_>>();
        if !is_stationary(phi)
            || !is_stationary(seasonal_phi)
            || !is_stationary(&negated(theta))
            || !is_stationary(&negated(seasonal_theta))
        {
            return None;
        }

        let m = order.seasonal.period;
        let ar = multiply(&lag_polynomial(phi, 1, -1.0), &lag_polynomial(seasonal_phi, m, -1.0));
        let ma = multiply(&lag_polynomial(theta, 1, 1.0), &lag_polynomial(seasonal_theta, m, 1.0));

        Some(Self {
            ar: nonzero_terms(&ar, -1.0),
            ma: nonzero_terms(&ma, 1.0),
        })
    }

    fn ar_sum(&self) -> f64 {
        self.ar.iter().map(|(_, a)| a).sum()
    }

    fn ma_sum(&self) -> f64 {
        self.ma.iter().map(|(_, b)| b).sum()
    }

    /// One-step prediction of `z[t]` from earlier values and errors
    fn predict(&self, z: &[f64], errors: &[f64], t: usize) -> f64 {
        let ar: f64 = self
            .ar
            .iter()
            .filter(|(k, _)| *k <= t)
            .map(|(k, a)| a * z[t - k])
            .sum();
        let ma: f64 = self
            .ma
            .iter()
            .filter(|(k, _)| *k <= t)
            .map(|(k, b)| b * errors[t - k])
            .sum();
        ar + ma
    }
}

/// Lags `1..` with non-zero coefficient, scaled by `sign`
fn nonzero_terms(poly: &[f64], sign: f64) -> Vec<(usize, f64)> {
    poly.iter()
        .enumerate()
        .skip(1)
        .filter(|(_, c)| **c != 0.0)
        .map(|(k, c)| (k, sign * c))
        .collect()
}

/// `1 + sign·Σ c_j B^(j·step)` as dense coefficients
fn lag_polynomial(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (j, c) in coefficients.iter().enumerate() {
        poly[(j + 1) * step] = sign * c;
    }
    poly
}

fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }
    product
}

/// Whether `1 - Σ c_k B^k` has all roots outside the unit circle
///
/// Runs the Durbin–Levinson recursion backwards; every reflection
/// coefficient must stay inside `ROOT_BOUND`.
fn is_stationary(coefficients: &[f64]) -> bool {
    let mut phi = coefficients.to_vec();
    while let Some(&kappa) = phi.last() {
        if !kappa.is_finite() || kappa.abs() >= ROOT_BOUND {
            return false;
        }
        let k = phi.len();
        let denom = 1.0 - kappa * kappa;
        phi = (0..k - 1)
            .map(|i| (phi[i] + kappa * phi[k - 2 - i]) / denom)
            .collect();
    }
    true
}

/// Recursive errors; positions before `start` stay zero
fn css_errors(z: &[f64], poly: &Polynomials, start: usize) -> Vec<f64> {
    let mut errors = vec![0.0; z.len()];
    for t in start..z.len() {
        errors[t] = z[t] - poly.predict(z, &errors, t);
    }
    errors
}

/// Histories before each difference, paired with its lag, and the differenced series
fn differencing_levels(values: &[f64], order: &SarimaOrder) -> (Vec<(Vec<f64>, usize)>, Vec<f64>) {
    let lags = repeat(order.seasonal.period)
        .take(order.seasonal.d)
        .chain(repeat(1).take(order.order.d));

    let mut levels = Vec::new();
    let mut current = values.to_vec();
    for lag in lags {
        let next = difference(&current, lag);
        levels.push((current, lag));
        current = next;
    }
    (levels, current)
}

/// Finite-difference direction available for one coefficient
#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Both,
    Up,
    Down,
}

impl Side {
    fn sign(self) -> f64 {
        match self {
            Side::Both | Side::Up => 1.0,
            Side::Down => -1.0,
        }
    }
}

/// Standard errors from a finite-difference Hessian of the negative log-likelihood
///
/// Coefficients with an admissible step on both sides use central differences.
/// A coefficient next to the admissible boundary is differenced one-sided,
/// away from the boundary. Coefficients boxed in on both sides, or whose
/// curvature cannot be inverted, get `NaN`.
fn hessian_std_errors<F: Fn(&[f64]) -> f64>(objective: &F, point: &[f64]) -> Vec<f64> {
    let n = point.len();
    let mut std_errors = vec![f64::NAN; n];
    if n == 0 {
        return std_errors;
    }

    let at = |offsets: &[(usize, f64)]| -> f64 {
        let mut x = point.to_vec();
        for (i, delta) in offsets {
            x[*i] += delta;
        }
        objective(&x)
    };

    let h = HESSIAN_STEP;
    let base = objective(point);
    let sides: Vec<Option<Side>> = (0..n)
        .map(|i| match (at(&[(i, h)]).is_finite(), at(&[(i, -h)]).is_finite()) {
            (true, true) => Some(Side::Both),
            (true, false) => Some(Side::Up),
            (false, true) => Some(Side::Down),
            (false, false) => None,
        })
        .collect();

    let entry = |i: usize, j: usize, a: Side, b: Side| -> f64 {
        if a == Side::Both && b == Side::Both {
            return (at(&[(i, h), (j, h)]) - at(&[(i, h), (j, -h)]) - at(&[(i, -h), (j, h)])
                + at(&[(i, -h), (j, -h)]))
                / (4.0 * h * h);
        }
        let (hi, hj) = (a.sign() * h, b.sign() * h);
        if i == j {
            (at(&[(i, 2.0 * hi)]) - 2.0 * at(&[(i, hi)]) + base) / (h * h)
        } else {
            (at(&[(i, hi), (j, hj)]) - at(&[(i, hi)]) - at(&[(j, hj)]) + base) / (hi * hj)
        }
    };

    let usable: Vec<(usize, Side)> = sides
        .iter()
        .enumerate()
        .filter_map(|(i, side)| side.map(|s| (i, s)))
        .collect();
    let interior: Vec<(usize, Side)> = usable
        .iter()
        .copied()
        .filter(|(_, s)| *s == Side::Both)
        .collect();

    // The interior block fills whatever the full matrix could not
    for subset in [usable, interior] {
        let m = subset.len();
        if m == 0 || subset.iter().all(|(i, _)| std_errors[*i].is_finite()) {
            continue;
        }
        let hessian = DMatrix::from_fn(m, m, |r, c| {
            let (i, a) = subset[r];
            let (j, b) = subset[c];
            entry(i, j, a, b)
        });
        if hessian.iter().any(|v| !v.is_finite()) {
            continue;
        }
        if let Some(covariance) = hessian.try_inverse() {
            for (r, (i, _)) in subset.iter().enumerate() {
                let variance = covariance[(r, r)];
                if std_errors[*i].is_nan() && variance.is_finite() && variance > 0.0 {
                    std_errors[*i] = variance.sqrt();
                }
            }
        }
    }
    std_errors
}

/// One row of the coefficient table
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: String,
    pub value: f64,
    pub std_error: f64,
    pub z_value: f64,
    pub p_value: f64,
}

impl Coefficient {
    fn new(name: String, value: f64, std_error: f64) -> Result<Self> {
        let z_value = value / std_error;
        let p_value = if z_value.is_finite() {
            normal_two_sided_p(z_value)?
        } else {
            f64::NAN
        };
        Ok(Self {
            name,
            value,
            std_error,
            z_value,
            p_value,
        })
    }
}

fn coefficient_table(
    order: &SarimaOrder,
    params: &[f64],
    std_errors: &[f64],
    poly: &Polynomials,
    level: f64,
    sigma2: f64,
    n_eff: f64,
) -> Result<Vec<Coefficient>> {
    let mut table = Vec::with_capacity(params.len() + 2);

    if order.intercept {
        // Constant of φ(B)Φ(B^m) w_t = c + …, with the long-run standard error of the mean
        let ar_gain = 1.0 - poly.ar_sum();
        let value = level * ar_gain;
        let std_error = (sigma2 / n_eff).sqrt() * (1.0 + poly.ma_sum()).abs();
        table.push(Coefficient::new("intercept".to_string(), value, std_error)?);
    }

    let m = order.seasonal.period;
    let names = (1..=order.order.p)
        .map(|i| format!("ar.L{}", i))
        .chain((1..=order.order.q).map(|i| format!("ma.L{}", i)))
        .chain((1..=order.seasonal.p).map(|i| format!("ar.S.L{}", i * m)))
        .chain((1..=order.seasonal.q).map(|i| format!("ma.S.L{}", i * m)));
    for ((name, value), std_error) in names.zip(params).zip(std_errors) {
        table.push(Coefficient::new(name, *value, *std_error)?);
    }

    table.push(Coefficient::new(
        "sigma2".to_string(),
        sigma2,
        sigma2 * (2.0 / n_eff).sqrt(),
    )?);

    Ok(table)
}

/// SARIMA model fitted to a training series
#[derive(Debug, Clone)]
pub struct FittedSarima {
    order: SarimaOrder,
    name: String,
    levels: Vec<(Vec<f64>, usize)>,
    level: f64,
    poly: Polynomials,
    z: Vec<f64>,
    errors: Vec<f64>,
    conditioning_start: usize,
    coefficients: Vec<Coefficient>,
    residuals: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    aic: f64,
    bic: f64,
    aicc: f64,
    nobs: usize,
    converged: bool,
}

impl FittedSarima {
    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    /// Intercept, ARMA coefficients and sigma2, in that order
    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    /// Look up a coefficient by name, e.g. `ar.L1`
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    pub fn aicc(&self) -> f64 {
        self.aicc
    }

    pub fn criterion(&self, criterion: InformationCriterion) -> f64 {
        match criterion {
            InformationCriterion::Aic => self.aic,
            InformationCriterion::Bic => self.bic,
            InformationCriterion::Aicc => self.aicc,
        }
    }

    /// Observations entering the likelihood
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    pub fn conditioning_start(&self) -> usize {
        self.conditioning_start
    }

    /// Whether the optimiser met its tolerance
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn summary(&self) -> FitSummary {
        FitSummary {
            order: self.order,
            nobs: self.nobs,
            log_likelihood: self.log_likelihood,
            aic: self.aic,
            bic: self.bic,
            aicc: self.aicc,
            coefficients: self.coefficients.clone(),
        }
    }
}

impl TrainedForecastModel for FittedSarima {
    fn forecast(&self, horizons: usize) -> Result<ForecastResult> {
        let mut z = self.z.clone();
        let mut errors = self.errors.clone();
        let n = z.len();

        // Future errors have expectation zero
        for t in n..n + horizons {
            let value = self.poly.predict(&z, &errors, t);
            z.push(value);
            errors.push(0.0);
        }

        let mut values: Vec<f64> = z[n..].iter().map(|v| v + self.level).collect();
        for (history, lag) in self.levels.iter().rev() {
            values = undifference(history, &values, *lag)?;
        }

        ForecastResult::new(values, horizons)
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Printable fit report
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub order: SarimaOrder,
    pub nobs: usize,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub aicc: f64,
    pub coefficients: Vec<Coefficient>,
}

impl fmt::Display for FitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(72);
        writeln!(f, "{:^72}", "SARIMA Results")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "{:<20}{:>52}", "Model:", self.order.to_string())?;
        writeln!(f, "{:<20}{:>52}", "No. Observations:", self.nobs)?;
        writeln!(f, "{:<20}{:>52.3}", "Log Likelihood", self.log_likelihood)?;
        writeln!(f, "{:<20}{:>52.3}", "AIC", self.aic)?;
        writeln!(f, "{:<20}{:>52.3}", "BIC", self.bic)?;
        writeln!(f, "{:<20}{:>52.3}", "AICc", self.aicc)?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<16}{:>14}{:>14}{:>14}{:>14}",
            "", "coef", "std err", "z", "P>|z|"
        )?;
        writeln!(f, "{}", "-".repeat(72))?;
        for c in &self.coefficients {
            writeln!(
                f,
                "{:<16}{:>14.4}{:>14.4}{:>14.3}{:>14.3}",
                c.name, c.value, c.std_error, c.z_value, c.p_value
            )?;
        }
        write!(f, "{}", rule)
    }
}
