//! Order selection for seasonal ARIMA models
//!
//! Strategies fit candidate orders on a training series and keep the one with
//! the lowest information criterion. Every candidate in one search shares the
//! conditioning start of the largest admissible model, so criteria are
//! computed on the same observations.

use crate::config::{AutoArimaConfig, InformationCriterion};
use crate::error::{ForecastError, Result};
use crate::models::sarima::{FittedSarima, SarimaModel};
use crate::models::{ModelOrder, SarimaOrder, SeasonalOrder};
use crate::stationarity::{adf_test, LagSelection};
use series_math::stats::is_constant;
use series_math::transform::difference;
use std::collections::HashMap;
use std::fmt::{self, Debug};
use tracing::{debug, info};

/// Shortest series the differencing pretest is run on
const MIN_PRETEST_LEN: usize = 10;

/// Limits and settings of an order search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBounds {
    pub start_p: usize,
    pub start_q: usize,
    pub start_seasonal_ar: usize,
    pub start_seasonal_ma: usize,
    pub max_p: usize,
    pub max_q: usize,
    pub max_seasonal_ar: usize,
    pub max_seasonal_ma: usize,
    /// Upper bound on p + q + P + Q
    pub max_order: usize,
    pub seasonal_period: usize,
    pub seasonal_differencing: usize,
    pub criterion: InformationCriterion,
    /// Cap on candidate fits
    pub max_fits: usize,
}

impl SearchBounds {
    pub fn from_config(config: &AutoArimaConfig) -> Self {
        Self {
            start_p: config.start_p,
            start_q: config.start_q,
            start_seasonal_ar: config.start_seasonal_ar,
            start_seasonal_ma: config.start_seasonal_ma,
            max_p: config.max_p,
            max_q: config.max_q,
            max_seasonal_ar: config.max_seasonal_ar,
            max_seasonal_ma: config.max_seasonal_ma,
            max_order: config.max_order,
            seasonal_period: config.seasonal_period,
            seasonal_differencing: config.seasonal_differencing,
            criterion: config.criterion,
            max_fits: config.max_fits,
        }
    }

    /// Whether `(p, q, P, Q)` lies inside the bounds
    pub fn admits(&self, p: usize, q: usize, sp: usize, sq: usize) -> bool {
        p <= self.max_p
            && q <= self.max_q
            && sp <= self.max_seasonal_ar
            && sq <= self.max_seasonal_ma
            && p + q + sp + sq <= self.max_order
    }

    /// Conditioning start shared by every candidate
    pub fn conditioning_start(&self) -> usize {
        self.max_p + self.seasonal_period * self.max_seasonal_ar
    }

    /// Full order for the given terms and differencing
    pub fn order(&self, p: usize, d: usize, q: usize, sp: usize, sq: usize) -> SarimaOrder {
        SarimaOrder::new(
            ModelOrder::new(p, d, q),
            SeasonalOrder::new(sp, self.seasonal_differencing, sq, self.seasonal_period),
        )
    }
}

impl Default for SearchBounds {
    fn default() -> Self {
        Self::from_config(&AutoArimaConfig::default())
    }
}

/// One fitted candidate in the search trace
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFit {
    pub order: SarimaOrder,
    /// Criterion value, or why the fit failed
    pub outcome: std::result::Result<f64, String>,
    pub criterion: InformationCriterion,
}

impl fmt::Display for CandidateFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(value) => write!(f, " {:<40}: {}={:.3}", self.order.to_string(), self.criterion, value),
            Err(reason) => write!(f, " {:<40}: failed ({})", self.order.to_string(), reason),
        }
    }
}

/// Selected model and every candidate tried on the way
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub selected: FittedSarima,
    pub criterion: InformationCriterion,
    pub trace: Vec<CandidateFit>,
}

impl SearchOutcome {
    /// Criterion value of the selected model
    pub fn best_value(&self) -> f64 {
        self.selected.criterion(self.criterion)
    }
}

/// Strategy choosing a SARIMA order for a training series
pub trait OrderSearchStrategy: Debug + Send + Sync {
    /// Fit candidates with non-seasonal differencing `d` and return the best
    fn search(&self, train: &[f64], d: usize, bounds: &SearchBounds) -> Result<SearchOutcome>;

    /// Name of the strategy
    fn name(&self) -> &str;
}

/// Fits, caches and ranks candidates for one search
struct Evaluator<'a> {
    train: &'a [f64],
    bounds: &'a SearchBounds,
    start: usize,
    seen: HashMap<SarimaOrder, Option<f64>>,
    trace: Vec<CandidateFit>,
    best: Option<(FittedSarima, f64)>,
}

impl<'a> Evaluator<'a> {
    fn new(train: &'a [f64], bounds: &'a SearchBounds) -> Self {
        Self {
            train,
            bounds,
            start: bounds.conditioning_start(),
            seen: HashMap::new(),
            trace: Vec::new(),
            best: None,
        }
    }

    fn budget_spent(&self) -> bool {
        self.trace.len() >= self.bounds.max_fits
    }

    /// Criterion of `order`, fitting it on first sight; `None` when it failed
    fn evaluate(&mut self, order: SarimaOrder) -> Option<f64> {
        if let Some(value) = self.seen.get(&order) {
            return *value;
        }
        if self.budget_spent() {
            return None;
        }

        let criterion = self.bounds.criterion;
        let fitted = SarimaModel::new(order)
            .with_conditioning_start(self.start)
            .fit(self.train)
            .and_then(|fit| {
                let value = fit.criterion(criterion);
                if value.is_finite() {
                    Ok((fit, value))
                } else {
                    Err(ForecastError::ForecastingError(format!(
                        "non-finite {}",
                        criterion
                    )))
                }
            });

        let value = match fitted {
            Ok((fit, value)) => {
                if self.best.as_ref().map_or(true, |(_, best)| value < *best) {
                    self.best = Some((fit, value));
                }
                self.trace.push(CandidateFit {
                    order,
                    outcome: Ok(value),
                    criterion,
                });
                Some(value)
            }
            Err(err) => {
                self.trace.push(CandidateFit {
                    order,
                    outcome: Err(err.to_string()),
                    criterion,
                });
                None
            }
        };

        if let Some(entry) = self.trace.last() {
            debug!("{}", entry);
        }
        self.seen.insert(order, value);
        value
    }

    fn finish(self) -> Result<SearchOutcome> {
        match self.best {
            Some((selected, _)) => Ok(SearchOutcome {
                selected,
                criterion: self.bounds.criterion,
                trace: self.trace,
            }),
            None => Err(ForecastError::SearchExhausted {
                tried: self.trace.len(),
                len: self.train.len(),
                criterion: self.bounds.criterion.to_string(),
            }),
        }
    }
}

/// Hyndman–Khandakar stepwise search
///
/// Starts from the configured start order and three reference models, then
/// moves to any neighbouring order that improves the criterion until none does.
#[derive(Debug, Clone, Default)]
pub struct StepwiseSearch;

impl StepwiseSearch {
    pub fn new() -> Self {
        Self
    }
}

/// `(p, q, P, Q)` offsets tried around the incumbent, seasonal moves first
const NEIGHBOUR_MOVES: [(i64, i64, i64, i64); 16] = [
    (0, 0, -1, 0),
    (0, 0, 1, 0),
    (0, 0, 0, -1),
    (0, 0, 0, 1),
    (0, 0, -1, -1),
    (0, 0, -1, 1),
    (0, 0, 1, -1),
    (0, 0, 1, 1),
    (-1, 0, 0, 0),
    (1, 0, 0, 0),
    (0, -1, 0, 0),
    (0, 1, 0, 0),
    (-1, -1, 0, 0),
    (-1, 1, 0, 0),
    (1, -1, 0, 0),
    (1, 1, 0, 0),
];

fn shift(value: usize, by: i64) -> Option<usize> {
    usize::try_from(value as i64 + by).ok()
}

impl OrderSearchStrategy for StepwiseSearch {
    fn search(&self, train: &[f64], d: usize, bounds: &SearchBounds) -> Result<SearchOutcome> {
        let mut evaluator = Evaluator::new(train, bounds);

        let initial = [
            (
                bounds.start_p,
                bounds.start_q,
                bounds.start_seasonal_ar,
                bounds.start_seasonal_ma,
            ),
            (0, 0, 0, 0),
            (1, 0, 1, 0),
            (0, 1, 0, 1),
        ];
        let mut incumbent: Option<((usize, usize, usize, usize), f64)> = None;
        for (p, q, sp, sq) in initial {
            if !bounds.admits(p, q, sp, sq) {
                continue;
            }
            if let Some(value) = evaluator.evaluate(bounds.order(p, d, q, sp, sq)) {
                if incumbent.map_or(true, |(_, best)| value < best) {
                    incumbent = Some(((p, q, sp, sq), value));
                }
            }
        }

        while let Some(((p, q, sp, sq), best)) = incumbent {
            let mut moved = false;
            for (dp, dq, dsp, dsq) in NEIGHBOUR_MOVES {
                if evaluator.budget_spent() {
                    break;
                }
                let candidate = match (shift(p, dp), shift(q, dq), shift(sp, dsp), shift(sq, dsq)) {
                    (Some(p), Some(q), Some(sp), Some(sq)) if bounds.admits(p, q, sp, sq) => {
                        (p, q, sp, sq)
                    }
                    _ => continue,
                };
                let (cp, cq, csp, csq) = candidate;
                if let Some(value) = evaluator.evaluate(bounds.order(cp, d, cq, csp, csq)) {
                    if value < best {
                        incumbent = Some((candidate, value));
                        moved = true;
                        break;
                    }
                }
            }
            if !moved || evaluator.budget_spent() {
                break;
            }
        }

        let outcome = evaluator.finish()?;
        info!(
            "Stepwise search selected {} ({}={:.3}) after {} fits",
            outcome.selected.order(),
            outcome.criterion,
            outcome.best_value(),
            outcome.trace.len()
        );
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "stepwise"
    }
}

/// Exhaustive search over every admissible order, up to the fit budget
#[derive(Debug, Clone, Default)]
pub struct GridSearch;

impl GridSearch {
    pub fn new() -> Self {
        Self
    }
}

impl OrderSearchStrategy for GridSearch {
    fn search(&self, train: &[f64], d: usize, bounds: &SearchBounds) -> Result<SearchOutcome> {
        let mut evaluator = Evaluator::new(train, bounds);

        'grid: for p in 0..=bounds.max_p {
            for q in 0..=bounds.max_q {
                for sp in 0..=bounds.max_seasonal_ar {
                    for sq in 0..=bounds.max_seasonal_ma {
                        if evaluator.budget_spent() {
                            break 'grid;
                        }
                        if bounds.admits(p, q, sp, sq) {
                            evaluator.evaluate(bounds.order(p, d, q, sp, sq));
                        }
                    }
                }
            }
        }

        let outcome = evaluator.finish()?;
        info!(
            "Grid search selected {} ({}={:.3}) after {} fits",
            outcome.selected.order(),
            outcome.criterion,
            outcome.best_value(),
            outcome.trace.len()
        );
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "grid"
    }
}

/// Number of first differences needed before ADF rejects a unit root
///
/// Each pretest uses `trunc((n - 1)^(1/3))` lagged differences. A constant,
/// too-short or untestable series counts as stationary.
pub fn select_differencing(values: &[f64], max_d: usize, alpha: f64) -> usize {
    let mut d = 0;
    let mut current = values.to_vec();

    while d < max_d && current.len() >= MIN_PRETEST_LEN && !is_constant(&current) {
        let lag = ((current.len() - 1) as f64).cbrt().trunc() as usize;
        let adf = match adf_test(&current, LagSelection::Fixed(lag)) {
            Ok(adf) => adf,
            Err(err) => {
                debug!("ADF pretest at d = {} not estimable: {}", d, err);
                break;
            }
        };
        debug!(
            "ADF pretest at d = {}: statistic {:.4}, p-value {:.4}",
            d, adf.statistic, adf.p_value
        );
        if adf.is_stationary(alpha) {
            break;
        }
        d += 1;
        current = difference(&current, 1);
    }

    d
}
