//! Automatic seasonal ARIMA: order search, fit and out-of-sample forecast

use crate::chart::{Chart, Trace};
use crate::config::AutoArimaConfig;
use crate::data::TimeSeries;
use crate::diagnostics::ResidualDiagnostics;
use crate::error::{ForecastError, Result, Stage};
use crate::metrics::{forecast_accuracy, ForecastAccuracy};
use crate::models::sarima::FitSummary;
use crate::models::{SarimaOrder, TrainedForecastModel};
use crate::search::{
    select_differencing, GridSearch, OrderSearchStrategy, SearchBounds, SearchOutcome,
    StepwiseSearch,
};
use crate::split::{train_test_split, SplitDataset};
use tracing::info;

/// Lags of the residual autocorrelation tests
const DIAGNOSTIC_LAGS: usize = 10;

/// Searches, fits and forecasts a SARIMA model for a closing price series
#[derive(Debug)]
pub struct AutoArima {
    config: AutoArimaConfig,
    strategy: Box<dyn OrderSearchStrategy>,
}

impl AutoArima {
    /// Stepwise or grid search according to `config.stepwise`
    pub fn new(config: AutoArimaConfig) -> Self {
        let strategy: Box<dyn OrderSearchStrategy> = if config.stepwise {
            Box::new(StepwiseSearch::new())
        } else {
            Box::new(GridSearch::new())
        };
        Self { config, strategy }
    }

    /// Replace the order search
    pub fn with_strategy(mut self, strategy: Box<dyn OrderSearchStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &AutoArimaConfig {
        &self.config
    }

    pub fn strategy(&self) -> &dyn OrderSearchStrategy {
        self.strategy.as_ref()
    }

    /// Split `close` by position, select and fit on the prefix, forecast the suffix
    pub fn run(&self, close: &TimeSeries) -> Result<AutoArimaReport> {
        let stage = Stage::AutoArima;
        let config = &self.config;
        let min_len = config.seasonal_period * config.min_length_multiple;
        close.require_min_len(
            stage,
            min_len,
            &format!(
                "seasonal period {} times {}",
                config.seasonal_period, config.min_length_multiple
            ),
        )?;
        close.require_finite(stage)?;
        close.require_non_constant(stage)?;

        let split = train_test_split(close, 0, config.train_fraction, stage)?;
        split.train.require_non_constant(stage)?;

        let differencing = select_differencing(split.train.values(), config.max_d, config.alpha);
        info!(
            "Searching SARIMA orders for {} with d = {} using {} search on {} observations",
            close.name(),
            differencing,
            self.strategy.name(),
            split.train.len()
        );

        let bounds = SearchBounds::from_config(config);
        let needed = min_train_len(&bounds, differencing);
        if split.train.len() < needed {
            return Err(ForecastError::precondition(
                stage,
                close.len(),
                format!(
                    "training partition of {} observations is shorter than the {} needed for d = {}, D = {}, conditioning start {} and {} residual lags",
                    split.train.len(),
                    needed,
                    differencing,
                    bounds.seasonal_differencing,
                    bounds.conditioning_start(),
                    DIAGNOSTIC_LAGS
                ),
            ));
        }

        let search = self
            .strategy
            .search(split.train.values(), differencing, &bounds)?;

        let forecast = search
            .selected
            .forecast(split.test.len())?
            .with_dates(split.test.dates().to_vec())?
            .to_series("Predictions")?;
        let diagnostics = ResidualDiagnostics::compute(search.selected.residuals(), DIAGNOSTIC_LAGS)
            .map_err(|e| {
                ForecastError::precondition(stage, close.len(), format!("residual diagnostics: {}", e))
            })?;
        let accuracy = forecast_accuracy(forecast.values(), split.test.values())?;

        info!(
            "Selected {} for {}: test MAE {:.4}, RMSE {:.4}",
            search.selected.order(),
            close.name(),
            accuracy.mae,
            accuracy.rmse
        );

        Ok(AutoArimaReport {
            split,
            differencing,
            search,
            forecast,
            diagnostics,
            accuracy,
        })
    }
}

/// Training observations every candidate needs after differencing by `d`
///
/// The differenced series must cover the shared conditioning start plus
/// enough residuals for the diagnostics at `DIAGNOSTIC_LAGS`.
pub fn min_train_len(bounds: &SearchBounds, d: usize) -> usize {
    d + bounds.seasonal_differencing * bounds.seasonal_period
        + bounds.conditioning_start()
        + DIAGNOSTIC_LAGS
        + 2
}

/// Everything the automatic SARIMA stage produces
#[derive(Debug, Clone)]
pub struct AutoArimaReport {
    /// Positional split the model was trained and evaluated on
    pub split: SplitDataset,
    /// Non-seasonal differencing chosen by the pretests
    pub differencing: usize,
    pub search: SearchOutcome,
    /// Predictions aligned to the test dates
    pub forecast: TimeSeries,
    pub diagnostics: ResidualDiagnostics,
    pub accuracy: ForecastAccuracy,
}

impl AutoArimaReport {
    pub fn selected_order(&self) -> SarimaOrder {
        self.search.selected.order()
    }

    pub fn fit_summary(&self) -> FitSummary {
        self.search.selected.summary()
    }

    /// One line per candidate tried, in search order
    pub fn trace_lines(&self) -> Vec<String> {
        self.search.trace.iter().map(|c| c.to_string()).collect()
    }

    /// Fit summary followed by the residual tests
    pub fn summary_text(&self) -> String {
        format!("{}\n{}", self.fit_summary(), self.diagnostics.summary())
    }

    pub fn prediction_chart(&self) -> Chart {
        Chart::new("autoARIMA Predictions", "Date", "Closing Price")
            .with_trace(Trace::from_series("Actual Test data", &self.split.test))
            .with_trace(Trace::from_series("Predictions", &self.forecast))
    }

    pub fn charts(&self) -> Vec<Chart> {
        let mut charts = self.diagnostics.charts();
        charts.push(self.prediction_chart());
        charts
    }
}
