//! The forecasting pipeline: every stage run in isolation on one close series

use crate::chart::{Chart, Summary};
use crate::config::PipelineConfig;
use crate::data::{OhlcvSeries, TimeSeries};
use crate::decomposition::{seasonal_decompose, DecompositionModel, SeasonalDecomposition};
use crate::detrend::{eliminate_trend, TrendElimination};
use crate::error::{ForecastError, Result, Stage};
use crate::forecaster::{AutoArima, AutoArimaReport};
use crate::overview::{company_overview, trading_overview, CompanyOverview, TradingOverview};
use crate::search::OrderSearchStrategy;
use crate::split::{train_test_split, SplitDataset};
use crate::stationarity::{assess_stationarity, StationarityReport};
use tracing::{info, warn};

/// Runs the overview, diagnostic stages and the SARIMA forecaster
#[derive(Debug)]
pub struct ForecastPipeline {
    config: PipelineConfig,
    forecaster: AutoArima,
}

impl ForecastPipeline {
    /// Validate `config` and build the pipeline
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let forecaster = AutoArima::new(config.auto_arima.clone());
        Ok(Self { config, forecaster })
    }

    /// Replace the order search of the forecasting stage
    pub fn with_strategy(mut self, strategy: Box<dyn OrderSearchStrategy>) -> Self {
        self.forecaster = self.forecaster.with_strategy(strategy);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the trading views on `data`, then every stage on its closing prices
    pub fn run(&self, data: &OhlcvSeries) -> PipelineReport {
        let mut report = self.run_series(&data.close());
        report.symbol = data.symbol().to_string();
        report.trading = Some(contain(
            Stage::Overview,
            trading_overview(data, self.config.histogram_bins),
        ));
        report
    }

    /// Run every stage on a closing price series; the trading views need the full table
    pub fn run_series(&self, close: &TimeSeries) -> PipelineReport {
        let config = &self.config;
        info!(
            "Running forecasting pipeline on {} observations of {}",
            close.len(),
            close.name()
        );

        let report = PipelineReport {
            symbol: close.name().to_string(),
            overview: contain(
                Stage::Overview,
                company_overview(
                    close,
                    config.distribution_points,
                    config.overview_rolling_window,
                ),
            ),
            trading: None,
            stationarity: contain(
                Stage::Stationarity,
                assess_stationarity(close, config.rolling_window),
            ),
            decomposition: contain(
                Stage::Decomposition,
                seasonal_decompose(
                    close,
                    config.seasonal_period,
                    DecompositionModel::Multiplicative,
                ),
            ),
            trend_elimination: contain(
                Stage::TrendElimination,
                eliminate_trend(close, config.rolling_window),
            ),
            split: contain(
                Stage::TrainTestSplit,
                train_test_split(
                    close,
                    config.split.drop_leading,
                    config.split.train_fraction,
                    Stage::TrainTestSplit,
                ),
            ),
            auto_arima: contain(Stage::AutoArima, self.forecaster.run(close)),
        };

        info!(
            "Pipeline finished with {} failed stages",
            report.failures().len()
        );
        report
    }
}

fn contain<T>(stage: Stage, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        warn!("{} stage failed: {}", stage, err);
    }
    result
}

/// Per-stage outcomes of one pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    pub symbol: String,
    pub overview: Result<CompanyOverview>,
    /// Present when the run had the full OHLCV table
    pub trading: Option<Result<TradingOverview>>,
    pub stationarity: Result<StationarityReport>,
    pub decomposition: Result<SeasonalDecomposition>,
    pub trend_elimination: Result<TrendElimination>,
    pub split: Result<SplitDataset>,
    pub auto_arima: Result<AutoArimaReport>,
}

impl PipelineReport {
    /// Stages that failed, with their errors
    pub fn failures(&self) -> Vec<(Stage, &ForecastError)> {
        [
            (Stage::Overview, self.overview.as_ref().err()),
            (
                Stage::Overview,
                self.trading.as_ref().and_then(|t| t.as_ref().err()),
            ),
            (Stage::Stationarity, self.stationarity.as_ref().err()),
            (Stage::Decomposition, self.decomposition.as_ref().err()),
            (Stage::TrendElimination, self.trend_elimination.as_ref().err()),
            (Stage::TrainTestSplit, self.split.as_ref().err()),
            (Stage::AutoArima, self.auto_arima.as_ref().err()),
        ]
        .into_iter()
        .filter_map(|(stage, err)| err.map(|e| (stage, e)))
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }

    /// Charts of every successful stage, in stage order
    pub fn charts(&self) -> Vec<Chart> {
        let mut charts = Vec::new();
        if let Ok(overview) = &self.overview {
            charts.extend(overview.charts());
        }
        if let Some(Ok(trading)) = &self.trading {
            charts.extend(trading.charts());
        }
        if let Ok(stationarity) = &self.stationarity {
            charts.push(stationarity.chart());
        }
        if let Ok(decomposition) = &self.decomposition {
            charts.extend(decomposition.charts());
        }
        if let Ok(trend) = &self.trend_elimination {
            charts.push(trend.chart());
        }
        if let Ok(split) = &self.split {
            charts.push(split.chart());
        }
        if let Ok(arima) = &self.auto_arima {
            charts.extend(arima.charts());
        }
        charts
    }

    /// Tabular summaries of every successful stage
    pub fn summaries(&self) -> Vec<Summary> {
        let mut summaries = Vec::new();
        if let Ok(overview) = &self.overview {
            summaries.push(overview.yearly_summary());
        }
        if let Some(Ok(trading)) = &self.trading {
            summaries.push(trading.trendline_summary());
        }
        if let Ok(stationarity) = &self.stationarity {
            summaries.push(stationarity.summary());
        }
        if let Ok(arima) = &self.auto_arima {
            summaries.push(arima.diagnostics.summary());
            summaries.push(arima.accuracy.summary());
        }
        summaries
    }
}
