use chrono::NaiveDate;
use stock_forecast::synthetic::{business_days, generate_close, generate_ohlcv, SyntheticConfig};
use stock_forecast::{
    AutoArimaConfig, ForecastError, ForecastPipeline, OhlcvRecord, OhlcvSeries, PipelineConfig,
    Stage,
};

/// Small search budget so the full pipeline stays quick
fn test_config() -> PipelineConfig {
    PipelineConfig {
        auto_arima: AutoArimaConfig {
            max_p: 1,
            max_q: 1,
            max_seasonal_ar: 1,
            max_seasonal_ma: 1,
            max_fits: 10,
            ..AutoArimaConfig::default()
        },
        ..PipelineConfig::default()
    }
}

fn ohlcv(symbol: &str, closes: &[f64]) -> OhlcvSeries {
    let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    let records = business_days(start, closes.len())
        .into_iter()
        .zip(closes)
        .map(|(date, &close)| OhlcvRecord {
            date,
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume: 0.0,
        })
        .collect();
    OhlcvSeries::new(symbol, records).unwrap()
}

#[test]
fn test_pipeline_runs_every_stage() {
    let data = generate_ohlcv("SYN", &SyntheticConfig::default()).unwrap();
    let pipeline = ForecastPipeline::new(test_config()).unwrap();
    let report = pipeline.run(&data);

    assert_eq!(report.symbol, "SYN");
    assert!(report.is_complete(), "failures: {:?}", report.failures());

    let split = report.split.as_ref().unwrap();
    assert_eq!(split.train.len(), 357);
    assert_eq!(split.test.len(), 40);

    let titles: Vec<String> = report.charts().into_iter().map(|c| c.title).collect();
    assert!(titles.contains(&"Stock Closing Price".to_string()));
    assert!(titles.contains(&"Rolling Mean and Standard Deviation".to_string()));
    assert!(titles.contains(&"Seasonality Component".to_string()));
    assert!(titles.contains(&"Moving Average".to_string()));
    assert!(titles.contains(&"Train Test Split".to_string()));
    assert!(titles.contains(&"autoARIMA Predictions".to_string()));
    assert!(titles.contains(&"Volume of Stocks Traded over Time".to_string()));
    assert!(titles.contains(&"Closing Price vs Volume Traded".to_string()));
    assert!(matches!(report.trading, Some(Ok(_))));
    assert_eq!(report.summaries().len(), 5);
}

#[test]
fn test_close_only_run_skips_trading_views() {
    let close = generate_close(&SyntheticConfig::default()).unwrap();
    let report = ForecastPipeline::new(test_config()).unwrap().run_series(&close);

    assert!(report.trading.is_none());
    assert!(report.is_complete(), "failures: {:?}", report.failures());
    assert_eq!(report.summaries().len(), 4);
}

#[test]
fn test_pipeline_is_idempotent() {
    let data = generate_ohlcv("SYN", &SyntheticConfig::default()).unwrap();
    let pipeline = ForecastPipeline::new(test_config()).unwrap();

    let first = pipeline.run(&data);
    let second = pipeline.run(&data);

    assert_eq!(first.charts(), second.charts());
    assert_eq!(first.summaries(), second.summaries());
}

#[test]
fn test_failing_stage_does_not_block_others() {
    // A zero close breaks the log and multiplicative stages only
    let synthetic = SyntheticConfig {
        length: 120,
        ..SyntheticConfig::default()
    };
    let mut closes = generate_close(&synthetic).unwrap().values().to_vec();
    closes[40] = 0.0;
    let data = ohlcv("ZERO", &closes);

    let report = ForecastPipeline::new(test_config()).unwrap().run(&data);

    let failed: Vec<Stage> = report.failures().into_iter().map(|(stage, _)| stage).collect();
    assert_eq!(failed, vec![Stage::Decomposition, Stage::TrendElimination]);
    assert!(report.overview.is_ok());
    assert!(report.stationarity.is_ok());
    assert!(report.split.is_ok());
    assert!(report.auto_arima.is_ok());
}

#[test]
fn test_short_series_fails_with_preconditions() {
    let data = ohlcv("TINY", &[10.0, 11.0, 10.5, 12.0, 11.5]);
    let report = ForecastPipeline::new(test_config()).unwrap().run(&data);

    assert!(report.overview.is_ok());
    assert!(report.split.is_ok());
    for stage in [Stage::Stationarity, Stage::Decomposition, Stage::AutoArima] {
        let (_, err) = report
            .failures()
            .into_iter()
            .find(|(s, _)| *s == stage)
            .unwrap_or_else(|| panic!("{} should fail", stage));
        assert!(
            matches!(err, ForecastError::Precondition { len: 5, .. }),
            "{}: {}",
            stage,
            err
        );
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = PipelineConfig {
        rolling_window: 1,
        ..PipelineConfig::default()
    };
    assert!(matches!(
        ForecastPipeline::new(config),
        Err(ForecastError::ConfigError(_))
    ));
}
