use chrono::NaiveDate;
use stock_forecast::forecaster::{min_train_len, AutoArima};
use stock_forecast::models::sarima::SarimaModel;
use stock_forecast::models::{ModelOrder, SarimaOrder, SeasonalOrder, TrainedForecastModel};
use stock_forecast::search::{
    select_differencing, GridSearch, OrderSearchStrategy, SearchBounds, StepwiseSearch,
};
use stock_forecast::synthetic::{business_days, generate_close, SyntheticConfig};
use stock_forecast::{AutoArimaConfig, ForecastError, Stage, TimeSeries};

fn scenario() -> (SyntheticConfig, TimeSeries) {
    let config = SyntheticConfig::default();
    let close = generate_close(&config).unwrap();
    (config, close)
}

#[test]
fn test_auto_arima_on_trend_plus_weekly_season() {
    let (synthetic, close) = scenario();
    let report = AutoArima::new(AutoArimaConfig::default()).run(&close).unwrap();

    assert_eq!(report.split.train.len(), 280);
    assert_eq!(report.split.test.len(), 120);
    assert_eq!(report.differencing, 1);

    let order = report.selected_order();
    assert_eq!(order.order.d, 1);
    assert_eq!(order.seasonal.period, 7);

    assert_eq!(report.forecast.len(), 120);
    assert_eq!(report.forecast.dates(), report.split.test.dates());
    assert!(report.forecast.values().iter().all(|v| v.is_finite()));

    let tolerance = 3.0 * synthetic.noise_std;
    let within = report
        .forecast
        .values()
        .iter()
        .zip(280..400)
        .filter(|(f, t)| (**f - synthetic.signal(*t)).abs() <= tolerance)
        .count();
    assert!(within >= 108, "only {} of 120 predictions within 3 sigma of the signal", within);

    assert!(!report.search.trace.is_empty());
    assert!(report.search.trace.len() <= 100);
    assert!(report.trace_lines().iter().all(|line| line.contains("ARIMA(")));

    let chart = report.prediction_chart();
    assert_eq!(chart.title, "autoARIMA Predictions");
    assert_eq!(chart.trace("Actual Test data").unwrap().len(), 120);
    assert_eq!(chart.trace("Predictions").unwrap().len(), 120);

    let text = report.summary_text();
    assert!(text.contains("SARIMA Results"));
    assert!(text.contains("sigma2"));
    assert!(text.contains("Ljung-Box (L10) (Q)"));
    assert_eq!(report.charts().len(), 5);
}

#[test]
fn test_auto_arima_requires_three_seasons() {
    let config = SyntheticConfig {
        length: 20,
        ..SyntheticConfig::default()
    };
    let close = generate_close(&config).unwrap();

    match AutoArima::new(AutoArimaConfig::default()).run(&close) {
        Err(ForecastError::Precondition { stage, len, .. }) => {
            assert_eq!(stage, Stage::AutoArima);
            assert_eq!(len, 20);
        }
        other => panic!("Expected a precondition failure, got {:?}", other.map(|r| r.selected_order())),
    }
}

#[test]
fn test_selected_fit_reports_coefficient_significance() {
    let (_, close) = scenario();
    let report = AutoArima::new(AutoArimaConfig::default()).run(&close).unwrap();
    let fitted = &report.search.selected;

    let arma: Vec<_> = fitted
        .coefficients()
        .iter()
        .filter(|c| c.name != "intercept" && c.name != "sigma2")
        .collect();
    assert!(!arma.is_empty());
    let non_seasonal = arma.iter().filter(|c| !c.name.contains(".S.") && c.value.abs() < 0.99);
    for coefficient in non_seasonal {
        assert!(
            coefficient.std_error.is_finite() && coefficient.std_error > 0.0,
            "{} has std error {}",
            coefficient.name,
            coefficient.std_error
        );
        assert!((0.0..=1.0).contains(&coefficient.p_value), "{}", coefficient.name);
    }
    assert!(fitted.summary().to_string().contains("P>|z|"));
}

#[test]
fn test_short_series_fail_with_attributed_precondition() {
    for length in 21..=45 {
        let config = SyntheticConfig {
            length,
            ..SyntheticConfig::default()
        };
        let close = generate_close(&config).unwrap();

        match AutoArima::new(AutoArimaConfig::default()).run(&close) {
            Ok(report) => assert_eq!(report.forecast.len(), report.split.test.len()),
            Err(ForecastError::Precondition { stage, len, .. }) => {
                assert_eq!(stage, Stage::AutoArima);
                assert_eq!(len, length);
            }
            Err(other) => panic!("length {} failed without a stage precondition: {}", length, other),
        }
    }
}

#[test]
fn test_minimum_training_length_covers_diagnostics() {
    let bounds = SearchBounds::default();
    assert_eq!(bounds.conditioning_start(), 17);
    assert_eq!(min_train_len(&bounds, 0), 29);
    assert_eq!(min_train_len(&bounds, 1), 30);
}

#[test]
fn test_auto_arima_rejects_constant_series() {
    let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
    let close = TimeSeries::new("Close", business_days(start, 60), vec![50.0; 60]).unwrap();
    let err = AutoArima::new(AutoArimaConfig::default()).run(&close).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::AutoArima));
}

#[test]
fn test_differencing_selection() {
    let (_, close) = scenario();
    assert_eq!(select_differencing(close.values(), 5, 0.05), 1);

    let noise = generate_close(&SyntheticConfig {
        slope: 0.0,
        amplitude: 0.0,
        ..SyntheticConfig::default()
    })
    .unwrap();
    assert_eq!(select_differencing(noise.values(), 5, 0.05), 0);

    // Constant input is treated as stationary
    assert_eq!(select_differencing(&[3.0; 40], 5, 0.05), 0);
    // The cap applies even when the test keeps rejecting stationarity
    assert_eq!(select_differencing(close.values(), 0, 0.05), 0);
}

#[test]
fn test_grid_and_stepwise_agree_on_small_bounds() {
    let (_, close) = scenario();
    let train = &close.values()[..280];
    let bounds = SearchBounds {
        max_p: 1,
        max_q: 1,
        max_seasonal_ar: 1,
        max_seasonal_ma: 1,
        max_order: 4,
        ..SearchBounds::default()
    };

    let grid = GridSearch::new().search(train, 1, &bounds).unwrap();
    let stepwise = StepwiseSearch::new().search(train, 1, &bounds).unwrap();

    // Grid search sees every admissible order, so nothing beats it
    assert_eq!(grid.trace.len(), 16);
    assert!(grid.best_value() <= stepwise.best_value() + 1e-9);
    assert!(stepwise.trace.len() <= grid.trace.len());
    assert_eq!(grid.selected.conditioning_start(), bounds.conditioning_start());
}

#[test]
fn test_candidates_share_conditioning_start() {
    let (_, close) = scenario();
    let train = &close.values()[..280];
    let bounds = SearchBounds::default();

    let small = bounds.order(0, 1, 0, 0, 1);
    let large = bounds.order(2, 1, 1, 2, 0);
    let fit_small = SarimaModel::new(small)
        .with_conditioning_start(bounds.conditioning_start())
        .fit(train)
        .unwrap();
    let fit_large = SarimaModel::new(large)
        .with_conditioning_start(bounds.conditioning_start())
        .fit(train)
        .unwrap();

    assert_eq!(fit_small.nobs(), fit_large.nobs());
    assert_eq!(fit_small.residuals().len(), fit_large.residuals().len());
}

#[test]
fn test_explicit_order_forecast_length() {
    let (_, close) = scenario();
    let order = SarimaOrder::new(ModelOrder::new(1, 1, 0), SeasonalOrder::new(1, 0, 0, 7));
    let fitted = SarimaModel::new(order).fit(close.values()).unwrap();
    let forecast = fitted.forecast(14).unwrap();

    assert_eq!(forecast.horizons(), 14);
    assert_eq!(forecast.values().len(), 14);
    assert!(fitted.aic().is_finite());
    assert!(fitted.coefficient("ar.S.L7").is_some());
    assert!(fitted.coefficient("intercept").is_some());
}
