use approx::assert_relative_eq;
use stock_forecast::metrics::forecast_accuracy;
use stock_forecast::ForecastError;

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    let accuracy = forecast_accuracy(&predicted, &actual).unwrap();

    assert_relative_eq!(accuracy.mae, 2.4);
    assert_relative_eq!(accuracy.mse, 6.0);
    assert_relative_eq!(accuracy.rmse, 6.0_f64.sqrt());
    // (20 + 10 + 10 + 7.5 + 4) / 5
    assert_relative_eq!(accuracy.mape, 10.3, epsilon = 1e-9);
    assert!(accuracy.smape > 0.0 && accuracy.smape < accuracy.mape + 1.0);
    assert_relative_eq!(accuracy.direction_accuracy, 100.0);
}

#[test]
fn test_direction_accuracy_counts_turns() {
    let actual = vec![1.0, 2.0, 1.0, 2.0];
    let predicted = vec![1.0, 2.0, 3.0, 2.0];

    let accuracy = forecast_accuracy(&predicted, &actual).unwrap();

    // Up matches, up vs down misses, down vs up misses
    assert_relative_eq!(accuracy.direction_accuracy, 100.0 / 3.0, epsilon = 1e-9);
}

#[test]
fn test_perfect_forecast() {
    let actual = vec![3.0, 0.0, 5.0];
    let accuracy = forecast_accuracy(&actual, &actual).unwrap();

    assert_eq!(accuracy.mae, 0.0);
    assert_eq!(accuracy.rmse, 0.0);
    assert_eq!(accuracy.mape, 0.0);
    assert_eq!(accuracy.smape, 0.0);
    assert_eq!(accuracy.summary().get("RMSE"), Some(0.0));
}

#[test]
fn test_error_handling() {
    let empty: Vec<f64> = vec![];
    assert!(matches!(
        forecast_accuracy(&empty, &empty),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(forecast_accuracy(&[1.0, 2.0], &[1.0]).is_err());
}
