use std::io;
use stock_forecast::{ForecastError, Stage};

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    let math_error = series_math::MathError::InsufficientData("empty".to_string());
    assert!(matches!(
        ForecastError::from(math_error),
        ForecastError::MathError(_)
    ));

    let toml_error = toml::from_str::<toml::Table>("= broken").unwrap_err();
    assert!(matches!(
        ForecastError::from(toml_error),
        ForecastError::ConfigError(_)
    ));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("alpha must be between 0 and 1".to_string());
    assert!(error.to_string().contains("alpha must be between 0 and 1"));

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let error_string = ForecastError::from(io_error).to_string();
    assert!(error_string.contains("IO error"));
    assert!(error_string.contains("permission denied"));
}

#[test]
fn test_precondition_names_stage_and_length() {
    let error = ForecastError::precondition(Stage::Decomposition, 12, "period 30 requires at least 60 observations");

    assert_eq!(error.stage(), Some(Stage::Decomposition));
    let message = error.to_string();
    assert!(message.contains("seasonal decomposition"));
    assert!(message.contains("12"));
    assert!(message.contains("at least 60"));
}

#[test]
fn test_search_exhausted_reports_attempts() {
    let error = ForecastError::SearchExhausted {
        tried: 4,
        len: 6,
        criterion: "AIC".to_string(),
    };

    assert_eq!(error.stage(), Some(Stage::AutoArima));
    let message = error.to_string();
    assert!(message.contains("4 candidate orders"));
    assert!(message.contains("6 observations"));
    assert!(message.contains("AIC"));

    assert_eq!(ForecastError::DataError("x".to_string()).stage(), None);
}
