use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use std::fs::File;
use std::io::Write;
use stock_forecast::data::{DataLoader, OhlcvColumn, TimeSeries};
use stock_forecast::ForecastError;
use tempfile::{tempdir, NamedTempFile};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
}

#[test]
fn test_data_loader_from_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("aapl.csv");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    writeln!(file, "2023-01-04,103.0,107.0,101.0,106.0,105.5,1200").unwrap();
    writeln!(file, "2023-01-03,100.0,105.0,98.0,103.0,102.5,1000").unwrap();
    writeln!(file, "2023-01-05,106.0,110.0,104.0,108.0,107.5,1500").unwrap();
    drop(file);

    let data = DataLoader::from_csv(&path).unwrap();

    assert_eq!(data.symbol(), "AAPL");
    assert_eq!(data.len(), 3);
    // Rows come back in date order
    assert_eq!(data.dates(), vec![day(3), day(4), day(5)]);
    assert_eq!(data.close().values(), &[103.0, 106.0, 108.0]);
    assert_eq!(data.column(OhlcvColumn::AdjClose).values(), &[102.5, 105.5, 107.5]);
    assert_eq!(data.column(OhlcvColumn::Volume).values(), &[1000.0, 1200.0, 1500.0]);
}

#[test]
fn test_missing_columns_fall_back_to_close() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,price").unwrap();
    writeln!(file, "2023-01-02,100.0").unwrap();
    writeln!(file, "2023-01-03,102.0").unwrap();
    writeln!(file, "2023-01-04,101.0").unwrap();

    let data = DataLoader::from_csv_with_symbol("TEST", file.path()).unwrap();

    assert_eq!(data.symbol(), "TEST");
    let record = data.records()[1];
    assert_eq!(record.open, 102.0);
    assert_eq!(record.high, 102.0);
    assert_eq!(record.low, 102.0);
    assert_eq!(record.adj_close, 102.0);
    assert_eq!(record.volume, 0.0);
}

#[test]
fn test_dataframe_round_trip() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    writeln!(file, "2023-01-03,100.0,105.0,98.0,103.0,103.0,1000").unwrap();
    writeln!(file, "2023-01-04,103.0,107.0,101.0,106.0,106.0,1200").unwrap();

    let data = DataLoader::from_csv_with_symbol("RT", file.path()).unwrap();
    let df = data.to_dataframe().unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), OhlcvColumn::ALL.len() + 1);

    let reloaded = DataLoader::from_dataframe("RT", &df).unwrap();
    assert_eq!(reloaded, data);
}

#[test]
fn test_data_loader_error_handling() {
    assert!(matches!(
        DataLoader::from_csv("nonexistent_file.csv"),
        Err(ForecastError::IoError(_))
    ));

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "invalid,csv,format").unwrap();
    writeln!(file, "1,2,3").unwrap();
    assert!(DataLoader::from_csv(file.path()).is_err());

    let mut duplicates = NamedTempFile::new().unwrap();
    writeln!(duplicates, "date,close").unwrap();
    writeln!(duplicates, "2023-01-03,1.0").unwrap();
    writeln!(duplicates, "2023-01-03,2.0").unwrap();
    assert!(DataLoader::from_csv(duplicates.path()).is_err());
}

#[test]
fn test_time_series_operations() {
    let data = TimeSeries::new(
        "Close",
        vec![day(2), day(3), day(4), day(5)],
        vec![100.0, 103.0, 106.0, 109.0],
    )
    .unwrap();

    assert_eq!(data.len(), 4);
    assert!(!data.is_empty());

    let head = data.slice(0, Some(2)).unwrap();
    let tail = data.slice(2, None).unwrap();
    assert_eq!(head.len(), 2);
    assert_eq!(head.concat(&tail).unwrap(), data);

    let mean = data.mean().unwrap();
    assert!((mean - 104.5).abs() < 1e-12);
    assert!(data.std_dev().unwrap() > 3.0);

    assert!(data.slice(3, Some(2)).is_err());
    assert!(TimeSeries::new("bad", vec![day(2)], vec![1.0, 2.0]).is_err());
}
