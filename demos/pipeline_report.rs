// Runs the forecasting pipeline on a CSV file or a synthetic series and prints its report
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stonks_rabbi::stock_forecast::synthetic::{generate_ohlcv, SyntheticConfig};
use stonks_rabbi::{DataLoader, ForecastPipeline, PipelineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Stock price analysis and SARIMA forecast report")]
struct Cli {
    /// OHLCV CSV file; a synthetic series is used when omitted
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,

    /// Ticker symbol, defaults to the CSV file stem
    #[arg(long)]
    symbol: Option<String>,

    /// TOML pipeline configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory to write every chart to as JSON
    #[arg(long, value_name = "DIR")]
    charts: Option<PathBuf>,

    /// Seed of the synthetic series
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let data = match (&cli.csv, &cli.symbol) {
        (Some(path), Some(symbol)) => DataLoader::from_csv_with_symbol(symbol, path)?,
        (Some(path), None) => DataLoader::from_csv(path)?,
        (None, symbol) => {
            let synthetic = SyntheticConfig {
                seed: cli.seed,
                ..SyntheticConfig::default()
            };
            generate_ohlcv(symbol.as_deref().unwrap_or("SYNTH"), &synthetic)?
        }
    };

    let pipeline = ForecastPipeline::new(config)?;
    let report = pipeline.run(&data);

    println!("=== {} ({} trading days) ===\n", report.symbol, data.len());
    for summary in report.summaries() {
        println!("{}\n", summary);
    }

    if let Ok(arima) = &report.auto_arima {
        println!("Order search ({} candidates):", arima.search.trace.len());
        for line in arima.trace_lines() {
            println!("{}", line);
        }
        println!("\n{}\n", arima.fit_summary());
    }

    for (stage, err) in report.failures() {
        println!("{} stage failed: {}", stage, err);
    }

    if let Some(dir) = &cli.charts {
        std::fs::create_dir_all(dir)?;
        for (i, chart) in report.charts().iter().enumerate() {
            let path = dir.join(format!("{:02}.json", i));
            std::fs::write(&path, chart.to_json()?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        println!("Charts written to {}", dir.display());
    }

    Ok(())
}
