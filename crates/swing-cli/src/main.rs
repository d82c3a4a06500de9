//! swing-cli: runs the Swingmaster evaluator over one or more tickers for a
//! date range and prints a plain-text report per ticker.
//!
//! Usage:
//!   swing-cli --tickers AAPL MSFT --from 2024-01-01 --to 2024-06-01
//!   swing-cli --tickers AAPL --from 2024-01-01 --to 2024-06-01 --ohlc-dir ./data --db swingmaster.db
//!   swing-cli --tickers AAPL --from 2024-01-01 --to 2024-06-01 --config swing.toml --dry-run

mod config;
mod ohlc_csv;
mod report;

use std::sync::Arc;

use chrono::NaiveDate;
use config::CliConfig;
use ohlc_csv::CsvOhlcSource;
use sqlx::any::AnyPoolOptions;
use swing_core::RunRow;
use swing_engine::Evaluator;
use swing_signals::{ProviderConfig, SignalProvider};

const DEFAULT_DB_PATH: &str = "swingmaster.db";
const DEFAULT_OHLC_DIR: &str = "./data";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_SIGNAL_VERSION: &str = "v3";
const DEFAULT_POLICY_VERSION: &str = "v3";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "swing_cli=info,swing_engine=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let dry_run = args.iter().any(|a| a == "--dry-run");

    let tickers: Vec<String> = match args.iter().position(|a| a == "--tickers") {
        Some(idx) => args[idx + 1..]
            .iter()
            .take_while(|a| !a.starts_with("--"))
            .cloned()
            .collect(),
        None => {
            eprintln!("Usage:");
            eprintln!("  swing-cli --tickers AAPL MSFT --from 2024-01-01 --to 2024-06-01");
            eprintln!("");
            eprintln!("Options:");
            eprintln!("  --ohlc-dir DIR     directory of <ticker>.csv files (default: {DEFAULT_OHLC_DIR})");
            eprintln!("  --db PATH          SQLite DB path (default: {DEFAULT_DB_PATH})");
            eprintln!("  --config PATH      optional TOML config (ticker->market routing)");
            eprintln!("  --signal-version V default: {DEFAULT_SIGNAL_VERSION}");
            eprintln!("  --policy-version V default: {DEFAULT_POLICY_VERSION}");
            eprintln!("  --dry-run          evaluate and print the report, skip rc_run bookkeeping");
            std::process::exit(1);
        }
    };

    let from: NaiveDate = args
        .iter()
        .position(|a| a == "--from")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        .ok_or_else(|| anyhow::anyhow!("--from YYYY-MM-DD is required"))?;
    let to: NaiveDate = args
        .iter()
        .position(|a| a == "--to")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        .ok_or_else(|| anyhow::anyhow!("--to YYYY-MM-DD is required"))?;

    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());
    let cli_config = CliConfig::load(config_path)?;

    let db_path = args
        .iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.to_string())
        .or_else(|| cli_config.db_path.clone())
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
    let ohlc_dir = args
        .iter()
        .position(|a| a == "--ohlc-dir")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.to_string())
        .or_else(|| cli_config.ohlc_dir.clone())
        .unwrap_or_else(|| DEFAULT_OHLC_DIR.to_string());

    let signal_version = args
        .iter()
        .position(|a| a == "--signal-version")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_SIGNAL_VERSION);
    let policy_version = args
        .iter()
        .position(|a| a == "--policy-version")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_POLICY_VERSION);

    swing_engine::check_version_compatibility(signal_version, policy_version)?;

    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&format!("sqlite:{db_path}?mode=rwc"))
        .await?;
    swing_storage::ensure_schema(&pool).await?;

    let run_id = format!("run-{}", chrono::Utc::now().format("%Y%m%dT%H%M%S%.f"));
    if !dry_run {
        swing_storage::run_store::insert_run(
            &pool,
            &RunRow {
                run_id: run_id.clone(),
                created_at: chrono::Utc::now(),
                engine_version: ENGINE_VERSION.to_string(),
                policy_id: "swingmaster".to_string(),
                policy_version: policy_version.to_string(),
            },
        )
        .await?;
    }

    let source = Arc::new(CsvOhlcSource::new(ohlc_dir.clone()));
    let evaluator = Evaluator::new(
        pool.clone(),
        source.clone(),
        SignalProvider::new(ProviderConfig::default()),
        cli_config.to_scoring_config(),
        run_id,
    );

    let total = tickers.len();
    for (i, ticker) in tickers.iter().enumerate() {
        tracing::info!("[{}/{}] evaluating {}", i + 1, total, ticker);
        match evaluate_ticker(&evaluator, &source, ticker, from, to).await {
            Ok(()) => {}
            Err(e) => {
                tracing::warn!("{} failed: {}", ticker, e);
                continue;
            }
        }

        let report = report::render_report(&pool, ticker, to).await?;
        println!("{report}");
    }

    Ok(())
}

async fn evaluate_ticker(
    evaluator: &Evaluator,
    source: &CsvOhlcSource,
    ticker: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<()> {
    use swing_core::OhlcSource;

    let bars = source.load(ticker, to).await?;
    let dates: Vec<NaiveDate> = bars
        .iter()
        .map(|b| b.date)
        .filter(|d| *d >= from && *d <= to)
        .collect();
    if dates.is_empty() {
        anyhow::bail!("no OHLC rows for {ticker} in [{from}, {to}]");
    }
    evaluator.evaluate_range(ticker, &dates).await?;
    Ok(())
}
