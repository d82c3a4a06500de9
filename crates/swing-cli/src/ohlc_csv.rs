use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use swing_core::{OhlcBar, OhlcSource, SwingError};

/// Reads `<ticker>.csv` (columns `date,open,high,low,close`, header row
/// required) out of a directory — the minimal file-based adapter needed to
/// drive the engine end-to-end. Real market-data acquisition is out of
/// scope (spec §1 Non-goals); grounded in `portfolio-manager`'s
/// `parse_csv_trades` for the `csv` crate usage pattern.
pub struct CsvOhlcSource {
    dir: PathBuf,
}

impl CsvOhlcSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl OhlcSource for CsvOhlcSource {
    async fn load(&self, ticker: &str, as_of: NaiveDate) -> Result<Vec<OhlcBar>, SwingError> {
        let path = self.dir.join(format!("{ticker}.csv"));
        let data = std::fs::read_to_string(&path).map_err(|e| {
            SwingError::InsufficientData(format!("reading {}: {e}", path.display()))
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let mut bars = Vec::new();
        for result in reader.records() {
            let record = result
                .map_err(|e| SwingError::InsufficientData(format!("parsing {ticker}.csv: {e}")))?;
            let date_str = record.get(0).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|e| SwingError::InsufficientData(format!("bad date {date_str}: {e}")))?;
            if date > as_of {
                continue;
            }
            let open: f64 = record.get(1).unwrap_or("0").trim().parse().unwrap_or(0.0);
            let high: f64 = record.get(2).unwrap_or("0").trim().parse().unwrap_or(0.0);
            let low: f64 = record.get(3).unwrap_or("0").trim().parse().unwrap_or(0.0);
            let close: f64 = record.get(4).unwrap_or("0").trim().parse().unwrap_or(0.0);
            bars.push(OhlcBar {
                date,
                open,
                high,
                low,
                close,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}
