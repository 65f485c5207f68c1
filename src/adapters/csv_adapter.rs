//! CSV parsing and local-file data adapter.
//!
//! `parse_price_csv` turns provider text into price bars and is shared with
//! the QuantConnect adapter. `CsvAdapter` serves both ports from a directory
//! of files for offline runs:
//!
//! - `{TICKER}.csv`: daily bars with a `time` or `date` column
//! - `{TICKER}_{YYYY-MM-DD}.csv`: an option chain for one expiration

use crate::domain::error::TraderError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::quote::{Cell, QuoteTable};
use crate::ports::option_chain_port::OptionChainPort;
use crate::ports::price_port::{PricePort, PriceRequest};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y%m%d %H:%M:%S",
    "%Y%m%d %H:%M",
];

/// Parse the date part of a provider timestamp. `None` when no known shape
/// matches.
pub fn parse_bar_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        })
}

fn header_index(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

/// Parse delimited daily bars. Rows with an unparseable date or price are
/// skipped; a missing required header is an error.
pub fn parse_price_csv(text: &str, provider: &str) -> Result<Vec<PriceBar>, TraderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| TraderError::provider(provider, format!("CSV parse error: {}", e)))?
        .clone();

    let column = |names: &[&str]| {
        header_index(&headers, names).ok_or_else(|| {
            TraderError::provider(provider, format!("missing {} column", names[0]))
        })
    };
    let date_idx = column(&["time", "date"])?;
    let open_idx = column(&["open"])?;
    let high_idx = column(&["high"])?;
    let low_idx = column(&["low"])?;
    let close_idx = column(&["close"])?;
    let volume_idx = column(&["volume"])?;

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result
            .map_err(|e| TraderError::provider(provider, format!("CSV parse error: {}", e)))?;

        let Some(date) = record.get(date_idx).and_then(parse_bar_date) else {
            continue;
        };
        let number = |idx: usize| {
            record
                .get(idx)
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            number(open_idx),
            number(high_idx),
            number(low_idx),
            number(close_idx),
            number(volume_idx),
        ) else {
            continue;
        };

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(bars)
}

/// Parse a delimited option chain into a quote table, keeping every column.
pub fn parse_quote_csv(text: &str, provider: &str) -> Result<QuoteTable, TraderError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| TraderError::provider(provider, format!("CSV parse error: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = QuoteTable::new(headers);
    for result in rdr.records() {
        let record = result
            .map_err(|e| TraderError::provider(provider, format!("CSV parse error: {}", e)))?;
        table.push_row(record.iter().map(Cell::parse).collect());
    }
    Ok(table)
}

fn with_path(err: std::io::Error, path: &Path) -> std::io::Error {
    std::io::Error::new(err.kind(), format!("{}: {}", path.display(), err))
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn price_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn chain_path(&self, ticker: &str, expiration: NaiveDate) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", ticker, expiration.format("%Y-%m-%d")))
    }

    fn read(&self, path: &Path) -> Result<String, TraderError> {
        fs::read_to_string(path).map_err(|e| with_path(e, path).into())
    }
}

impl PricePort for CsvAdapter {
    fn fetch_daily_bars(&self, request: &PriceRequest) -> Result<Vec<PriceBar>, TraderError> {
        let content = self.read(&self.price_path(&request.ticker))?;
        let mut bars = parse_price_csv(&content, "csv")?;
        bars.retain(|b| b.date >= request.start_date && b.date <= request.end_date);
        Ok(bars)
    }
}

impl OptionChainPort for CsvAdapter {
    fn expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>, TraderError> {
        let entries =
            fs::read_dir(&self.base_path).map_err(|e| with_path(e, &self.base_path))?;

        let prefix = format!("{}_", ticker);
        let mut dates = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(rest) = name_str
                .strip_prefix(&prefix)
                .and_then(|r| r.strip_suffix(".csv"))
            {
                if let Ok(date) = NaiveDate::parse_from_str(rest, "%Y-%m-%d") {
                    dates.push(date);
                }
            }
        }

        dates.sort();
        Ok(dates)
    }

    fn fetch_option_chain(
        &self,
        ticker: &str,
        expiration: NaiveDate,
    ) -> Result<QuoteTable, TraderError> {
        let content = self.read(&self.chain_path(ticker, expiration))?;
        parse_quote_csv(&content, "csv")
    }
}
