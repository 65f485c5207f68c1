#![allow(dead_code)]

use chrono::NaiveDate;
use options_trader::domain::error::TraderError;
pub use options_trader::domain::ohlcv::PriceBar;
use options_trader::domain::quote::{CATEGORY_COLUMN, Cell, QuoteTable};
use options_trader::ports::option_chain_port::OptionChainPort;
use options_trader::ports::price_port::{PricePort, PriceRequest};
use std::cell::RefCell;
use std::collections::HashMap;

pub const QUOTE_COLUMNS: [&str; 8] = [
    "strike",
    "lastPrice",
    "bid",
    "ask",
    "change",
    "volume",
    "openInterest",
    "impliedVolatility",
];

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A chain of `n` calls and `n` puts with prices driven by strike.
pub fn make_chain(n: usize) -> QuoteTable {
    let side = |kind: &str, sign: f64| {
        let mut columns: Vec<String> = QUOTE_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.push("contractSymbol".to_string());
        let mut t = QuoteTable::new(columns);
        for i in 0..n {
            let strike = 80.0 + i as f64 * 2.5;
            let intrinsic = (sign * (100.0 - strike)).max(0.0);
            let last = intrinsic + 1.0 + (i % 3) as f64 * 0.1;
            t.push_row(vec![
                Cell::Number(strike),
                Cell::Number(last),
                Cell::Number(last - 0.05),
                Cell::Number(last + 0.05),
                Cell::Number(0.01 * i as f64),
                if i % 4 == 0 {
                    Cell::Missing
                } else {
                    Cell::Number(10.0 * i as f64)
                },
                Cell::Number(100.0 + i as f64),
                Cell::Number(0.2 + 0.001 * i as f64),
                Cell::Text(format!("TEST{kind}{i}")),
            ]);
        }
        t.with_constant(CATEGORY_COLUMN, Cell::from(kind))
    };
    side("call", 1.0).concat(side("put", -1.0))
}

pub fn make_bar(date_str: &str, close: f64) -> PriceBar {
    PriceBar {
        date: date(date_str),
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1_000_000.0,
    }
}

/// `n` consecutive calendar days of a gently oscillating series.
pub fn make_bars(start: &str, n: usize) -> Vec<PriceBar> {
    let start = date(start);
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1;
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close - 0.4,
                high: close + 1.2,
                low: close - 1.1,
                close,
                volume: 1_000_000.0 + (i as f64) * 1_000.0,
            }
        })
        .collect()
}

pub struct MockOptionChainPort {
    pub expirations: HashMap<String, Vec<NaiveDate>>,
    pub chains: HashMap<(String, NaiveDate), QuoteTable>,
    pub errors: HashMap<String, String>,
    pub requests: RefCell<Vec<(String, NaiveDate)>>,
}

impl MockOptionChainPort {
    pub fn new() -> Self {
        Self {
            expirations: HashMap::new(),
            chains: HashMap::new(),
            errors: HashMap::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_chain(mut self, ticker: &str, expiration: NaiveDate, chain: QuoteTable) -> Self {
        let dates = self.expirations.entry(ticker.to_string()).or_default();
        dates.push(expiration);
        dates.sort();
        self.chains.insert((ticker.to_string(), expiration), chain);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl OptionChainPort for MockOptionChainPort {
    fn expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>, TraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TraderError::provider("mock", reason.clone()));
        }
        Ok(self.expirations.get(ticker).cloned().unwrap_or_default())
    }

    fn fetch_option_chain(
        &self,
        ticker: &str,
        expiration: NaiveDate,
    ) -> Result<QuoteTable, TraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(TraderError::provider("mock", reason.clone()));
        }
        self.requests
            .borrow_mut()
            .push((ticker.to_string(), expiration));
        self.chains
            .get(&(ticker.to_string(), expiration))
            .cloned()
            .ok_or_else(|| TraderError::provider("mock", "no such chain"))
    }
}

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch_daily_bars(&self, request: &PriceRequest) -> Result<Vec<PriceBar>, TraderError> {
        if let Some(reason) = self.errors.get(&request.ticker) {
            return Err(TraderError::provider("mock", reason.clone()));
        }
        Ok(self
            .data
            .get(&request.ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= request.start_date && b.date <= request.end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
