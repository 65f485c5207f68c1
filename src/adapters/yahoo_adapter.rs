//! Yahoo Finance option-chain adapter.
//!
//! Uses the unofficial `v7/finance/options` endpoint, which needs a session
//! cookie and a matching crumb on every request. Contracts come back as
//! loosely typed JSON objects; every field is kept as a column of the quote
//! table and calls are stacked above puts.

use crate::domain::error::TraderError;
use crate::domain::quote::{CATEGORY_COLUMN, Cell, QuoteTable};
use crate::ports::option_chain_port::OptionChainPort;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::cell::OnceCell;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com/v7/finance";
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const PROVIDER: &str = "yahoo";

#[derive(Debug, Deserialize)]
struct OptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionChainEnvelope,
}

#[derive(Debug, Deserialize)]
struct OptionChainEnvelope {
    #[serde(default)]
    result: Vec<ChainResult>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChainResult {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    #[serde(default)]
    options: Vec<ChainOptions>,
}

#[derive(Debug, Deserialize)]
struct ChainOptions {
    #[serde(default)]
    calls: Vec<Map<String, Value>>,
    #[serde(default)]
    puts: Vec<Map<String, Value>>,
}

/// Expirations and the calls+puts table from one options response body.
pub fn parse_options_response(body: &str) -> Result<(Vec<NaiveDate>, QuoteTable), TraderError> {
    let response: OptionsResponse = serde_json::from_str(body)
        .map_err(|e| TraderError::provider(PROVIDER, format!("failed to parse options: {}", e)))?;

    if let Some(err) = response.option_chain.error.filter(|e| !e.is_null()) {
        return Err(TraderError::provider(PROVIDER, err.to_string()));
    }

    let result = response
        .option_chain
        .result
        .into_iter()
        .next()
        .ok_or_else(|| TraderError::provider(PROVIDER, "no options data returned"))?;

    let expirations: Vec<NaiveDate> = result
        .expiration_dates
        .iter()
        .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
        .collect();

    let (calls, puts) = result
        .options
        .into_iter()
        .next()
        .map(|o| (o.calls, o.puts))
        .unwrap_or_default();

    let table = contracts_to_table(calls)
        .with_constant(CATEGORY_COLUMN, Cell::from("call"))
        .concat(contracts_to_table(puts).with_constant(CATEGORY_COLUMN, Cell::from("put")));

    Ok((expirations, table))
}

fn contracts_to_table(contracts: Vec<Map<String, Value>>) -> QuoteTable {
    let mut table = QuoteTable::default();
    for contract in contracts {
        table.push_named(
            contract
                .into_iter()
                .map(|(k, v)| (k, json_cell(v)))
                .collect(),
        );
    }
    table
}

fn json_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Missing,
        Value::Bool(b) => Cell::Bool(b),
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Missing),
        Value::String(s) => Cell::Text(s),
        other => Cell::Text(other.to_string()),
    }
}

/// Path and query for one options request. `expiration` selects a chain;
/// without it Yahoo returns the nearest one plus the expiration list.
pub fn options_url(
    base_url: &str,
    ticker: &str,
    expiration: Option<NaiveDate>,
    crumb: &str,
) -> Result<reqwest::Url, TraderError> {
    let mut params = Vec::with_capacity(2);
    if let Some(date) = expiration {
        // Expirations are keyed by midnight UTC.
        let ts = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TraderError::provider(PROVIDER, "invalid expiration"))?
            .and_utc()
            .timestamp();
        params.push(("date", ts.to_string()));
    }
    params.push(("crumb", crumb.to_string()));

    let base = format!("{}/options/{}", base_url.trim_end_matches('/'), ticker);
    reqwest::Url::parse_with_params(&base, &params)
        .map_err(|e| TraderError::provider(PROVIDER, format!("invalid url {}: {}", base, e)))
}

/// Yahoo only answers options requests that carry a session cookie and the
/// crumb issued for it. Both are fetched once, on first use.
pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
    cookie_url: String,
    crumb_url: String,
    crumb: OnceCell<String>,
}

impl YahooAdapter {
    pub fn new(base_url: &str) -> Result<Self, TraderError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .cookie_store(true)
            .build()
            .map_err(|e| TraderError::provider(PROVIDER, format!("failed to build client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            crumb_url: DEFAULT_CRUMB_URL.to_string(),
            crumb: OnceCell::new(),
        })
    }

    pub fn with_session_urls(mut self, cookie_url: &str, crumb_url: &str) -> Self {
        self.cookie_url = cookie_url.to_string();
        self.crumb_url = crumb_url.to_string();
        self
    }

    fn crumb(&self) -> Result<&str, TraderError> {
        if let Some(crumb) = self.crumb.get() {
            return Ok(crumb.as_str());
        }

        // The cookie endpoint answers 404 but still sets the session cookie.
        self.client
            .get(&self.cookie_url)
            .send()
            .map_err(|e| TraderError::provider(PROVIDER, format!("session cookie: {}", e)))?;

        let crumb = self.get(&self.crumb_url)?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') || crumb.contains(' ') {
            return Err(TraderError::provider(PROVIDER, "no crumb returned"));
        }
        Ok(self.crumb.get_or_init(|| crumb).as_str())
    }

    fn get(&self, url: impl reqwest::IntoUrl) -> Result<String, TraderError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TraderError::provider(PROVIDER, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TraderError::provider(PROVIDER, format!("HTTP {}", status)));
        }
        response
            .text()
            .map_err(|e| TraderError::provider(PROVIDER, e.to_string()))
    }
}

impl OptionChainPort for YahooAdapter {
    fn expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>, TraderError> {
        let url = options_url(&self.base_url, ticker, None, self.crumb()?)?;
        let body = self.get(url)?;
        parse_options_response(&body).map(|(expirations, _)| expirations)
    }

    fn fetch_option_chain(
        &self,
        ticker: &str,
        expiration: NaiveDate,
    ) -> Result<QuoteTable, TraderError> {
        let url = options_url(&self.base_url, ticker, Some(expiration), self.crumb()?)?;
        let body = self.get(url)?;
        parse_options_response(&body).map(|(_, table)| table)
    }
}
