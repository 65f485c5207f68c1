//! QuantConnect daily equity data adapter.

use crate::adapters::csv_adapter::parse_price_csv;
use crate::domain::credentials::QcCredentials;
use crate::domain::error::TraderError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::price_port::{PricePort, PriceRequest};
use chrono::NaiveDate;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.quantconnect.com/api/v2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const PROVIDER: &str = "quantconnect";

pub struct QuantConnectAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
    credentials: QcCredentials,
}

impl QuantConnectAdapter {
    pub fn new(
        base_url: &str,
        credentials: QcCredentials,
        timeout: Duration,
    ) -> Result<Self, TraderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TraderError::provider(PROVIDER, format!("failed to build client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn data_url(&self) -> String {
        format!("{}/data/read", self.base_url)
    }
}

fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Query parameters for a daily, adjusted US equity read.
pub fn query_params(request: &PriceRequest) -> Vec<(&'static str, String)> {
    vec![
        ("type", "Equity".to_string()),
        ("ticker", request.ticker.clone()),
        ("market", "USA".to_string()),
        ("resolution", "Daily".to_string()),
        ("start", compact_date(request.start_date)),
        ("end", compact_date(request.end_date)),
        ("dataNormalizationMode", "Adjusted".to_string()),
    ]
}

impl PricePort for QuantConnectAdapter {
    fn fetch_daily_bars(&self, request: &PriceRequest) -> Result<Vec<PriceBar>, TraderError> {
        let response = self
            .client
            .get(self.data_url())
            .query(&query_params(request))
            .basic_auth(&self.credentials.user_id, Some(&self.credentials.api_token))
            .send()
            .map_err(|e| TraderError::provider(PROVIDER, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TraderError::provider(PROVIDER, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .map_err(|e| TraderError::provider(PROVIDER, e.to_string()))?;
        parse_price_csv(&body, PROVIDER)
    }
}
