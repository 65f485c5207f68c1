//! Parameters of the two training runs.

use super::model::ModelConfig;
use super::split::SplitPolicy;
use super::training::{CHRONOLOGICAL_80_20, SHUFFLED_80_20};
use chrono::NaiveDate;

pub const DEFAULT_OPTIONS_TICKER: &str = "AAPL";
pub const DEFAULT_EQUITY_TICKER: &str = "TSLA";

/// Option chain run: predict each contract's last price.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsRunConfig {
    pub ticker: String,
    /// None selects the nearest listed expiration.
    pub expiration: Option<NaiveDate>,
    pub model: ModelConfig,
    pub split: SplitPolicy,
}

impl Default for OptionsRunConfig {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_OPTIONS_TICKER.to_string(),
            expiration: None,
            model: ModelConfig::default(),
            split: SHUFFLED_80_20,
        }
    }
}

/// Equity run: predict the next day's close from daily bars.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityRunConfig {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub model: ModelConfig,
    pub split: SplitPolicy,
}

impl EquityRunConfig {
    pub fn default_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
    }

    pub fn default_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default()
    }
}

impl Default for EquityRunConfig {
    fn default() -> Self {
        Self {
            ticker: DEFAULT_EQUITY_TICKER.to_string(),
            start_date: Self::default_start(),
            end_date: Self::default_end(),
            model: ModelConfig::equity(),
            split: CHRONOLOGICAL_80_20,
        }
    }
}
