//! Daily equity price source port trait.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRequest {
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub trait PricePort {
    /// Daily bars in `[start_date, end_date]`. Order is not guaranteed.
    fn fetch_daily_bars(&self, request: &PriceRequest) -> Result<Vec<PriceBar>, TraderError>;
}
