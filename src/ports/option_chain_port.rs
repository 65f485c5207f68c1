//! Option chain source port trait.

use crate::domain::error::TraderError;
use crate::domain::quote::QuoteTable;
use chrono::NaiveDate;

pub trait OptionChainPort {
    /// Listed expirations for `ticker`, nearest first.
    fn expirations(&self, ticker: &str) -> Result<Vec<NaiveDate>, TraderError>;

    /// Calls followed by puts for one expiration, tagged in the
    /// `option_type` column.
    fn fetch_option_chain(
        &self,
        ticker: &str,
        expiration: NaiveDate,
    ) -> Result<QuoteTable, TraderError>;
}
