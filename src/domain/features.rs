//! Feature preparation for option chains.
//!
//! Turns a raw [`QuoteTable`] into a fully numeric [`FeatureTable`]: the
//! quote fields are kept, the call/put category becomes an `is_call`
//! indicator and missing values become 0.

use super::error::TraderError;
use super::quote::{CATEGORY_COLUMN, Cell, QuoteTable};

/// Numeric quote columns carried into the feature table, in output order.
pub const NUMERIC_COLUMNS: [&str; 8] = [
    "strike",
    "lastPrice",
    "bid",
    "ask",
    "change",
    "volume",
    "openInterest",
    "impliedVolatility",
];

pub const IS_CALL_COLUMN: &str = "is_call";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRecord {
    pub strike: f64,
    pub last_price: f64,
    pub bid: f64,
    pub ask: f64,
    pub change: f64,
    pub volume: f64,
    pub open_interest: f64,
    pub implied_volatility: f64,
    pub is_call: f64,
}

impl FeatureRecord {
    /// Values in [`FeatureTable::column_names`] order.
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.strike,
            self.last_price,
            self.bid,
            self.ask,
            self.change,
            self.volume,
            self.open_interest,
            self.implied_volatility,
            self.is_call,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub records: Vec<FeatureRecord>,
}

impl FeatureTable {
    pub fn column_names() -> Vec<&'static str> {
        let mut names = NUMERIC_COLUMNS.to_vec();
        names.push(IS_CALL_COLUMN);
        names
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row-major matrix for the regressor.
    pub fn to_matrix(&self) -> Vec<Vec<f64>> {
        self.records.iter().map(FeatureRecord::to_row).collect()
    }
}

/// 1 for `"call"`, 0 for anything else.
///
/// Unrecognized or missing categories silently count as puts.
pub fn call_indicator(category: &Cell) -> f64 {
    match category.as_text() {
        Some("call") => 1.0,
        _ => 0.0,
    }
}

fn require_column(table: &QuoteTable, name: &str) -> Result<usize, TraderError> {
    table
        .column_index(name)
        .ok_or_else(|| TraderError::MissingColumn {
            column: name.to_string(),
        })
}

fn numeric_or_zero(cell: &Cell, column: &str, row: usize) -> Result<f64, TraderError> {
    match cell.as_number() {
        Ok(v) => Ok(v.unwrap_or(0.0)),
        Err(text) => Err(TraderError::fit(format!(
            "non-numeric value {text:?} in column {column} at row {row}"
        ))),
    }
}

/// Build the feature table from a raw option chain.
pub fn prepare_features(chain: &QuoteTable) -> Result<FeatureTable, TraderError> {
    let mut numeric_idx = [0usize; NUMERIC_COLUMNS.len()];
    for (slot, name) in numeric_idx.iter_mut().zip(NUMERIC_COLUMNS) {
        *slot = require_column(chain, name)?;
    }
    let category_idx = require_column(chain, CATEGORY_COLUMN)?;

    let mut records = Vec::with_capacity(chain.len());
    for (row_no, row) in chain.rows().iter().enumerate() {
        let mut values = [0.0f64; NUMERIC_COLUMNS.len()];
        for (k, &idx) in numeric_idx.iter().enumerate() {
            values[k] = numeric_or_zero(&row[idx], NUMERIC_COLUMNS[k], row_no)?;
        }

        records.push(FeatureRecord {
            strike: values[0],
            last_price: values[1],
            bid: values[2],
            ask: values[3],
            change: values[4],
            volume: values[5],
            open_interest: values[6],
            implied_volatility: values[7],
            is_call: call_indicator(&row[category_idx]),
        });
    }

    Ok(FeatureTable { records })
}

/// Extract a numeric target column. Missing targets are an error since a
/// regressor cannot train on them.
pub fn target_column(chain: &QuoteTable, name: &str) -> Result<Vec<f64>, TraderError> {
    let idx = require_column(chain, name)?;
    chain
        .rows()
        .iter()
        .enumerate()
        .map(|(row_no, row)| match row[idx].as_number() {
            Ok(Some(v)) => Ok(v),
            Ok(None) => Err(TraderError::fit(format!(
                "missing target {name} at row {row_no}"
            ))),
            Err(text) => Err(TraderError::fit(format!(
                "non-numeric target {text:?} in column {name} at row {row_no}"
            ))),
        })
        .collect()
}
