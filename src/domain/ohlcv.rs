//! Daily price bars and their next-day-close labels.

use chrono::NaiveDate;

/// Predictor columns of a labeled bar, in [`LabeledBar::features`] order.
pub const BAR_FEATURES: [&str; 5] = ["open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A bar paired with the close of the following trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBar {
    pub bar: PriceBar,
    pub close_next: f64,
}

impl LabeledBar {
    pub fn features(&self) -> Vec<f64> {
        vec![
            self.bar.open,
            self.bar.high,
            self.bar.low,
            self.bar.close,
            self.bar.volume,
        ]
    }
}

/// Sort bars by date and label each with its successor's close.
///
/// The last bar has no successor and is dropped, so `n` bars yield `n - 1`
/// labeled bars (none for `n <= 1`).
pub fn label_next_close(mut bars: Vec<PriceBar>) -> Vec<LabeledBar> {
    bars.sort_by_key(|b| b.date);
    let closes: Vec<f64> = bars.iter().skip(1).map(|b| b.close).collect();
    bars.into_iter()
        .zip(closes)
        .map(|(bar, close_next)| LabeledBar { bar, close_next })
        .collect()
}

/// Split labeled bars into a predictor matrix and the `close_next` target.
pub fn to_training_set(labeled: &[LabeledBar]) -> (Vec<Vec<f64>>, Vec<f64>) {
    labeled
        .iter()
        .map(|l| (l.features(), l.close_next))
        .unzip()
}
