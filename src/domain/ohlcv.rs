//! Daily OHLCV bar.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub symbol: String,
    pub exchange: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// Open as an observation: `None` when the source carried a non-finite value.
    pub fn open_value(&self) -> Option<f64> {
        self.open.is_finite().then_some(self.open)
    }

    /// Close as an observation: `None` when the source carried a non-finite value.
    pub fn close_value(&self) -> Option<f64> {
        self.close.is_finite().then_some(self.close)
    }

    /// Both open and close are present.
    pub fn is_observed(&self) -> bool {
        self.open_value().is_some() && self.close_value().is_some()
    }
}
