//! Data access port trait.

use crate::domain::error::EngulfingError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` between `start_date` and `end_date` inclusive,
    /// sorted by date.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EngulfingError>;

    /// Every symbol listed on `exchange`, sorted.
    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, EngulfingError>;

    /// First date, last date and bar count for `symbol`, if it has any data.
    fn get_data_range(
        &self,
        symbol: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, EngulfingError>;
}
