//! Long-format CSV table covering a whole exchange.
//!
//! Columns `date,symbol,open,high,low,close,volume` in any order, plus an
//! optional `exchange` column. The file is read once at construction.

use crate::adapters::csv_adapter::{data_range, in_window, parse_date, parse_volume, price_or_nan};
use crate::domain::error::EngulfingError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const REQUIRED_COLUMNS: &[&str] = &["date", "symbol", "open", "high", "low", "close", "volume"];

struct Columns {
    date: usize,
    symbol: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    exchange: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, EngulfingError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|&&c| find(c).is_none()) {
            return Err(EngulfingError::data_source(format!(
                "table is missing the {missing} column"
            )));
        }
        let col = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            date: col("date"),
            symbol: col("symbol"),
            open: col("open"),
            high: col("high"),
            low: col("low"),
            close: col("close"),
            volume: col("volume"),
            exchange: find("exchange"),
        })
    }
}

pub struct TableCsvAdapter {
    /// Bars per symbol, sorted by date. `exchange` is empty when the table
    /// has no exchange column.
    bars: BTreeMap<String, Vec<OhlcvBar>>,
}

impl TableCsvAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngulfingError> {
        let path = path.as_ref();
        let rdr = csv::Reader::from_path(path).map_err(|e| {
            EngulfingError::data_source(format!("failed to read {}: {e}", path.display()))
        })?;
        let adapter = Self::from_reader(rdr)?;
        info!(
            path = %path.display(),
            symbols = adapter.bars.len(),
            "loaded price table"
        );
        Ok(adapter)
    }

    pub fn from_string(content: &str) -> Result<Self, EngulfingError> {
        Self::from_reader(csv::Reader::from_reader(content.as_bytes()))
    }

    fn from_reader<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Self, EngulfingError> {
        let headers = rdr
            .headers()
            .map_err(|e| EngulfingError::data_source(format!("CSV header error: {e}")))?
            .clone();
        let cols = Columns::from_headers(&headers)?;
        let mut bars: BTreeMap<String, Vec<OhlcvBar>> = BTreeMap::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| EngulfingError::data_source(format!("CSV parse error: {e}")))?;
            let get = |i: usize| record.get(i).unwrap_or("");

            let symbol = get(cols.symbol).trim().to_uppercase();
            if symbol.is_empty() {
                return Err(EngulfingError::data_source("row with empty symbol"));
            }
            let bar = OhlcvBar {
                exchange: cols.exchange.map(|i| get(i).trim().to_string()).unwrap_or_default(),
                date: parse_date(get(cols.date))?,
                open: price_or_nan(get(cols.open), "open")?,
                high: price_or_nan(get(cols.high), "high")?,
                low: price_or_nan(get(cols.low), "low")?,
                close: price_or_nan(get(cols.close), "close")?,
                volume: parse_volume(get(cols.volume))?,
                symbol,
            };
            if !bar.is_observed() {
                debug!(
                    symbol = %bar.symbol,
                    date = %bar.date,
                    "row without open/close kept as missing"
                );
            }
            bars.entry(bar.symbol.clone()).or_default().push(bar);
        }

        for series in bars.values_mut() {
            series.sort_by_key(|b| b.date);
        }
        Ok(Self { bars })
    }

    fn bars_on<'a>(
        &'a self,
        symbol: &str,
        exchange: &'a str,
    ) -> impl Iterator<Item = &'a OhlcvBar> + 'a {
        self.bars
            .get(symbol)
            .into_iter()
            .flatten()
            .filter(move |b| b.exchange.is_empty() || b.exchange.eq_ignore_ascii_case(exchange))
    }
}

impl DataPort for TableCsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EngulfingError> {
        if !self.bars.contains_key(symbol) {
            return Err(EngulfingError::NoData {
                symbol: symbol.to_string(),
                exchange: exchange.to_string(),
            });
        }
        Ok(self
            .bars_on(symbol, exchange)
            .filter(|b| in_window(b.date, start_date, end_date))
            .map(|b| OhlcvBar {
                exchange: exchange.to_string(),
                ..b.clone()
            })
            .collect())
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, EngulfingError> {
        Ok(self
            .bars
            .keys()
            .filter(|s| self.bars_on(s, exchange).next().is_some())
            .cloned()
            .collect())
    }

    fn get_data_range(
        &self,
        symbol: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, EngulfingError> {
        let bars: Vec<OhlcvBar> = self.bars_on(symbol, exchange).cloned().collect();
        Ok(data_range(&bars))
    }
}
