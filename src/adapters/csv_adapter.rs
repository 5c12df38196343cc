//! Per-symbol CSV file data adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>_<EXCHANGE>.csv`, with the columns
//! `date,open,high,low,close,volume`.

use crate::domain::error::EngulfingError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Price cell values meaning "not listed that day".
const MISSING_MARKERS: &[&str] = &["", "nan", "null"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, exchange: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}_{exchange}.csv"))
    }

    fn read_all(&self, symbol: &str, exchange: &str) -> Result<Vec<OhlcvBar>, EngulfingError> {
        let path = self.csv_path(symbol, exchange);
        let content = fs::read_to_string(&path).map_err(|e| {
            EngulfingError::data_source(format!("failed to read {}: {e}", path.display()))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let record =
                result.map_err(|e| EngulfingError::data_source(format!("CSV parse error: {e}")))?;
            let field = |i: usize, name: &'static str| {
                record.get(i).ok_or_else(|| {
                    EngulfingError::data_source(format!("row {}: missing {name} column", row + 1))
                })
            };

            let bar = OhlcvBar {
                symbol: symbol.to_string(),
                exchange: exchange.to_string(),
                date: parse_date(field(0, "date")?)?,
                open: price_or_nan(field(1, "open")?, "open")?,
                high: price_or_nan(field(2, "high")?, "high")?,
                low: price_or_nan(field(3, "low")?, "low")?,
                close: price_or_nan(field(4, "close")?, "close")?,
                volume: parse_volume(record.get(5).unwrap_or(""))?,
            };
            if !bar.is_observed() {
                debug!(%symbol, date = %bar.date, "row without open/close kept as missing");
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate, EngulfingError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| EngulfingError::data_source(format!("invalid date {value:?}: {e}")))
}

/// `Ok(None)` for a missing-value marker.
pub(crate) fn parse_price(value: &str, name: &str) -> Result<Option<f64>, EngulfingError> {
    let trimmed = value.trim();
    if MISSING_MARKERS
        .iter()
        .any(|m| trimmed.eq_ignore_ascii_case(m))
    {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|e| EngulfingError::data_source(format!("invalid {name} value {value:?}: {e}")))
}

/// A missing-value marker becomes NaN, so the day stays in the index
/// without an observation.
pub(crate) fn price_or_nan(value: &str, name: &str) -> Result<f64, EngulfingError> {
    Ok(parse_price(value, name)?.unwrap_or(f64::NAN))
}

/// Empty volume reads as zero. Fractional volumes are truncated.
pub(crate) fn parse_volume(value: &str) -> Result<i64, EngulfingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .or_else(|_| trimmed.parse::<f64>().map(|v| v as i64))
        .map_err(|e| EngulfingError::data_source(format!("invalid volume value {value:?}: {e}")))
}

pub(crate) fn in_window(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    date >= start && date <= end
}

/// First and last observed date plus the number of observed bars.
pub(crate) fn data_range(bars: &[OhlcvBar]) -> Option<(NaiveDate, NaiveDate, usize)> {
    let observed = || bars.iter().filter(|b| b.is_observed()).map(|b| b.date);
    let first = observed().min()?;
    let last = observed().max()?;
    Some((first, last, observed().count()))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EngulfingError> {
        let mut bars = self.read_all(symbol, exchange)?;
        bars.retain(|b| in_window(b.date, start_date, end_date));
        Ok(bars)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, EngulfingError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            EngulfingError::data_source(format!(
                "failed to read directory {}: {e}",
                self.base_path.display()
            ))
        })?;

        let suffix = format!("_{exchange}.csv");
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry
                .map_err(|e| EngulfingError::data_source(format!("directory entry error: {e}")))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(symbol) = name.strip_suffix(&suffix) {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, EngulfingError> {
        if !self.csv_path(symbol, exchange).exists() {
            return Ok(None);
        }
        Ok(data_range(&self.read_all(symbol, exchange)?))
    }
}
