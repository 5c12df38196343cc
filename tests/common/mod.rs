#![allow(dead_code)]

use chrono::NaiveDate;
use engulfing::domain::backtest::BacktestConfig;
use engulfing::domain::error::EngulfingError;
pub use engulfing::domain::ohlcv::OhlcvBar;
use engulfing::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _exchange: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, EngulfingError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EngulfingError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self, _exchange: &str) -> Result<Vec<String>, EngulfingError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
        _exchange: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, EngulfingError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(EngulfingError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(symbol: &str, day: &str, open: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        exchange: "OSE".to_string(),
        date: date(day),
        open,
        high: open.max(close) + 1.0,
        low: open.min(close) - 1.0,
        close,
        volume: 1000,
    }
}

/// Bars from `(open, close)` pairs on consecutive days starting `start`.
pub fn make_bars(symbol: &str, start: &str, candles: &[(f64, f64)]) -> Vec<OhlcvBar> {
    let first = date(start);
    candles
        .iter()
        .enumerate()
        .map(|(i, &(open, close))| OhlcvBar {
            date: first + chrono::Duration::days(i as i64),
            ..make_bar(symbol, start, open, close)
        })
        .collect()
}

/// Bearish candle, then a bullish engulfing candle, then a bearish
/// engulfing candle, then a quiet day. Entry fires on day 3, exit on day 4.
pub fn engulfing_sequence(symbol: &str, start: &str) -> Vec<OhlcvBar> {
    make_bars(
        symbol,
        start,
        &[(10.0, 9.0), (8.5, 10.5), (11.0, 8.0), (8.0, 8.2), (8.3, 8.4)],
    )
}

/// `count` flat candles with no engulfing pattern.
pub fn quiet_bars(symbol: &str, start: &str, count: usize, price: f64) -> Vec<OhlcvBar> {
    make_bars(symbol, start, &vec![(price, price); count])
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date("2024-01-01"),
        end_date: date("2024-12-31"),
        initial_capital: 10_000.0,
        risk_free_rate: 0.0,
    }
}
