//! Aligned per-symbol price series over a shared trading-day index.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Open and close observations for one symbol, aligned to the table index.
/// `None` marks a day the symbol has no usable price (e.g. not yet listed).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    pub open: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
}

impl PriceSeries {
    /// Build a series with every position missing.
    pub fn missing(len: usize) -> Self {
        Self {
            open: vec![None; len],
            close: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Number of days with both open and close present.
    pub fn valid_count(&self) -> usize {
        self.open
            .iter()
            .zip(&self.close)
            .filter(|(o, c)| o.is_some() && c.is_some())
            .count()
    }

    pub fn first_valid_close(&self) -> Option<f64> {
        self.close.iter().flatten().next().copied()
    }

    pub fn last_valid_close(&self) -> Option<f64> {
        self.close.iter().rev().flatten().next().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceTable {
    pub dates: Vec<NaiveDate>,
    pub series: BTreeMap<String, PriceSeries>,
}

impl PriceTable {
    /// Align each symbol's bars to the union of all dates. Symbols with no
    /// bars are kept with every position missing.
    pub fn from_bars(bars_by_symbol: HashMap<String, Vec<OhlcvBar>>) -> Self {
        let dates = build_unified_timeline(bars_by_symbol.values().map(Vec::as_slice));
        let date_index: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let series = bars_by_symbol
            .into_iter()
            .map(|(symbol, bars)| {
                let mut s = PriceSeries::missing(dates.len());
                for bar in &bars {
                    let i = date_index[&bar.date];
                    s.open[i] = bar.open_value();
                    s.close[i] = bar.close_value();
                }
                (symbol, s)
            })
            .collect();

        Self { dates, series }
    }

    /// Number of trading days in the index.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn symbol_count(&self) -> usize {
        self.series.len()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }
}

/// Sorted, de-duplicated union of every bar date.
pub fn build_unified_timeline<'a>(
    bar_sets: impl IntoIterator<Item = &'a [OhlcvBar]>,
) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = bar_sets
        .into_iter()
        .flat_map(|bars| bars.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}
