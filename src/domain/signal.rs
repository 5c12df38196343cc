//! Engulfing-pattern entry/exit signals.
//!
//! A bullish engulfing bar opens below the prior bearish bar's close and
//! closes above its open; the bearish case mirrors it. Raw patterns are
//! lagged by one bar so `entry[t]` and `exit[t]` only use data up to `t - 1`.
//!
//! Missing observations never produce a pattern: every comparison that
//! touches a `None` is false.

use crate::domain::price_table::{PriceSeries, PriceTable};
use crate::domain::shift::shift_forward;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Bars the raw patterns are lagged by.
pub const SIGNAL_LAG: usize = 1;

/// Entry and exit flags for one symbol, aligned to the table index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalSeries {
    pub entry: Vec<bool>,
    pub exit: Vec<bool>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.entry.iter().filter(|&&e| e).count()
    }

    pub fn exit_count(&self) -> usize {
        self.exit.iter().filter(|&&e| e).count()
    }
}

pub type SignalTable = BTreeMap<String, SignalSeries>;

#[derive(Debug, Clone, Copy)]
struct Candle {
    open: f64,
    close: f64,
}

fn candle(open: Option<f64>, close: Option<f64>) -> Option<Candle> {
    Some(Candle {
        open: open?,
        close: close?,
    })
}

fn is_bullish_engulfing(prev: Candle, cur: Candle) -> bool {
    prev.open > prev.close && cur.open < prev.close && cur.close > prev.open
}

fn is_bearish_engulfing(prev: Candle, cur: Candle) -> bool {
    prev.close > prev.open && cur.open > prev.close && cur.close < prev.open
}

fn raw_pattern(
    open: &[Option<f64>],
    close: &[Option<f64>],
    pattern: fn(Candle, Candle) -> bool,
) -> Vec<bool> {
    debug_assert_eq!(open.len(), close.len());
    let len = open.len().min(close.len());
    let mut out = vec![false; len];
    for t in 1..len {
        if let (Some(prev), Some(cur)) = (
            candle(open[t - 1], close[t - 1]),
            candle(open[t], close[t]),
        ) {
            out[t] = pattern(prev, cur);
        }
    }
    out
}

/// Unlagged bullish engulfing: true at `t` when bar `t` engulfs a bearish bar `t - 1`.
pub fn raw_bullish_engulfing(open: &[Option<f64>], close: &[Option<f64>]) -> Vec<bool> {
    raw_pattern(open, close, is_bullish_engulfing)
}

/// Unlagged bearish engulfing: true at `t` when bar `t` engulfs a bullish bar `t - 1`.
pub fn raw_bearish_engulfing(open: &[Option<f64>], close: &[Option<f64>]) -> Vec<bool> {
    raw_pattern(open, close, is_bearish_engulfing)
}

/// Derive lagged entry/exit signals for one symbol.
pub fn derive_signals(series: &PriceSeries) -> SignalSeries {
    let bullish = raw_bullish_engulfing(&series.open, &series.close);
    let bearish = raw_bearish_engulfing(&series.open, &series.close);
    SignalSeries {
        entry: shift_forward(&bullish, SIGNAL_LAG, false),
        exit: shift_forward(&bearish, SIGNAL_LAG, false),
    }
}

/// Derive signals for every symbol in the table. Symbols are independent,
/// so they are processed in parallel; the result is keyed by symbol.
pub fn derive_all(table: &PriceTable) -> SignalTable {
    table
        .series
        .par_iter()
        .map(|(symbol, series)| (symbol.clone(), derive_signals(series)))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
