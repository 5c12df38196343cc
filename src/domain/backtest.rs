//! Signal-driven, long-only backtest.
//!
//! Each symbol trades its own copy of the initial capital. On a day with a
//! close price a flat book buys on `entry`, a long book sells on `exit`;
//! both fill at that day's close. Symbols never share cash, so they run in
//! parallel.

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::domain::portfolio::Portfolio;
use crate::domain::price_table::{PriceSeries, PriceTable};
use crate::domain::signal::{SignalSeries, SignalTable};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub risk_free_rate: f64,
}

/// Outcome of one symbol's run.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolResult {
    pub symbol: String,
    pub portfolio: Portfolio,
    /// Last close seen, used to mark an open position.
    pub last_close: Option<f64>,
    /// Buy-and-hold return from the first to the last available close.
    pub benchmark_return: Option<f64>,
    pub entry_signals: usize,
    pub exit_signals: usize,
}

impl SymbolResult {
    pub fn open_trade_pnl(&self) -> f64 {
        match (&self.portfolio.position, self.last_close) {
            (Some(pos), Some(price)) => pos.unrealized_pnl(price),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BacktestResult {
    /// Ordered by symbol.
    pub symbols: Vec<SymbolResult>,
}

impl BacktestResult {
    pub fn get(&self, symbol: &str) -> Option<&SymbolResult> {
        self.symbols.iter().find(|r| r.symbol == symbol)
    }

    pub fn trade_count(&self) -> usize {
        self.symbols
            .iter()
            .map(|r| r.portfolio.closed_trades.len())
            .sum()
    }
}

/// Buy-and-hold return over the symbol's listed period.
pub fn benchmark_return(series: &PriceSeries) -> Option<f64> {
    let first = series.first_valid_close()?;
    let last = series.last_valid_close()?;
    (first > 0.0).then(|| (last - first) / first)
}

pub fn run_symbol(
    symbol: &str,
    dates: &[NaiveDate],
    series: &PriceSeries,
    signals: &SignalSeries,
    initial_capital: f64,
) -> SymbolResult {
    let mut portfolio = Portfolio::new(initial_capital);
    let mut last_close = None;

    for (t, &date) in dates.iter().enumerate() {
        if let Some(price) = series.close.get(t).copied().flatten() {
            last_close = Some(price);
            let entry = signals.entry.get(t).copied().unwrap_or(false);
            let exit = signals.exit.get(t).copied().unwrap_or(false);
            if portfolio.is_flat() {
                if entry {
                    portfolio.enter_long(symbol, price, date);
                }
            } else if exit {
                portfolio.exit_long(price, date);
            }
        }
        let equity = portfolio.total_equity(last_close);
        portfolio.record_equity(date, equity);
    }

    SymbolResult {
        symbol: symbol.to_string(),
        portfolio,
        last_close,
        benchmark_return: benchmark_return(series),
        entry_signals: signals.entry_count(),
        exit_signals: signals.exit_count(),
    }
}

/// Run every symbol in `table`. A symbol missing from `signals` never trades.
pub fn run_backtest(
    table: &PriceTable,
    signals: &SignalTable,
    config: &BacktestConfig,
) -> BacktestResult {
    let no_signals = SignalSeries::default();
    let mut symbols: Vec<SymbolResult> = table
        .series
        .par_iter()
        .map(|(symbol, series)| {
            let sig = signals.get(symbol).unwrap_or(&no_signals);
            run_symbol(symbol, &table.dates, series, sig, config.initial_capital)
        })
        .collect();
    symbols.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    BacktestResult { symbols }
}
