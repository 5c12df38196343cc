//! Everything a report needs about one completed run.

use chrono::NaiveDate;

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::metrics::{AggregateMetrics, SymbolMetrics};
use crate::domain::position::ClosedTrade;
use crate::domain::universe::SkippedSymbol;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub exchange: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    /// Symbols dropped by the exclusion filter.
    pub excluded: Vec<String>,
    /// Symbols dropped for missing or short data.
    pub skipped: Vec<SkippedSymbol>,
    pub aggregate: AggregateMetrics,
    /// Ordered by symbol.
    pub per_symbol: Vec<SymbolMetrics>,
    pub result: BacktestResult,
}

impl RunSummary {
    pub fn build(
        config: &BacktestConfig,
        exchange: &str,
        excluded: Vec<String>,
        skipped: Vec<SkippedSymbol>,
        result: BacktestResult,
    ) -> Self {
        let per_symbol = SymbolMetrics::compute_per_symbol(&result, config.risk_free_rate);
        let aggregate = AggregateMetrics::mean(&per_symbol);
        Self {
            exchange: exchange.to_string(),
            start_date: config.start_date,
            end_date: config.end_date,
            initial_capital: config.initial_capital,
            excluded,
            skipped,
            aggregate,
            per_symbol,
            result,
        }
    }

    /// Per-symbol metrics, best total return first. Ties keep symbol order.
    pub fn ranked(&self) -> Vec<&SymbolMetrics> {
        let mut ranked: Vec<&SymbolMetrics> = self.per_symbol.iter().collect();
        ranked.sort_by(|a, b| b.metrics.total_return.total_cmp(&a.metrics.total_return));
        ranked
    }

    /// Closed trades across all symbols, ordered by symbol then exit date.
    pub fn closed_trades(&self) -> impl Iterator<Item = &ClosedTrade> {
        self.result
            .symbols
            .iter()
            .flat_map(|r| r.portfolio.closed_trades.iter())
    }

    pub fn entry_signals(&self) -> usize {
        self.result.symbols.iter().map(|r| r.entry_signals).sum()
    }

    pub fn exit_signals(&self) -> usize {
        self.result.symbols.iter().map(|r| r.exit_signals).sum()
    }
}
