//! Performance statistics, per symbol and averaged across symbols.

use super::backtest::{BacktestResult, SymbolResult};
use super::portfolio::EquityPoint;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Statistics for one symbol's run.
///
/// Trade statistics that need at least one closed trade are `None` when
/// there is none. Trade returns are fractions of the entry price, so
/// `avg_losing_trade` is negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub start_value: f64,
    pub end_value: f64,
    pub total_return: f64,
    pub benchmark_return: Option<f64>,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub total_trades: usize,
    pub closed_trades: usize,
    pub open_trades: usize,
    pub open_trade_pnl: f64,
    pub win_rate: Option<f64>,
    pub best_trade: Option<f64>,
    pub worst_trade: Option<f64>,
    pub avg_winning_trade: Option<f64>,
    pub avg_losing_trade: Option<f64>,
    pub profit_factor: Option<f64>,
    pub expectancy: Option<f64>,
    pub avg_trade_duration: Option<f64>,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
}

impl Metrics {
    pub fn compute(result: &SymbolResult, risk_free_rate: f64) -> Self {
        let portfolio = &result.portfolio;
        let trades = &portfolio.closed_trades;
        let start_value = portfolio.initial_capital;
        let end_value = portfolio.final_equity();

        let total_return = if start_value > 0.0 {
            (end_value - start_value) / start_value
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&portfolio.equity_curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let (sharpe_ratio, sortino_ratio) =
            compute_risk_adjusted(&portfolio.equity_curve, daily_rf);

        let closed_trades = trades.len();
        let open_trades = usize::from(portfolio.position.is_some());

        let returns: Vec<f64> = trades.iter().map(|t| t.return_pct).collect();
        let wins: Vec<f64> = returns.iter().copied().filter(|&r| r > 0.0).collect();
        let losses: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();

        let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
        let gross_loss: f64 = trades
            .iter()
            .filter(|t| t.pnl < 0.0)
            .map(|t| t.pnl.abs())
            .sum();

        let has_trades = closed_trades > 0;

        let win_rate = has_trades.then(|| wins.len() as f64 / closed_trades as f64);

        let profit_factor = has_trades.then(|| {
            if gross_loss > 0.0 {
                gross_profit / gross_loss
            } else if gross_profit > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        });

        let expectancy =
            has_trades.then(|| trades.iter().map(|t| t.pnl).sum::<f64>() / closed_trades as f64);

        let avg_trade_duration = has_trades.then(|| {
            trades.iter().map(|t| t.duration_days()).sum::<i64>() as f64 / closed_trades as f64
        });

        Metrics {
            start_value,
            end_value,
            total_return,
            benchmark_return: result.benchmark_return,
            max_drawdown,
            max_drawdown_duration,
            total_trades: closed_trades + open_trades,
            closed_trades,
            open_trades,
            open_trade_pnl: result.open_trade_pnl(),
            win_rate,
            best_trade: returns.iter().copied().reduce(f64::max),
            worst_trade: returns.iter().copied().reduce(f64::min),
            avg_winning_trade: mean(&wins),
            avg_losing_trade: mean(&losses),
            profit_factor,
            expectancy,
            avg_trade_duration,
            sharpe_ratio,
            sortino_ratio,
        }
    }
}

/// A symbol paired with its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMetrics {
    pub symbol: String,
    pub metrics: Metrics,
}

impl SymbolMetrics {
    pub fn compute_per_symbol(result: &BacktestResult, risk_free_rate: f64) -> Vec<Self> {
        result
            .symbols
            .iter()
            .map(|r| SymbolMetrics {
                symbol: r.symbol.clone(),
                metrics: Metrics::compute(r, risk_free_rate),
            })
            .collect()
    }
}

/// Each statistic averaged across symbols. Undefined (`None`) and
/// non-finite values are left out of a statistic's mean; a statistic with
/// no defined value on any symbol stays `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateMetrics {
    pub symbol_count: usize,
    pub start_value: f64,
    pub end_value: f64,
    pub total_return: f64,
    pub benchmark_return: Option<f64>,
    pub max_drawdown: f64,
    pub max_drawdown_duration: f64,
    pub total_trades: f64,
    pub closed_trades: f64,
    pub open_trades: f64,
    pub open_trade_pnl: f64,
    pub win_rate: Option<f64>,
    pub best_trade: Option<f64>,
    pub worst_trade: Option<f64>,
    pub avg_winning_trade: Option<f64>,
    pub avg_losing_trade: Option<f64>,
    pub profit_factor: Option<f64>,
    pub expectancy: Option<f64>,
    pub avg_trade_duration: Option<f64>,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
}

impl AggregateMetrics {
    pub fn mean(per_symbol: &[SymbolMetrics]) -> Self {
        let all = |f: fn(&Metrics) -> f64| -> f64 {
            let values: Vec<f64> = per_symbol.iter().map(|s| f(&s.metrics)).collect();
            mean(&values).unwrap_or(0.0)
        };
        let defined = |f: fn(&Metrics) -> Option<f64>| -> Option<f64> {
            let values: Vec<f64> = per_symbol.iter().filter_map(|s| f(&s.metrics)).collect();
            mean(&values)
        };

        AggregateMetrics {
            symbol_count: per_symbol.len(),
            start_value: all(|m| m.start_value),
            end_value: all(|m| m.end_value),
            total_return: all(|m| m.total_return),
            benchmark_return: defined(|m| m.benchmark_return),
            max_drawdown: all(|m| m.max_drawdown),
            max_drawdown_duration: all(|m| m.max_drawdown_duration as f64),
            total_trades: all(|m| m.total_trades as f64),
            closed_trades: all(|m| m.closed_trades as f64),
            open_trades: all(|m| m.open_trades as f64),
            open_trade_pnl: all(|m| m.open_trade_pnl),
            win_rate: defined(|m| m.win_rate),
            best_trade: defined(|m| m.best_trade),
            worst_trade: defined(|m| m.worst_trade),
            avg_winning_trade: defined(|m| m.avg_winning_trade),
            avg_losing_trade: defined(|m| m.avg_losing_trade),
            profit_factor: defined(|m| m.profit_factor),
            expectancy: defined(|m| m.expectancy),
            avg_trade_duration: defined(|m| m.avg_trade_duration),
            sharpe_ratio: all(|m| m.sharpe_ratio),
            sortino_ratio: all(|m| m.sortino_ratio),
        }
    }
}

/// Mean of the finite values, `None` when there are none.
fn mean(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        None
    } else {
        Some(finite.iter().sum::<f64>() / finite.len() as f64)
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    if equity_curve.is_empty() {
        return (0.0, 0);
    }

    let mut peak = equity_curve[0].equity;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_dd_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            max_dd = max_dd.max(dd);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> (f64, f64) {
    if equity_curve.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            let curr = w[1].equity;
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    let excess_return = mean - daily_rf;

    let sharpe = if stddev > 0.0 {
        (excess_return / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum();
    let downside_stddev = (downside_sq / n).sqrt();

    let sortino = if downside_stddev > 0.0 {
        (excess_return / downside_stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    (sharpe, sortino)
}
