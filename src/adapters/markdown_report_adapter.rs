//! Markdown report adapter implementing ReportPort.

use std::fs;
use std::path::Path;

use crate::domain::error::EngulfingError;
use crate::domain::metrics::AggregateMetrics;
use crate::domain::summary::RunSummary;
use crate::domain::universe::SkipReason;
use crate::ports::report_port::ReportPort;

pub struct MarkdownReportAdapter;

fn pct(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}%", value * 100.0)
    } else {
        "n/a".to_string()
    }
}

fn opt_pct(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| "n/a".to_string())
}

fn num(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.2}")
    }
}

fn opt_num(value: Option<f64>) -> String {
    value.map(num).unwrap_or_else(|| "n/a".to_string())
}

fn push_row(md: &mut String, label: &str, value: String) {
    md.push_str(&format!("| {label} | {value} |\n"));
}

fn aggregate_table(md: &mut String, m: &AggregateMetrics) {
    md.push_str("| Statistic | Mean |\n");
    md.push_str("| --- | ---: |\n");
    push_row(md, "Start Value", num(m.start_value));
    push_row(md, "End Value", num(m.end_value));
    push_row(md, "Total Return", pct(m.total_return));
    push_row(md, "Benchmark Return", opt_pct(m.benchmark_return));
    push_row(md, "Max Drawdown", pct(m.max_drawdown));
    push_row(md, "Max Drawdown Duration (bars)", num(m.max_drawdown_duration));
    push_row(md, "Total Trades", num(m.total_trades));
    push_row(md, "Closed Trades", num(m.closed_trades));
    push_row(md, "Open Trades", num(m.open_trades));
    push_row(md, "Open Trade PnL", num(m.open_trade_pnl));
    push_row(md, "Win Rate", opt_pct(m.win_rate));
    push_row(md, "Best Trade", opt_pct(m.best_trade));
    push_row(md, "Worst Trade", opt_pct(m.worst_trade));
    push_row(md, "Avg Winning Trade", opt_pct(m.avg_winning_trade));
    push_row(md, "Avg Losing Trade", opt_pct(m.avg_losing_trade));
    push_row(md, "Profit Factor", opt_num(m.profit_factor));
    push_row(md, "Expectancy", opt_num(m.expectancy));
    push_row(md, "Avg Trade Duration (days)", opt_num(m.avg_trade_duration));
    push_row(md, "Sharpe Ratio", num(m.sharpe_ratio));
    push_row(md, "Sortino Ratio", num(m.sortino_ratio));
}

/// Render the full report as Markdown.
pub fn render(summary: &RunSummary) -> String {
    let mut md = String::with_capacity(4096);

    md.push_str("# Engulfing Pattern Backtest\n\n");

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    push_row(&mut md, "Exchange", summary.exchange.clone());
    push_row(
        &mut md,
        "Period",
        format!("{} to {}", summary.start_date, summary.end_date),
    );
    push_row(
        &mut md,
        "Initial Capital (per symbol)",
        format!("{:.0}", summary.initial_capital),
    );
    push_row(&mut md, "Symbols", summary.per_symbol.len().to_string());
    push_row(&mut md, "Entry Signals", summary.entry_signals().to_string());
    push_row(&mut md, "Exit Signals", summary.exit_signals().to_string());
    md.push('\n');

    if !summary.excluded.is_empty() || !summary.skipped.is_empty() {
        md.push_str("## Excluded Symbols\n\n");
        for symbol in &summary.excluded {
            md.push_str(&format!("- {symbol}: non-equity\n"));
        }
        for skip in &summary.skipped {
            let reason = match skip.reason {
                SkipReason::NoData => "no data".to_string(),
                SkipReason::InsufficientBars { bars } => format!("only {bars} bars"),
            };
            md.push_str(&format!("- {}: {reason}\n", skip.symbol));
        }
        md.push('\n');
    }

    md.push_str("## Aggregate Statistics\n\n");
    aggregate_table(&mut md, &summary.aggregate);
    md.push('\n');

    md.push_str("## Per-Symbol Results\n\n");
    md.push_str(
        "| Symbol | Total Return | Benchmark | Max Drawdown | Trades | Win Rate | Profit Factor | Sharpe |\n",
    );
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for s in summary.ranked() {
        let m = &s.metrics;
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            s.symbol,
            pct(m.total_return),
            opt_pct(m.benchmark_return),
            pct(m.max_drawdown),
            m.total_trades,
            opt_pct(m.win_rate),
            opt_num(m.profit_factor),
            num(m.sharpe_ratio),
        ));
    }
    md.push('\n');

    md
}

impl ReportPort for MarkdownReportAdapter {
    fn write(&self, summary: &RunSummary, output_path: &Path) -> Result<(), EngulfingError> {
        let report_err = |e: std::io::Error| EngulfingError::Report {
            reason: format!("failed to write {}: {e}", output_path.display()),
        };
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(report_err)?;
        }
        fs::write(output_path, render(summary)).map_err(report_err)
    }
}
