//! Closed-trade CSV export implementing ReportPort.
//!
//! One row per closed trade, ordered by symbol then exit date. Positions
//! still open at the end of the run are not exported.

use std::fs;
use std::path::Path;

use crate::domain::error::EngulfingError;
use crate::domain::summary::RunSummary;
use crate::ports::report_port::ReportPort;

pub struct TradeCsvAdapter;

fn report_err(path: &Path, e: impl std::fmt::Display) -> EngulfingError {
    EngulfingError::Report {
        reason: format!("failed to write trades to {}: {e}", path.display()),
    }
}

impl ReportPort for TradeCsvAdapter {
    fn write(&self, summary: &RunSummary, output_path: &Path) -> Result<(), EngulfingError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| report_err(output_path, e))?;
        }
        let mut wtr = csv::Writer::from_path(output_path).map_err(|e| report_err(output_path, e))?;
        for trade in summary.closed_trades() {
            wtr.serialize(trade).map_err(|e| report_err(output_path, e))?;
        }
        wtr.flush().map_err(|e| report_err(output_path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{BacktestConfig, BacktestResult, run_symbol};
    use crate::domain::price_table::PriceSeries;
    use crate::domain::signal::SignalSeries;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn writes_header_and_one_row_per_trade() {
        let dates = [date(1), date(2), date(3), date(4)];
        let closes = [10.0, 12.0, 11.0, 13.0];
        let series = PriceSeries {
            open: closes.iter().map(|&v| Some(v)).collect(),
            close: closes.iter().map(|&v| Some(v)).collect(),
        };
        let signals = SignalSeries {
            entry: vec![true, false, true, false],
            exit: vec![false, true, false, false],
        };
        let config = BacktestConfig {
            start_date: date(1),
            end_date: date(4),
            initial_capital: 1000.0,
            risk_free_rate: 0.0,
        };
        let result = BacktestResult {
            symbols: vec![run_symbol("EQNR", &dates, &series, &signals, 1000.0)],
        };
        let summary = RunSummary::build(&config, "OSE", vec![], vec![], result);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.csv");
        TradeCsvAdapter.write(&summary, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("symbol,quantity,entry_price,exit_price,entry_date,exit_date"));
        assert!(lines[1].starts_with("EQNR,100.0,10.0,12.0,2024-05-01,2024-05-02,200.0"));
    }

    #[test]
    fn unwritable_path_is_report_error() {
        let dir = TempDir::new().unwrap();
        let config = BacktestConfig {
            start_date: date(1),
            end_date: date(2),
            initial_capital: 1.0,
            risk_free_rate: 0.0,
        };
        let summary =
            RunSummary::build(&config, "OSE", vec![], vec![], BacktestResult::default());
        let err = TradeCsvAdapter.write(&summary, dir.path()).unwrap_err();
        assert!(matches!(err, EngulfingError::Report { .. }));
    }

    #[test]
    fn blocked_parent_directory_is_report_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let config = BacktestConfig {
            start_date: date(1),
            end_date: date(2),
            initial_capital: 1.0,
            risk_free_rate: 0.0,
        };
        let summary =
            RunSummary::build(&config, "OSE", vec![], vec![], BacktestResult::default());

        let err = TradeCsvAdapter
            .write(&summary, &blocker.join("out").join("trades.csv"))
            .unwrap_err();
        assert!(matches!(err, EngulfingError::Report { .. }));
    }
}
