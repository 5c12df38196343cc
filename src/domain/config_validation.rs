//! Configuration validation.
//!
//! Validates every config field before a run starts.

use crate::domain::error::EngulfingError;
use crate::domain::universe::{SymbolFilter, parse_symbols};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

/// Recognised values of `[data] source`.
pub const DATA_SOURCES: &[&str] = &["csv_dir", "table"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    validate_data_config(config)?;
    validate_backtest_config(config)?;
    validate_universe_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    validate_source(config)?;
    validate_path(config)?;
    validate_exchange(config)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_universe_config(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    if let Some(symbols) = config.get_string("universe", "symbols") {
        if !symbols.trim().is_empty() {
            parse_symbols(&symbols)?;
        }
    }
    if let Some(exclude) = config.get_string("universe", "exclude") {
        SymbolFilter::new(&[exclude.trim()])?;
    }
    if config.get_int("universe", "min_bars", 0) < 0 {
        return Err(invalid("universe", "min_bars", "min_bars must be non-negative"));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> EngulfingError {
    EngulfingError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> EngulfingError {
    EngulfingError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv_dir".to_string());
    if !DATA_SOURCES.contains(&source.trim()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown source {source:?}, expected one of {DATA_SOURCES:?}"),
        ));
    }
    Ok(())
}

fn validate_path(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(missing("data", "path")),
    }
}

fn validate_exchange(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    match config.get_string("data", "exchange") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(missing("data", "exchange")),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), EngulfingError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub(crate) fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, EngulfingError> {
    match value {
        None => Err(missing("backtest", field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}
