//! Core domain types and logic.

pub mod ohlcv;
pub mod shift;
pub mod price_table;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod backtest;
pub mod metrics;
pub mod summary;
pub mod universe;
pub mod config_validation;
pub mod error;
