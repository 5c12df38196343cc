//! Report generation port trait.

use crate::domain::error::EngulfingError;
use crate::domain::summary::RunSummary;
use std::path::Path;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, summary: &RunSummary, output_path: &Path) -> Result<(), EngulfingError>;
}
