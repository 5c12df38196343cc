//! Domain error types.

/// Top-level error type for engulfing.
#[derive(Debug, thiserror::Error)]
pub enum EngulfingError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol} on {exchange}")]
    NoData { symbol: String, exchange: String },

    #[error("insufficient data for {symbol} on {exchange}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        exchange: String,
        bars: usize,
        minimum: usize,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngulfingError {
    pub(crate) fn data_source(reason: impl Into<String>) -> Self {
        EngulfingError::DataSource {
            reason: reason.into(),
        }
    }
}

impl From<&EngulfingError> for std::process::ExitCode {
    fn from(err: &EngulfingError) -> Self {
        let code: u8 = match err {
            EngulfingError::Io(_) => 1,
            EngulfingError::ConfigParse { .. }
            | EngulfingError::ConfigMissing { .. }
            | EngulfingError::ConfigInvalid { .. } => 2,
            EngulfingError::DataSource { .. } => 3,
            EngulfingError::Report { .. } => 4,
            EngulfingError::NoData { .. } | EngulfingError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
