//! Symbol universe: explicit symbol lists, non-equity exclusion and
//! per-symbol data validation.

use crate::domain::error::EngulfingError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Identifier patterns for instruments that are not ordinary equities:
/// bond loans, money-market and mutual funds, treasury bills.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    r"(?i)\bbonds?\b",
    r"(?i)\bobl(igasjon)?\b",
    r"(?i)\bmoney.?market\b|pengemarked",
    r"(?i)\bfunds?\b|\bfond\b",
    r"(?i)\bt-?bills?\b|\btreasury\b|statskasseveksel",
];

/// Minimum bars needed before a symbol can carry a signal.
pub const DEFAULT_MIN_BARS: usize = 2;

#[derive(Debug, Clone)]
pub struct Universe {
    pub symbols: Vec<String>,
    pub exchange: String,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.symbols.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("invalid exclude pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl From<UniverseError> for EngulfingError {
    fn from(err: UniverseError) -> Self {
        EngulfingError::ConfigInvalid {
            section: "universe".to_string(),
            key: match err {
                UniverseError::InvalidPattern { .. } => "exclude".to_string(),
                _ => "symbols".to_string(),
            },
            reason: err.to_string(),
        }
    }
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Excludes symbols whose identifier matches any pattern.
#[derive(Debug, Clone)]
pub struct SymbolFilter {
    patterns: Vec<Regex>,
}

impl SymbolFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, UniverseError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|e| UniverseError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn default_non_equity() -> Self {
        Self::new(DEFAULT_EXCLUDE_PATTERNS).expect("built-in patterns compile")
    }

    pub fn is_excluded(&self, symbol: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(symbol))
    }

    /// Split `symbols` into (kept, excluded), preserving order.
    pub fn apply(&self, symbols: Vec<String>) -> (Vec<String>, Vec<String>) {
        symbols.into_iter().partition(|s| !self.is_excluded(s))
    }
}

pub struct UniverseValidationResult {
    pub universe: Universe,
    pub skipped: Vec<SkippedSymbol>,
    /// Bars fetched for each kept symbol.
    pub bars: HashMap<String, Vec<OhlcvBar>>,
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

pub fn validate_universe(
    data_port: &dyn DataPort,
    symbols: Vec<String>,
    exchange: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_bars: usize,
) -> Result<UniverseValidationResult, EngulfingError> {
    let mut valid_symbols = Vec::new();
    let mut skipped = Vec::new();
    let mut bars = HashMap::new();

    for symbol in symbols {
        let ohlcv = match data_port.fetch_ohlcv(&symbol, exchange, start_date, end_date) {
            Ok(data) => data,
            Err(e) => {
                warn!(%symbol, %exchange, error = %e, "skipping symbol");
                skipped.push(SkippedSymbol {
                    symbol,
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        let observed = ohlcv.iter().filter(|b| b.is_observed()).count();
        if observed == 0 && min_bars > 0 {
            warn!(%symbol, %exchange, "skipping symbol: no data in window");
            skipped.push(SkippedSymbol {
                symbol,
                reason: SkipReason::NoData,
            });
            continue;
        }

        if observed < min_bars {
            warn!(
                %symbol,
                %exchange,
                bars = observed,
                minimum = min_bars,
                "skipping symbol: insufficient bars"
            );
            skipped.push(SkippedSymbol {
                symbol,
                reason: SkipReason::InsufficientBars { bars: observed },
            });
            continue;
        }

        info!(%symbol, bars = observed, rows = ohlcv.len(), "symbol ok");
        bars.insert(symbol.clone(), ohlcv);
        valid_symbols.push(symbol);
    }

    if valid_symbols.is_empty() {
        return Err(EngulfingError::InsufficientData {
            symbol: "all".to_string(),
            exchange: exchange.to_string(),
            bars: 0,
            minimum: min_bars,
        });
    }

    if !skipped.is_empty() {
        info!(
            kept = valid_symbols.len(),
            total = valid_symbols.len() + skipped.len(),
            %exchange,
            "universe validated"
        );
    }

    Ok(UniverseValidationResult {
        universe: Universe {
            symbols: valid_symbols,
            exchange: exchange.to_string(),
        },
        skipped,
        bars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_symbols_basic() {
        let result = parse_symbols("EQNR,DNB,MOWI,YAR").unwrap();
        assert_eq!(result, vec!["EQNR", "DNB", "MOWI", "YAR"]);
    }

    #[test]
    fn parse_symbols_whitespace_and_case() {
        let result = parse_symbols("  eqnr , Dnb ,mowi").unwrap();
        assert_eq!(result, vec!["EQNR", "DNB", "MOWI"]);
    }

    #[test]
    fn parse_symbols_empty_token() {
        assert!(matches!(
            parse_symbols("EQNR,,DNB"),
            Err(UniverseError::EmptyToken)
        ));
    }

    #[test]
    fn parse_symbols_duplicate() {
        let result = parse_symbols("EQNR,DNB,eqnr");
        assert!(matches!(result, Err(UniverseError::DuplicateSymbol(s)) if s == "EQNR"));
    }

    #[test]
    fn default_filter_excludes_non_equities() {
        let filter = SymbolFilter::default_non_equity();
        for symbol in [
            "NORDEA-BOND",
            "DNB-OBL",
            "Storebrand Pengemarked",
            "KLP MONEY MARKET",
            "ODIN-FOND",
            "US-TBILL",
            "T-BILL-24",
            "Treasury 2024",
        ] {
            assert!(filter.is_excluded(symbol), "{symbol} should be excluded");
        }
        for symbol in ["EQNR", "DNB", "MOWI", "YAR", "NOBLE", "REFUNDX"] {
            assert!(!filter.is_excluded(symbol), "{symbol} should be kept");
        }
    }

    #[test]
    fn custom_filter_apply_partitions() {
        let filter = SymbolFilter::new(&[r"^X"]).unwrap();
        let (kept, excluded) = filter.apply(vec!["XBOND".into(), "EQNR".into(), "XFUND".into()]);
        assert_eq!(kept, vec!["EQNR"]);
        assert_eq!(excluded, vec!["XBOND", "XFUND"]);
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = SymbolFilter::new::<&str>(&[]).unwrap();
        assert!(!filter.is_excluded("ANY-BOND"));
    }

    #[test]
    fn invalid_pattern_is_error() {
        let err = SymbolFilter::new(&["(unclosed"]).unwrap_err();
        assert!(matches!(err, UniverseError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));

        let err: EngulfingError = err.into();
        assert!(matches!(err, EngulfingError::ConfigInvalid { ref key, .. } if key == "exclude"));
    }

    #[test]
    fn universe_count() {
        let universe = Universe {
            symbols: vec!["EQNR".to_string(), "DNB".to_string()],
            exchange: "OSE".to_string(),
        };
        assert_eq!(universe.count(), 2);
    }
}
