//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::markdown_report_adapter::MarkdownReportAdapter;
use crate::adapters::table_csv_adapter::TableCsvAdapter;
use crate::adapters::trade_csv_adapter::TradeCsvAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::config_validation::{parse_date, validate_config, validate_data_config};
use crate::domain::error::EngulfingError;
use crate::domain::price_table::{PriceSeries, PriceTable};
use crate::domain::signal::{SignalSeries, derive_all, derive_signals};
use crate::domain::summary::RunSummary;
use crate::domain::universe::{DEFAULT_MIN_BARS, SymbolFilter, parse_symbols, validate_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_REPORT_PATH: &str = "report.md";

#[derive(Parser, Debug)]
#[command(name = "engulfing", about = "Engulfing candlestick backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the backtest over the configured universe
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Markdown report path (overrides [report] path)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Closed-trade CSV path (overrides [report] trades_path)
        #[arg(long)]
        trades: Option<PathBuf>,
        /// Backtest a single symbol
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Print one symbol's prices and signals as CSV
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
    },
    /// List the symbols that would be backtested
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
        /// Skip the exclusion filter and list everything on the exchange
        #[arg(long)]
        all: bool,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            output,
            trades,
            symbol,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, symbol.as_deref())
            } else {
                run_backtest(&config, output.as_deref(), trades.as_deref(), symbol.as_deref())
            }
        }
        Command::Signals { config, symbol } => run_signals(&config, &symbol),
        Command::ListSymbols { config, all } => run_list_symbols(&config, all),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EngulfingError> {
    FileConfigAdapter::from_file(path).map_err(|e| EngulfingError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, EngulfingError> {
    let start = config.get_string("backtest", "start_date");
    let end = config.get_string("backtest", "end_date");
    Ok(BacktestConfig {
        start_date: parse_date(start.as_deref(), "start_date")?,
        end_date: parse_date(end.as_deref(), "end_date")?,
        initial_capital: config.get_double("backtest", "initial_capital", 100_000.0),
        risk_free_rate: config.get_double("backtest", "risk_free_rate", 0.0),
    })
}

pub fn configured_exchange(config: &dyn ConfigPort) -> Result<String, EngulfingError> {
    config
        .get_string("data", "exchange")
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| EngulfingError::ConfigMissing {
            section: "data".into(),
            key: "exchange".into(),
        })
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, EngulfingError> {
    let path = config
        .get_string("data", "path")
        .map(|p| PathBuf::from(p.trim()))
        .ok_or_else(|| EngulfingError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv_dir".to_string());

    match source.trim() {
        "csv_dir" => Ok(Box::new(CsvAdapter::new(path))),
        "table" => Ok(Box::new(TableCsvAdapter::from_file(&path)?)),
        other => Err(EngulfingError::ConfigInvalid {
            section: "data".into(),
            key: "source".into(),
            reason: format!("unknown source {other:?}"),
        }),
    }
}

/// A custom `exclude` regex replaces the non-equity defaults, which can also
/// be switched off with `exclude_defaults = no`.
pub fn build_symbol_filter(config: &dyn ConfigPort) -> Result<SymbolFilter, EngulfingError> {
    match config
        .get_string("universe", "exclude")
        .filter(|s| !s.trim().is_empty())
    {
        Some(pattern) => Ok(SymbolFilter::new(&[pattern.trim()])?),
        None if config.get_bool("universe", "exclude_defaults", true) => {
            Ok(SymbolFilter::default_non_equity())
        }
        None => Ok(SymbolFilter::new::<&str>(&[])?),
    }
}

pub fn min_bars(config: &dyn ConfigPort) -> usize {
    let value = config.get_int("universe", "min_bars", DEFAULT_MIN_BARS as i64);
    usize::try_from(value).unwrap_or(0)
}

/// Symbol override, then the configured list, then everything the data
/// source lists for the exchange.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
    exchange: &str,
) -> Result<Vec<String>, EngulfingError> {
    if let Some(s) = symbol_override {
        return Ok(vec![s.trim().to_uppercase()]);
    }
    match config
        .get_string("universe", "symbols")
        .filter(|s| !s.trim().is_empty())
    {
        Some(list) => Ok(parse_symbols(&list)?),
        None => data_port.list_symbols(exchange),
    }
}

/// Filter, load, derive signals, backtest and summarise.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    symbols: Vec<String>,
    exchange: &str,
    filter: &SymbolFilter,
    min_bars: usize,
) -> Result<RunSummary, EngulfingError> {
    let (kept, excluded) = filter.apply(symbols);
    if !excluded.is_empty() {
        info!(count = excluded.len(), "excluded non-equity symbols");
    }

    let validation = validate_universe(
        data_port,
        kept,
        exchange,
        bt_config.start_date,
        bt_config.end_date,
        min_bars,
    )?;

    let table = PriceTable::from_bars(validation.bars);
    info!(
        symbols = table.symbol_count(),
        dates = table.len(),
        start = %bt_config.start_date,
        end = %bt_config.end_date,
        "running backtest"
    );

    let signals = derive_all(&table);
    let result = backtest_engine::run_backtest(&table, &signals, bt_config);

    Ok(RunSummary::build(
        bt_config,
        exchange,
        excluded,
        validation.skipped,
        result,
    ))
}

pub fn print_summary(summary: &RunSummary) {
    let m = &summary.aggregate;
    let pct = |v: Option<f64>| match v {
        Some(v) if v.is_finite() => format!("{:.2}%", v * 100.0),
        _ => "n/a".to_string(),
    };

    eprintln!("\n=== Aggregate Results ({} symbols) ===", m.symbol_count);
    eprintln!("Total Return:     {}", pct(Some(m.total_return)));
    eprintln!("Benchmark Return: {}", pct(m.benchmark_return));
    eprintln!("Max Drawdown:     -{:.1}%", m.max_drawdown * 100.0);
    eprintln!("Trades / Symbol:  {:.1}", m.total_trades);
    eprintln!("Win Rate:         {}", pct(m.win_rate));
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!(
        "Signals:          {} entries, {} exits",
        summary.entry_signals(),
        summary.exit_signals()
    );

    let ranked = summary.ranked();
    if ranked.len() > 1 {
        let shown = ranked.len().min(3);
        eprintln!("\n=== Best ===");
        for s in &ranked[..shown] {
            eprintln!("  {}:  {}", s.symbol, pct(Some(s.metrics.total_return)));
        }
        eprintln!("\n=== Worst ===");
        for s in ranked.iter().rev().take(shown) {
            eprintln!("  {}:  {}", s.symbol, pct(Some(s.metrics.total_return)));
        }
    }
}

pub fn run_backtest(
    config_path: &Path,
    output_path: Option<&Path>,
    trades_path: Option<&Path>,
    symbol_override: Option<&str>,
) -> Result<(), EngulfingError> {
    // Stage 1: Load and validate config
    info!(path = %config_path.display(), "loading config");
    let config = load_config(config_path)?;
    validate_config(&config)?;

    // Stage 2: Build collaborators
    let bt_config = build_backtest_config(&config)?;
    let exchange = configured_exchange(&config)?;
    let data_port = build_data_port(&config)?;
    let filter = build_symbol_filter(&config)?;

    // Stage 3: Resolve universe and run
    let symbols = resolve_symbols(symbol_override, &config, data_port.as_ref(), &exchange)?;
    info!(count = symbols.len(), %exchange, "validating symbols");
    let summary = run_backtest_pipeline(
        data_port.as_ref(),
        &bt_config,
        symbols,
        &exchange,
        &filter,
        min_bars(&config),
    )?;

    // Stage 4: Console summary and reports
    print_summary(&summary);

    let output = output_path
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "path").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH));
    MarkdownReportAdapter.write(&summary, &output)?;
    eprintln!("\nReport written to: {}", output.display());

    let trades = trades_path
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "trades_path").map(PathBuf::from));
    if let Some(trades) = trades {
        TradeCsvAdapter.write(&summary, &trades)?;
        eprintln!("Trades written to: {}", trades.display());
    }

    Ok(())
}

pub fn run_dry_run(config_path: &Path, symbol_override: Option<&str>) -> Result<(), EngulfingError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;
    eprintln!("Config validated successfully");

    let bt_config = build_backtest_config(&config)?;
    let exchange = configured_exchange(&config)?;
    let data_port = build_data_port(&config)?;
    let filter = build_symbol_filter(&config)?;
    let symbols = resolve_symbols(symbol_override, &config, data_port.as_ref(), &exchange)?;
    let (kept, excluded) = filter.apply(symbols);

    eprintln!("\nWindow: {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("Initial capital per symbol: {:.0}", bt_config.initial_capital);
    eprintln!("\nUniverse:");
    eprintln!("  exchange: {exchange}");
    eprintln!("  symbols:  {} ({})", kept.len(), kept.join(", "));
    if !excluded.is_empty() {
        eprintln!("  excluded: {}", excluded.join(", "));
    }

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

/// Write `date,open,close,entry,exit` rows. Missing prices are empty cells.
pub fn write_signals_csv<W: Write>(
    writer: W,
    table: &PriceTable,
    series: &PriceSeries,
    signals: &SignalSeries,
) -> Result<(), EngulfingError> {
    let io_err = |e: csv::Error| EngulfingError::Io(e.into());
    let cell = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "open", "close", "entry", "exit"])
        .map_err(io_err)?;
    for (t, date) in table.dates.iter().enumerate() {
        wtr.write_record([
            date.to_string(),
            cell(series.open.get(t).copied().flatten()),
            cell(series.close.get(t).copied().flatten()),
            signals.entry.get(t).copied().unwrap_or(false).to_string(),
            signals.exit.get(t).copied().unwrap_or(false).to_string(),
        ])
        .map_err(io_err)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run_signals(config_path: &Path, symbol: &str) -> Result<(), EngulfingError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let bt_config = build_backtest_config(&config)?;
    let exchange = configured_exchange(&config)?;
    let data_port = build_data_port(&config)?;

    let symbol = symbol.trim().to_uppercase();
    let bars = data_port.fetch_ohlcv(&symbol, &exchange, bt_config.start_date, bt_config.end_date)?;
    if bars.is_empty() {
        return Err(EngulfingError::NoData { symbol, exchange });
    }

    let table = PriceTable::from_bars(HashMap::from([(symbol.clone(), bars)]));
    let series = table
        .get(&symbol)
        .ok_or_else(|| EngulfingError::NoData {
            symbol: symbol.clone(),
            exchange: exchange.clone(),
        })?;
    let signals = derive_signals(series);
    info!(
        %symbol,
        entries = signals.entry_count(),
        exits = signals.exit_count(),
        "derived signals"
    );

    write_signals_csv(std::io::stdout().lock(), &table, series, &signals)
}

pub fn run_list_symbols(config_path: &Path, all: bool) -> Result<(), EngulfingError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let exchange = configured_exchange(&config)?;
    let data_port = build_data_port(&config)?;

    let symbols = if all {
        data_port.list_symbols(&exchange)?
    } else {
        let filter = build_symbol_filter(&config)?;
        let symbols = resolve_symbols(None, &config, data_port.as_ref(), &exchange)?;
        filter.apply(symbols).0
    };

    if symbols.is_empty() {
        eprintln!("No symbols found for exchange {exchange}");
    } else {
        for symbol in &symbols {
            println!("{symbol}");
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

pub fn run_info(config_path: &Path, symbol: Option<&str>) -> Result<(), EngulfingError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let exchange = configured_exchange(&config)?;
    let data_port = build_data_port(&config)?;
    let symbols = resolve_symbols(symbol, &config, data_port.as_ref(), &exchange)?;

    for s in &symbols {
        match data_port.get_data_range(s, &exchange) {
            Ok(Some((first, last, count))) => {
                println!("{s}.{exchange}: {count} bars, {first} to {last}");
            }
            Ok(None) => eprintln!("{s}.{exchange}: no data found"),
            Err(e) => eprintln!("error querying {s}.{exchange}: {e}"),
        }
    }
    Ok(())
}

pub fn run_validate(config_path: &Path) -> Result<(), EngulfingError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let bt_config = build_backtest_config(&config)?;
    eprintln!("  exchange:  {}", configured_exchange(&config)?);
    eprintln!("  window:    {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  capital:   {:.0}", bt_config.initial_capital);
    eprintln!("  min bars:  {}", min_bars(&config));
    eprintln!("\nConfiguration is valid.");
    Ok(())
}
