//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_audit_adapter::JsonAuditLog;
use crate::adapters::static_broker_adapter::StaticBrokerFeed;
use crate::adapters::timeout_broker_adapter::TimeoutBrokerFeed;
use crate::domain::app_config::AppConfig;
use crate::domain::audit::{DecisionRecord, DecisionStatus};
use crate::domain::backtest::{BacktestResult, BrokerSource, Simulator};
use crate::domain::broker::BrokerSnapshot;
use crate::domain::error::IdxQuantError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::scanner::{ScanReport, Scanner};
use crate::ports::audit_port::AuditPort;
use crate::ports::broker_port::BrokerFlowPort;
use crate::ports::data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(
    name = "idxquant",
    about = "IDX equity backtester and watchlist scanner"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay history for the watchlist (or one ticker)
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
        /// Validate config and report available data without simulating
        #[arg(long)]
        dry_run: bool,
    },
    /// Evaluate the latest bar of each watchlist ticker
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            code,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, code.as_deref())
            } else {
                run_backtest(&config, code.as_deref())
            }
        }
        Command::Scan { config, code } => run_scan(&config, code.as_deref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, ExitCode> {
    FileConfigAdapter::from_file(path)
        .and_then(|adapter| AppConfig::from_port(&adapter))
        .map_err(|err| {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        })
}

/// Data and broker collaborators built from configuration.
pub struct Collaborators {
    pub data: Arc<CsvAdapter>,
    pub brokers: TimeoutBrokerFeed,
}

pub fn build_collaborators(config: &AppConfig) -> Collaborators {
    let data = Arc::new(CsvAdapter::new(config.data_dir.clone(), &config.index_code));
    let brokers = TimeoutBrokerFeed::new(
        data.clone(),
        Duration::from_millis(config.backtest.broker_timeout_ms),
    );
    Collaborators { data, brokers }
}

fn run_backtest(config_path: &Path, code: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let tickers = config.tickers(code);
    let collaborators = build_collaborators(&config);

    eprintln!(
        "Running backtest: {} tickers, capital {:.0} IDR, broker source {}",
        tickers.len(),
        config.backtest.initial_capital,
        config.backtest.broker_source,
    );

    let outcomes = run_backtest_pipeline(
        &config,
        &tickers,
        collaborators.data.as_ref(),
        &collaborators.brokers,
    );

    print_backtest_summaries(&outcomes);

    let decisions: Vec<DecisionRecord> = outcomes
        .iter()
        .filter_map(|(_, r)| r.as_ref().ok())
        .flat_map(|r| r.decisions.iter().cloned())
        .collect();
    if let Err(code) = append_audit(&config.audit_path, &decisions) {
        return code;
    }

    backtest_exit_code(&outcomes)
}

/// Runs every ticker through its own simulator in parallel. Results keep
/// the order of `tickers`; a failed ticker never affects the others.
pub fn run_backtest_pipeline(
    config: &AppConfig,
    tickers: &[String],
    data: &(dyn MarketDataPort + Sync),
    brokers: &(dyn BrokerFlowPort + Sync),
) -> Vec<(String, Result<BacktestResult, IdxQuantError>)> {
    let history = config.backtest.history_bars;
    let index = match data.market_index_series(history) {
        Ok(bars) => bars,
        Err(e) => {
            tracing::warn!(error = %e, "composite index unavailable, regime will be DEFENSIVE");
            Vec::new()
        }
    };

    let simulator = Simulator::new(
        config.backtest.initial_capital,
        config.risk.clone(),
        config.brokers.clone(),
    );

    tickers
        .par_iter()
        .map(|ticker| {
            let result = backtest_ticker(config, &simulator, ticker, &index, data, brokers);
            if let Err(e) = &result {
                tracing::warn!(ticker = %ticker, error = %e, "backtest skipped");
            }
            (ticker.clone(), result)
        })
        .collect()
}

fn backtest_ticker(
    config: &AppConfig,
    simulator: &Simulator,
    ticker: &str,
    index: &[PriceBar],
    data: &dyn MarketDataPort,
    brokers: &dyn BrokerFlowPort,
) -> Result<BacktestResult, IdxQuantError> {
    let bars = data.price_series(ticker, config.backtest.history_bars)?;
    match config.backtest.broker_source {
        BrokerSource::Historical => simulator.run(ticker, &bars, index, brokers),
        BrokerSource::Static => {
            let feed = StaticBrokerFeed::latest_from(brokers, ticker).unwrap_or_else(|e| {
                tracing::warn!(ticker, error = %e, "latest broker snapshot unavailable, using neutral");
                StaticBrokerFeed::new(BrokerSnapshot::neutral(None))
            });
            simulator.run(ticker, &bars, index, &feed)
        }
    }
}

fn print_backtest_summaries(outcomes: &[(String, Result<BacktestResult, IdxQuantError>)]) {
    eprintln!("\n=== Backtest Results ===");
    for (ticker, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                let s = &result.summary;
                let sign = if s.profit >= 0.0 { "+" } else { "" };
                eprintln!(
                    "  {}:  final {:.0} IDR, {}{:.0} ({}{:.2}%), {} trades, {:.1}% win rate, max DD -{:.1}%",
                    ticker,
                    s.final_equity,
                    sign,
                    s.profit,
                    sign,
                    s.profit_pct,
                    s.trade_count,
                    s.win_rate * 100.0,
                    s.max_drawdown * 100.0,
                );
            }
            Err(e) => eprintln!("  {ticker}:  skipped ({e})"),
        }
    }
}

/// Success unless every ticker failed; then the first failure decides.
pub fn backtest_exit_code(outcomes: &[(String, Result<BacktestResult, IdxQuantError>)]) -> ExitCode {
    if outcomes.iter().any(|(_, r)| r.is_ok()) {
        return ExitCode::SUCCESS;
    }
    match outcomes.iter().find_map(|(_, r)| r.as_ref().err()) {
        Some(err) => err.into(),
        None => ExitCode::SUCCESS,
    }
}

fn append_audit(path: &Path, decisions: &[DecisionRecord]) -> Result<(), ExitCode> {
    if decisions.is_empty() {
        return Ok(());
    }
    let log = JsonAuditLog::new(path.to_path_buf());
    match log.append(decisions) {
        Ok(()) => {
            eprintln!(
                "\n{} decision(s) appended to {}",
                decisions.len(),
                path.display()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

pub fn run_dry_run(config_path: &Path, code: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    eprintln!("Config validated successfully");
    print_config(&config);

    let data = CsvAdapter::new(config.data_dir.clone(), &config.index_code);
    let history = config.backtest.history_bars;

    eprintln!("\nData:");
    match data.market_index_series(history) {
        Ok(bars) => eprintln!("  {} (index): {} bars", config.index_code, bars.len()),
        Err(e) => eprintln!("  {} (index): unavailable ({e})", config.index_code),
    }
    for ticker in config.tickers(code) {
        match data.price_series(&ticker, history) {
            Ok(bars) => match (bars.first(), bars.last()) {
                (Some(first), Some(last)) => eprintln!(
                    "  {}: {} bars, {} to {}",
                    ticker,
                    bars.len(),
                    first.date,
                    last.date
                ),
                _ => eprintln!("  {ticker}: no bars"),
            },
            Err(e) => eprintln!("  {ticker}: unavailable ({e})"),
        }
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_scan(config_path: &Path, code: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let tickers = config.tickers(code);
    let collaborators = build_collaborators(&config);

    let report = run_scan_pipeline(
        &config,
        &tickers,
        collaborators.data.as_ref(),
        &collaborators.brokers,
    );
    print_scan_report(&report);

    if let Err(code) = append_audit(&config.audit_path, &report.decisions()) {
        return code;
    }

    if report.outcomes.is_empty() {
        eprintln!("error: no ticker could be scanned");
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

pub fn run_scan_pipeline(
    config: &AppConfig,
    tickers: &[String],
    data: &dyn MarketDataPort,
    brokers: &dyn BrokerFlowPort,
) -> ScanReport {
    let scanner = Scanner::new(
        config.backtest.initial_capital,
        config.backtest.history_bars,
        config.risk.clone(),
        config.brokers.clone(),
    );
    scanner.scan(tickers, data, brokers, Local::now().naive_local())
}

fn print_scan_report(report: &ScanReport) {
    eprintln!("\n[MARKET REGIME] {}", report.regime);
    eprintln!("\n[SCANNING WATCHLIST]");
    for outcome in &report.outcomes {
        eprintln!(
            "  {}: price {:.0} | top buyer {} | acc ratio {:.2}",
            outcome.ticker, outcome.close, outcome.flow.top_buyer, outcome.flow.accumulation_ratio
        );
        match (&outcome.strategy, &outcome.decision) {
            (Some(strategy), Some(decision)) => {
                eprintln!("    signal: {strategy}");
                match decision.status {
                    DecisionStatus::Approved => eprintln!(
                        "    BUY {} lots @ {:.0} | SL {}",
                        decision.lots, decision.price, decision.stop_loss
                    ),
                    DecisionStatus::Rejected => {}
                }
                eprintln!("    {}", decision.reason);
            }
            _ => eprintln!("    no entry signal"),
        }
    }
    for (ticker, reason) in &report.skipped {
        eprintln!("  {ticker}: skipped ({reason})");
    }
    eprintln!("\nRemaining cash: {:.0} IDR", report.remaining_cash);
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    print_config(&config);
    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}

fn print_config(config: &AppConfig) {
    eprintln!("\nBacktest:");
    eprintln!("  initial_capital:   {:.0}", config.backtest.initial_capital);
    eprintln!("  data_dir:          {}", config.data_dir.display());
    eprintln!("  index_code:        {}", config.index_code);
    eprintln!("  history_bars:      {}", config.backtest.history_bars);
    eprintln!("  broker_source:     {}", config.backtest.broker_source);
    eprintln!("  broker_timeout_ms: {}", config.backtest.broker_timeout_ms);
    eprintln!("\nRisk:");
    eprintln!(
        "  base / aggressive: {:.1}% / {:.1}%",
        config.risk.base_risk_fraction * 100.0,
        config.risk.aggressive_risk_fraction * 100.0
    );
    eprintln!("  high conviction:   ratio > {}", config.risk.high_conviction_ratio);
    eprintln!("\nBrokers:");
    eprintln!(
        "  smart money: {}",
        config.brokers.smart_money.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    eprintln!(
        "  retail:      {}",
        config.brokers.retail.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    eprintln!("\nWatchlist: {}", config.watchlist.join(", "));
    eprintln!("Audit log: {}", config.audit_path.display());
}
