//! Day-by-day backtest replay for a single ticker.
//!
//! For every day `i` from bar 150 on, the simulator rebuilds the full
//! [`IndicatorSet`] over `bars[..=i]`, then acts on its FLAT/LONG state:
//!
//! - FLAT: evaluate both entry strategies; on a signal ask the
//!   [`RiskGatekeeper`] (with only the index bars known that day) and buy
//!   the approved lots at the close.
//! - LONG: Chandelier exit. Stop = highest high of the last 20 bars minus
//!   3 × ATR; a close below it liquidates the position at the close.
//!
//! Every simulated day appends exactly one equity point, trade or not.

use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use std::str::FromStr;

use super::audit::{DecisionRecord, SignalContext};
use super::broker::{BrokerClassification, BrokerSnapshot};
use super::error::IdxQuantError;
use super::indicator_set::{IndicatorSet, IndicatorSnapshot};
use super::metrics::BacktestSummary;
use super::ohlcv::{prefix_until, PriceBar};
use super::portfolio::{BuyOrder, PortfolioState};
use super::regime::MarketRegime;
use super::risk::{EntryDecision, EntryRequest, RiskConfig, RiskGatekeeper, STOP_ATR_MULTIPLE};
use super::signal::{SignalEngine, StrategyKind};
use crate::ports::broker_port::BrokerFlowPort;

/// First simulated day index; also the minimum series length.
pub const MIN_HISTORY_BARS: usize = 150;
pub const CHANDELIER_LOOKBACK: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerSource {
    /// One snapshot per date from the broker-history feed.
    Historical,
    /// A single latest snapshot reused for every simulated day.
    Static,
}

impl FromStr for BrokerSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "historical" => Ok(BrokerSource::Historical),
            "static" => Ok(BrokerSource::Static),
            other => Err(format!(
                "unknown broker source '{other}' (expected historical or static)"
            )),
        }
    }
}

impl fmt::Display for BrokerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrokerSource::Historical => write!(f, "historical"),
            BrokerSource::Static => write!(f, "static"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub history_bars: usize,
    pub broker_source: BrokerSource,
    pub broker_timeout_ms: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 200_000_000.0,
            history_bars: 500,
            broker_source: BrokerSource::Historical,
            broker_timeout_ms: 2_000,
        }
    }
}

/// Broker snapshot for `date`; missing or failed lookups become neutral.
pub fn flow_for(feed: &dyn BrokerFlowPort, ticker: &str, date: NaiveDate) -> BrokerSnapshot {
    match feed.snapshot(ticker, Some(date)) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => BrokerSnapshot::neutral(Some(date)),
        Err(e) => {
            tracing::warn!(ticker, %date, error = %e, "broker data unavailable, using neutral snapshot");
            BrokerSnapshot::neutral(Some(date))
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub ticker: String,
    pub portfolio: PortfolioState,
    pub decisions: Vec<DecisionRecord>,
    pub summary: BacktestSummary,
}

/// Replays one ticker. Holds no per-run state, so one instance can drive
/// many tickers, including from several threads.
#[derive(Debug, Clone)]
pub struct Simulator {
    initial_capital: f64,
    signals: SignalEngine,
    gatekeeper: RiskGatekeeper,
}

impl Simulator {
    pub fn new(initial_capital: f64, risk: RiskConfig, brokers: BrokerClassification) -> Self {
        Simulator {
            initial_capital,
            signals: SignalEngine::new(brokers.clone()),
            gatekeeper: RiskGatekeeper::new(risk, brokers),
        }
    }

    pub fn run(
        &self,
        ticker: &str,
        bars: &[PriceBar],
        market_index: &[PriceBar],
        feed: &dyn BrokerFlowPort,
    ) -> Result<BacktestResult, IdxQuantError> {
        if bars.is_empty() {
            return Err(IdxQuantError::NoData {
                ticker: ticker.to_string(),
            });
        }
        if bars.len() < MIN_HISTORY_BARS {
            return Err(IdxQuantError::InsufficientData {
                ticker: ticker.to_string(),
                bars: bars.len(),
                minimum: MIN_HISTORY_BARS,
            });
        }

        let mut portfolio = PortfolioState::new(self.initial_capital);
        let mut decisions = Vec::new();

        for i in MIN_HISTORY_BARS..bars.len() {
            let prefix = &bars[..=i];
            let today = &bars[i];
            let indicators = IndicatorSet::compute(prefix);

            if let Some(snapshot) = indicators.latest() {
                if portfolio.is_flat() {
                    let flow = flow_for(feed, ticker, today.date);
                    if let Some(record) = self.try_enter(
                        ticker,
                        today,
                        &snapshot,
                        &flow,
                        prefix_until(market_index, today.date),
                        &mut portfolio,
                    ) {
                        decisions.push(record);
                    }
                } else {
                    self.check_exit(today, prefix, &snapshot, &mut portfolio);
                }
            }

            portfolio.record_equity(today.date, today.close);
        }

        let summary = BacktestSummary::compute(ticker, &portfolio);
        tracing::info!(
            ticker,
            days = portfolio.equity_curve.len(),
            trades = summary.trade_count,
            final_equity = summary.final_equity,
            "backtest complete"
        );

        Ok(BacktestResult {
            ticker: ticker.to_string(),
            portfolio,
            decisions,
            summary,
        })
    }

    fn try_enter(
        &self,
        ticker: &str,
        today: &PriceBar,
        snapshot: &IndicatorSnapshot,
        flow: &BrokerSnapshot,
        market_index: &[PriceBar],
        portfolio: &mut PortfolioState,
    ) -> Option<DecisionRecord> {
        let signal = self.signals.evaluate(snapshot, flow);
        let strategy = signal.triggered()?;
        let fired = match strategy {
            StrategyKind::Breakout => &signal.breakout,
            StrategyKind::Accumulation => &signal.accumulation,
        };

        let request = EntryRequest {
            ticker,
            entry_price: today.close,
            cash: portfolio.cash,
            equity: portfolio.total_value(today.close),
            accumulation_ratio: fired.accumulation_ratio,
            top_buyer: &fired.top_buyer,
            atr: snapshot.atr.unwrap_or(0.0),
        };
        let decision = self.gatekeeper.validate_entry(&request, market_index);
        let market_regime = decision
            .regime
            .unwrap_or_else(|| MarketRegime::from_index(market_index));

        let decision = if decision.approved && decision.lots > 0 {
            let order = BuyOrder {
                ticker,
                date: today.date,
                price: today.close,
                shares: decision.shares(),
                stop_loss: decision.stop_loss_price,
                strategy,
            };
            fill_entry(portfolio, &order, decision)
        } else {
            tracing::debug!(ticker, date = %today.date, reason = %decision.reason, "entry rejected");
            decision
        };

        let context = SignalContext {
            timestamp: today.date.and_time(NaiveTime::MIN),
            ticker,
            strategy,
            price: today.close,
            acc_ratio: fired.accumulation_ratio,
            top_buyer: &fired.top_buyer,
            market_regime,
        };
        Some(DecisionRecord::new(&context, &decision))
    }

    fn check_exit(
        &self,
        today: &PriceBar,
        prefix: &[PriceBar],
        snapshot: &IndicatorSnapshot,
        portfolio: &mut PortfolioState,
    ) {
        let Some(atr) = snapshot.atr else {
            return;
        };
        let stop = chandelier_stop(prefix, atr);
        if today.close < stop {
            if let Some(fill) = portfolio.sell_all(today.date, today.close) {
                tracing::info!(
                    ticker = %fill.ticker,
                    date = %fill.date,
                    price = fill.price,
                    shares = fill.shares,
                    pnl = fill.pnl.unwrap_or(0.0),
                    stop,
                    "SELL (chandelier exit)"
                );
            }
        }
    }
}

/// Buy the approved lots. A fill the portfolio refuses turns the decision
/// into a rejection so the audit log never shows an entry that did not happen.
fn fill_entry(
    portfolio: &mut PortfolioState,
    order: &BuyOrder<'_>,
    decision: EntryDecision,
) -> EntryDecision {
    match portfolio.buy(order) {
        Some(fill) => {
            tracing::info!(
                ticker = %fill.ticker,
                date = %fill.date,
                price = fill.price,
                shares = fill.shares,
                strategy = %order.strategy,
                "BUY"
            );
            decision
        }
        None => {
            tracing::warn!(ticker = order.ticker, date = %order.date, shares = order.shares, "approved entry not filled");
            EntryDecision {
                approved: false,
                reason: "REJECTED: Fill refused.".to_string(),
                lots: 0,
                stop_loss_price: 0,
                regime: decision.regime,
            }
        }
    }
}

/// Highest high over the trailing 20 bars minus 3 × ATR.
pub fn chandelier_stop(bars: &[PriceBar], atr: f64) -> f64 {
    let start = bars.len().saturating_sub(CHANDELIER_LOOKBACK);
    let highest_high = bars[start..]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    highest_high - STOP_ATR_MULTIPLE * atr
}
