//! Latest-bar watchlist scan.
//!
//! The composite index regime is computed once for the whole scan. Each
//! ticker is evaluated on its most recent bar; signalled entries go through
//! the gatekeeper against a running cash balance that shrinks with every
//! approval, while equity stays at the starting capital.

use chrono::NaiveDateTime;

use super::audit::{DecisionRecord, SignalContext};
use super::broker::{BrokerClassification, BrokerSnapshot};
use super::error::IdxQuantError;
use super::indicator_set::IndicatorSet;
use super::ohlcv::PriceBar;
use super::regime::MarketRegime;
use super::risk::{EntryRequest, RiskConfig, RiskGatekeeper};
use super::signal::{SignalEngine, StrategyKind};
use super::tick::LOT_SIZE;
use crate::ports::broker_port::BrokerFlowPort;
use crate::ports::data_port::MarketDataPort;

/// What the scan saw for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub ticker: String,
    pub close: f64,
    pub flow: BrokerSnapshot,
    pub strategy: Option<StrategyKind>,
    pub decision: Option<DecisionRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub regime: MarketRegime,
    pub outcomes: Vec<ScanOutcome>,
    /// Tickers that could not be evaluated, with the reason.
    pub skipped: Vec<(String, String)>,
    pub remaining_cash: f64,
}

impl ScanReport {
    pub fn decisions(&self) -> Vec<DecisionRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| o.decision.clone())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct Scanner {
    initial_capital: f64,
    history_bars: usize,
    signals: SignalEngine,
    gatekeeper: RiskGatekeeper,
}

impl Scanner {
    pub fn new(
        initial_capital: f64,
        history_bars: usize,
        risk: RiskConfig,
        brokers: BrokerClassification,
    ) -> Self {
        Scanner {
            initial_capital,
            history_bars,
            signals: SignalEngine::new(brokers.clone()),
            gatekeeper: RiskGatekeeper::new(risk, brokers),
        }
    }

    pub fn scan(
        &self,
        tickers: &[String],
        data: &dyn MarketDataPort,
        brokers: &dyn BrokerFlowPort,
        timestamp: NaiveDateTime,
    ) -> ScanReport {
        let index = match data.market_index_series(self.history_bars) {
            Ok(bars) => bars,
            Err(e) => {
                tracing::warn!(error = %e, "composite index unavailable, assuming DEFENSIVE");
                Vec::new()
            }
        };
        let regime = MarketRegime::from_index(&index);
        tracing::info!(%regime, index_bars = index.len(), "market regime");

        let mut cash = self.initial_capital;
        let mut outcomes = Vec::with_capacity(tickers.len());
        let mut skipped = Vec::new();

        for ticker in tickers {
            let bars = match data.price_series(ticker, self.history_bars) {
                Ok(bars) if bars.is_empty() => {
                    let err = IdxQuantError::NoData {
                        ticker: ticker.clone(),
                    };
                    tracing::warn!(ticker = %ticker, error = %err, "skipping ticker");
                    skipped.push((ticker.clone(), err.to_string()));
                    continue;
                }
                Ok(bars) => bars,
                Err(e) => {
                    tracing::warn!(ticker = %ticker, error = %e, "skipping ticker");
                    skipped.push((ticker.clone(), e.to_string()));
                    continue;
                }
            };

            let flow = match brokers.snapshot(ticker, None) {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => BrokerSnapshot::neutral(None),
                Err(e) => {
                    tracing::warn!(ticker = %ticker, error = %e, "broker data unavailable, using neutral snapshot");
                    BrokerSnapshot::neutral(None)
                }
            };

            let outcome = self.evaluate(ticker, &bars, flow, regime, &mut cash, timestamp);
            outcomes.push(outcome);
        }

        ScanReport {
            regime,
            outcomes,
            skipped,
            remaining_cash: cash,
        }
    }

    fn evaluate(
        &self,
        ticker: &str,
        bars: &[PriceBar],
        flow: BrokerSnapshot,
        regime: MarketRegime,
        cash: &mut f64,
        timestamp: NaiveDateTime,
    ) -> ScanOutcome {
        let indicators = IndicatorSet::compute(bars);
        let Some(snapshot) = indicators.latest() else {
            return ScanOutcome {
                ticker: ticker.to_string(),
                close: 0.0,
                flow,
                strategy: None,
                decision: None,
            };
        };

        let signal = self.signals.evaluate(&snapshot, &flow);
        let Some(strategy) = signal.triggered() else {
            tracing::debug!(ticker, close = snapshot.close, "no entry signal");
            return ScanOutcome {
                ticker: ticker.to_string(),
                close: snapshot.close,
                flow,
                strategy: None,
                decision: None,
            };
        };

        let request = EntryRequest {
            ticker,
            entry_price: snapshot.close,
            cash: *cash,
            equity: self.initial_capital,
            accumulation_ratio: flow.accumulation_ratio,
            top_buyer: &flow.top_buyer,
            atr: snapshot.atr.unwrap_or(0.0),
        };
        let decision = self.gatekeeper.validate_entry_with_regime(&request, regime);
        if decision.approved {
            *cash -= decision.lots as f64 * LOT_SIZE as f64 * snapshot.close;
            tracing::info!(
                ticker,
                lots = decision.lots,
                stop_loss = decision.stop_loss_price,
                %strategy,
                "entry approved"
            );
        } else {
            tracing::info!(ticker, reason = %decision.reason, %strategy, "entry rejected");
        }

        let context = SignalContext {
            timestamp,
            ticker,
            strategy,
            price: snapshot.close,
            acc_ratio: flow.accumulation_ratio,
            top_buyer: &flow.top_buyer,
            market_regime: regime,
        };
        let record = DecisionRecord::new(&context, &decision);

        ScanOutcome {
            ticker: ticker.to_string(),
            close: snapshot.close,
            flow,
            strategy: Some(strategy),
            decision: Some(record),
        }
    }
}
