//! Per-signal decision record, written to the audit log.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::regime::MarketRegime;
use super::risk::EntryDecision;
use super::signal::StrategyKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionStatus {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub timestamp: NaiveDateTime,
    pub ticker: String,
    pub strategy: StrategyKind,
    pub price: f64,
    pub acc_ratio: f64,
    pub top_buyer: String,
    pub market_regime: MarketRegime,
    pub status: DecisionStatus,
    pub reason: String,
    pub lots: i64,
    pub stop_loss: i64,
}

/// Inputs of a signalled entry, before the gatekeeper rules on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalContext<'a> {
    pub timestamp: NaiveDateTime,
    pub ticker: &'a str,
    pub strategy: StrategyKind,
    pub price: f64,
    pub acc_ratio: f64,
    pub top_buyer: &'a str,
    pub market_regime: MarketRegime,
}

impl DecisionRecord {
    pub fn new(context: &SignalContext<'_>, decision: &EntryDecision) -> Self {
        DecisionRecord {
            timestamp: context.timestamp,
            ticker: context.ticker.to_string(),
            strategy: context.strategy,
            price: context.price,
            acc_ratio: context.acc_ratio,
            top_buyer: context.top_buyer.to_string(),
            market_regime: decision.regime.unwrap_or(context.market_regime),
            status: if decision.approved {
                DecisionStatus::Approved
            } else {
                DecisionStatus::Rejected
            },
            reason: decision.reason.clone(),
            lots: decision.lots,
            stop_loss: decision.stop_loss_price,
        }
    }
}
