//! Broker-flow ("bandarmology") data: the daily top-broker snapshot and the
//! smart-money / retail broker classification.

use chrono::NaiveDate;
use std::collections::BTreeSet;

pub const UNKNOWN_BUYER: &str = "Unknown";

/// Buy/sell imbalance among the top brokers of one ticker on one day.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerSnapshot {
    pub accumulation_ratio: f64,
    pub top_buyer: String,
    pub as_of: Option<NaiveDate>,
}

impl BrokerSnapshot {
    pub fn new(accumulation_ratio: f64, top_buyer: impl Into<String>, as_of: NaiveDate) -> Self {
        BrokerSnapshot {
            accumulation_ratio,
            top_buyer: top_buyer.into(),
            as_of: Some(as_of),
        }
    }

    /// Stand-in when no data exists for a date. A zero ratio fails every
    /// accumulation threshold, so a neutral day can never produce an entry.
    pub fn neutral(as_of: Option<NaiveDate>) -> Self {
        BrokerSnapshot {
            accumulation_ratio: 0.0,
            top_buyer: UNKNOWN_BUYER.to_string(),
            as_of,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.top_buyer == UNKNOWN_BUYER && self.accumulation_ratio == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerClassification {
    pub smart_money: BTreeSet<String>,
    pub retail: BTreeSet<String>,
}

impl BrokerClassification {
    pub fn new<S, R>(smart_money: S, retail: R) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        BrokerClassification {
            smart_money: smart_money
                .into_iter()
                .map(|c| c.as_ref().trim().to_uppercase())
                .collect(),
            retail: retail
                .into_iter()
                .map(|c| c.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn is_smart_money(&self, broker: &str) -> bool {
        self.smart_money.contains(broker)
    }

    pub fn is_retail(&self, broker: &str) -> bool {
        self.retail.contains(broker)
    }
}

impl Default for BrokerClassification {
    fn default() -> Self {
        BrokerClassification::new(
            [
                "AK", "BK", "CC", "ZP", "RX", "KZ", "DX", "CS", "CG", "YU", "LG", "KI",
            ],
            ["YP", "PD", "XC", "NI", "KK", "XL", "SQ"],
        )
    }
}
