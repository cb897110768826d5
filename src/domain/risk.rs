//! Pre-trade risk gate: retail filter, regime scaling, conviction sizing,
//! ATR stop placement and cash sufficiency.
//!
//! Checks run in order and the first rejection wins:
//! 1. Top buyer in the retail set → reject
//! 2. Regime from the composite index (DEFENSIVE halves the budget)
//! 3. Risk fraction: aggressive above the high-conviction ratio, else base
//! 4. Stop = round_to_tick(entry - 3 × ATR), or a 5% width when that is degenerate
//! 5. lots = floor(floor(risk_amount / risk_per_share) / 100), reject at 0
//! 6. Shrink lots to what cash affords, reject if not even one lot

use crate::domain::broker::BrokerClassification;
use crate::domain::ohlcv::PriceBar;
use crate::domain::regime::MarketRegime;
use crate::domain::tick::{round_to_tick, LOT_SIZE};

pub const STOP_ATR_MULTIPLE: f64 = 3.0;
pub const FALLBACK_STOP_PCT: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub base_risk_fraction: f64,
    pub aggressive_risk_fraction: f64,
    pub high_conviction_ratio: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            base_risk_fraction: 0.015,
            aggressive_risk_fraction: 0.03,
            high_conviction_ratio: 2.5,
        }
    }
}

/// A proposed long entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRequest<'a> {
    pub ticker: &'a str,
    pub entry_price: f64,
    pub cash: f64,
    pub equity: f64,
    pub accumulation_ratio: f64,
    pub top_buyer: &'a str,
    pub atr: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryDecision {
    pub approved: bool,
    pub reason: String,
    pub lots: i64,
    pub stop_loss_price: i64,
    /// Regime the decision was sized under; `None` if rejected before the
    /// regime filter ran.
    pub regime: Option<MarketRegime>,
}

impl EntryDecision {
    fn rejected(reason: String, regime: Option<MarketRegime>) -> Self {
        EntryDecision {
            approved: false,
            reason,
            lots: 0,
            stop_loss_price: 0,
            regime,
        }
    }

    pub fn shares(&self) -> i64 {
        self.lots * LOT_SIZE
    }
}

#[derive(Debug, Clone)]
pub struct RiskGatekeeper {
    config: RiskConfig,
    brokers: BrokerClassification,
}

impl RiskGatekeeper {
    pub fn new(config: RiskConfig, brokers: BrokerClassification) -> Self {
        RiskGatekeeper { config, brokers }
    }

    /// Validate and size an entry against the composite index bars known at
    /// decision time.
    pub fn validate_entry(&self, request: &EntryRequest<'_>, market_index: &[PriceBar]) -> EntryDecision {
        if let Some(rejection) = self.reject_bad_actor(request) {
            return rejection;
        }
        self.size_entry(request, MarketRegime::from_index(market_index))
    }

    /// Same as [`validate_entry`](Self::validate_entry) with the regime
    /// already derived.
    pub fn validate_entry_with_regime(
        &self,
        request: &EntryRequest<'_>,
        regime: MarketRegime,
    ) -> EntryDecision {
        if let Some(rejection) = self.reject_bad_actor(request) {
            return rejection;
        }
        self.size_entry(request, regime)
    }

    fn reject_bad_actor(&self, request: &EntryRequest<'_>) -> Option<EntryDecision> {
        if self.brokers.is_retail(request.top_buyer) {
            return Some(EntryDecision::rejected(
                format!(
                    "REJECTED: Top Buyer {} is Retail Crowd.",
                    request.top_buyer
                ),
                None,
            ));
        }
        None
    }

    fn size_entry(&self, request: &EntryRequest<'_>, regime: MarketRegime) -> EntryDecision {
        let high_conviction = request.accumulation_ratio > self.config.high_conviction_ratio;
        let risk_fraction = if high_conviction {
            self.config.aggressive_risk_fraction
        } else {
            self.config.base_risk_fraction
        };
        let risk_amount = request.equity * risk_fraction * regime.risk_multiplier();

        if !request.entry_price.is_finite() || request.entry_price <= 0.0 {
            return EntryDecision::rejected(
                format!("REJECTED: Invalid entry price {}.", request.entry_price),
                Some(regime),
            );
        }

        let (stop_loss_price, risk_per_share) = place_stop(request.entry_price, request.atr);

        let shares = (risk_amount / risk_per_share).floor().max(0.0) as i64;
        let mut lots = shares / LOT_SIZE;
        if lots == 0 {
            return EntryDecision::rejected(
                "REJECTED: Calculated position size is 0.".to_string(),
                Some(regime),
            );
        }

        let lot_cost = LOT_SIZE as f64 * request.entry_price;
        if lots as f64 * lot_cost > request.cash {
            let affordable = (request.cash / lot_cost).floor().max(0.0) as i64;
            if affordable < 1 {
                return EntryDecision::rejected(
                    "REJECTED: Insufficient Cash.".to_string(),
                    Some(regime),
                );
            }
            lots = affordable;
        }

        let reason = format!(
            "APPROVED: {} Market. Conviction: {}. Risk: {:.1}%. Size: {} Lots.",
            regime,
            if high_conviction { "HIGH" } else { "NORMAL" },
            risk_fraction * 100.0,
            lots
        );
        tracing::debug!(ticker = request.ticker, lots, stop_loss_price, %regime, "entry approved");

        EntryDecision {
            approved: true,
            reason,
            lots,
            stop_loss_price,
            regime: Some(regime),
        }
    }
}

/// Initial stop (entry - 3 × ATR, tick-rounded) and the risk per share it
/// implies. Falls back to a 5% width when the ATR stop leaves no risk.
pub fn place_stop(entry_price: f64, atr: f64) -> (i64, f64) {
    if atr.is_finite() {
        let stop = round_to_tick(entry_price - STOP_ATR_MULTIPLE * atr);
        let risk_per_share = entry_price - stop as f64;
        if risk_per_share > 0.0 {
            return (stop, risk_per_share);
        }
    }
    let risk_per_share = entry_price * FALLBACK_STOP_PCT;
    (round_to_tick(entry_price - risk_per_share), risk_per_share)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gatekeeper() -> RiskGatekeeper {
        RiskGatekeeper::new(RiskConfig::default(), BrokerClassification::default())
    }

    fn request<'a>(ratio: f64, buyer: &'a str) -> EntryRequest<'a> {
        EntryRequest {
            ticker: "BBCA",
            entry_price: 1000.0,
            cash: 100_000_000.0,
            equity: 100_000_000.0,
            accumulation_ratio: ratio,
            top_buyer: buyer,
            atr: 20.0,
        }
    }

    #[test]
    fn high_conviction_bullish_scenario() {
        let decision = gatekeeper().validate_entry_with_regime(&request(3.0, "AK"), MarketRegime::Bullish);
        assert!(decision.approved);
        assert_eq!(decision.stop_loss_price, 940);
        assert_eq!(decision.lots, 500);
        assert_eq!(decision.shares(), 50_000);
        assert_eq!(decision.regime, Some(MarketRegime::Bullish));
        assert_eq!(
            decision.reason,
            "APPROVED: BULLISH Market. Conviction: HIGH. Risk: 3.0%. Size: 500 Lots."
        );
    }

    #[test]
    fn defensive_regime_halves_size() {
        let decision =
            gatekeeper().validate_entry_with_regime(&request(3.0, "AK"), MarketRegime::Defensive);
        assert!(decision.approved);
        assert_eq!(decision.lots, 250);
        assert_eq!(decision.stop_loss_price, 940);
    }

    #[test]
    fn normal_conviction_uses_base_fraction() {
        let decision = gatekeeper().validate_entry_with_regime(&request(2.5, "AK"), MarketRegime::Bullish);
        // 100M × 1.5% = 1.5M / 60 = 25,000 shares
        assert_eq!(decision.lots, 250);
        assert!(decision.reason.contains("Conviction: NORMAL"));
        assert!(decision.reason.contains("Risk: 1.5%"));
    }

    #[test]
    fn retail_top_buyer_rejected() {
        let decision = gatekeeper().validate_entry_with_regime(&request(3.0, "YP"), MarketRegime::Bullish);
        assert!(!decision.approved);
        assert_eq!(decision.lots, 0);
        assert_eq!(decision.reason, "REJECTED: Top Buyer YP is Retail Crowd.");
        assert_eq!(decision.regime, None);
    }

    #[test]
    fn short_index_history_defaults_defensive() {
        let decision = gatekeeper().validate_entry(&request(3.0, "AK"), &[]);
        assert_eq!(decision.regime, Some(MarketRegime::Defensive));
        assert_eq!(decision.lots, 250);
    }

    #[test]
    fn zero_atr_falls_back_to_five_percent() {
        let mut req = request(3.0, "AK");
        req.atr = 0.0;
        let decision = gatekeeper().validate_entry_with_regime(&req, MarketRegime::Bullish);
        // risk per share 50 → 3M / 50 = 60,000 shares
        assert!(decision.approved);
        assert_eq!(decision.stop_loss_price, 950);
        assert_eq!(decision.lots, 600);
    }

    #[test]
    fn non_finite_atr_falls_back() {
        let (stop, rps) = place_stop(1000.0, f64::NAN);
        assert_eq!(stop, 950);
        assert_eq!(rps, 50.0);
    }

    #[test]
    fn cash_shortfall_shrinks_lots() {
        let mut req = request(3.0, "AK");
        req.cash = 20_050_000.0;
        let decision = gatekeeper().validate_entry_with_regime(&req, MarketRegime::Bullish);
        assert!(decision.approved);
        assert_eq!(decision.lots, 200);
    }

    #[test]
    fn cash_below_one_lot_rejected() {
        let mut req = request(3.0, "AK");
        req.cash = 99_999.0;
        let decision = gatekeeper().validate_entry_with_regime(&req, MarketRegime::Bullish);
        assert!(!decision.approved);
        assert_eq!(decision.reason, "REJECTED: Insufficient Cash.");
    }

    #[test]
    fn tiny_equity_sizes_to_zero() {
        let mut req = request(3.0, "AK");
        req.equity = 100_000.0;
        let decision = gatekeeper().validate_entry_with_regime(&req, MarketRegime::Bullish);
        assert!(!decision.approved);
        assert_eq!(decision.reason, "REJECTED: Calculated position size is 0.");
    }

    #[test]
    fn invalid_entry_price_rejected() {
        let mut req = request(3.0, "AK");
        req.entry_price = 0.0;
        let decision = gatekeeper().validate_entry_with_regime(&req, MarketRegime::Bullish);
        assert!(!decision.approved);
    }

    proptest! {
        #[test]
        fn retail_buyer_always_rejected(
            buyer in prop::sample::select(vec!["YP", "PD", "XC", "NI", "KK", "XL", "SQ"]),
            ratio in 0.0f64..10.0,
            equity in 1.0f64..1e12,
            atr in 0.0f64..500.0,
        ) {
            let req = EntryRequest { equity, atr, ..request(ratio, buyer) };
            let gk = gatekeeper();
            prop_assert!(!gk.validate_entry_with_regime(&req, MarketRegime::Bullish).approved);
            prop_assert!(!gk.validate_entry(&req, &[]).approved);
        }

        #[test]
        fn bullish_size_at_least_defensive(
            price in 50.0f64..20_000.0,
            atr in 0.0f64..500.0,
            ratio in 0.0f64..5.0,
            equity in 1e6f64..1e11,
            cash in 0.0f64..1e11,
        ) {
            let req = EntryRequest {
                ticker: "TEST",
                entry_price: price,
                cash,
                equity,
                accumulation_ratio: ratio,
                top_buyer: "AK",
                atr,
            };
            let gk = gatekeeper();
            let bull = gk.validate_entry_with_regime(&req, MarketRegime::Bullish);
            let def = gk.validate_entry_with_regime(&req, MarketRegime::Defensive);
            prop_assert!(bull.lots >= def.lots);
        }

        #[test]
        fn approved_entry_is_affordable(
            price in 50.0f64..20_000.0,
            atr in 0.0f64..500.0,
            cash in 0.0f64..1e10,
        ) {
            let req = EntryRequest { entry_price: price, atr, cash, ..request(3.0, "AK") };
            let decision = gatekeeper().validate_entry_with_regime(&req, MarketRegime::Bullish);
            if decision.approved {
                prop_assert!(decision.lots > 0);
                prop_assert!(decision.shares() as f64 * price <= cash * (1.0 + 1e-9));
            }
        }
    }
}
