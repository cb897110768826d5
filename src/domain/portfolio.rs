//! Simulated cash/position state and equity tracking for one ticker.

use chrono::NaiveDate;

use super::position::{Position, TradeAction, TradeRecord};
use super::signal::StrategyKind;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Details of an opening fill.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyOrder<'a> {
    pub ticker: &'a str,
    pub date: NaiveDate,
    pub price: f64,
    pub shares: i64,
    pub stop_loss: i64,
    pub strategy: StrategyKind,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        PortfolioState {
            cash: initial_capital,
            initial_capital,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn shares_held(&self) -> i64 {
        self.position.as_ref().map_or(0, |p| p.shares)
    }

    /// cash + shares_held × close
    pub fn total_value(&self, close: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(close))
    }

    /// Open a position. Returns `None` without touching state when already
    /// long, the share count is not positive, or cash does not cover the cost.
    pub fn buy(&mut self, order: &BuyOrder<'_>) -> Option<&TradeRecord> {
        if self.position.is_some() || order.shares <= 0 {
            return None;
        }
        let cost = order.shares as f64 * order.price;
        if cost > self.cash {
            return None;
        }

        self.cash -= cost;
        self.position = Some(Position {
            ticker: order.ticker.to_string(),
            shares: order.shares,
            entry_price: order.price,
            entry_date: order.date,
            initial_stop: order.stop_loss,
            strategy: order.strategy,
        });
        self.trades.push(TradeRecord {
            ticker: order.ticker.to_string(),
            date: order.date,
            action: TradeAction::Buy,
            price: order.price,
            shares: order.shares,
            pnl: None,
        });
        self.trades.last()
    }

    /// Liquidate the whole position at `price`.
    pub fn sell_all(&mut self, date: NaiveDate, price: f64) -> Option<&TradeRecord> {
        let position = self.position.take()?;
        let pnl = self
            .last_buy(&position.ticker)
            .map(|buy| position.shares as f64 * (price - buy.price));

        self.cash += position.shares as f64 * price;
        self.trades.push(TradeRecord {
            ticker: position.ticker,
            date,
            action: TradeAction::Sell,
            price,
            shares: position.shares,
            pnl,
        });
        self.trades.last()
    }

    /// Most recent BUY for `ticker`.
    pub fn last_buy(&self, ticker: &str) -> Option<&TradeRecord> {
        self.trades
            .iter()
            .rev()
            .find(|t| t.action == TradeAction::Buy && t.ticker == ticker)
    }

    pub fn record_equity(&mut self, date: NaiveDate, close: f64) {
        let equity = self.total_value(close);
        self.equity_curve.push(EquityPoint { date, equity });
    }
}
