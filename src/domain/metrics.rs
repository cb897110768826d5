//! End-of-run summary statistics.

use super::portfolio::{EquityPoint, PortfolioState};
use super::position::TradeAction;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    pub ticker: String,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub profit: f64,
    pub profit_pct: f64,
    pub trade_count: usize,
    pub round_trips: usize,
    pub win_rate: f64,
    pub max_drawdown: f64,
}

impl BacktestSummary {
    pub fn compute(ticker: &str, portfolio: &PortfolioState) -> Self {
        let initial_capital = portfolio.initial_capital;
        let final_equity = portfolio
            .equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);
        let profit = final_equity - initial_capital;
        let profit_pct = if initial_capital > 0.0 {
            profit / initial_capital * 100.0
        } else {
            0.0
        };

        let realized: Vec<f64> = portfolio
            .trades
            .iter()
            .filter(|t| t.action == TradeAction::Sell)
            .filter_map(|t| t.pnl)
            .collect();
        let wins = realized.iter().filter(|&&pnl| pnl > 0.0).count();
        let win_rate = if realized.is_empty() {
            0.0
        } else {
            wins as f64 / realized.len() as f64
        };

        BacktestSummary {
            ticker: ticker.to_string(),
            initial_capital,
            final_equity,
            profit,
            profit_pct,
            trade_count: portfolio.trades.len(),
            round_trips: realized.len(),
            win_rate,
            max_drawdown: max_drawdown(&portfolio.equity_curve),
        }
    }
}

/// Largest peak-to-trough decline as a fraction of the peak.
pub fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for point in curve {
        peak = peak.max(point.equity);
        if peak > 0.0 {
            worst = worst.max((peak - point.equity) / peak);
        }
    }
    worst
}
