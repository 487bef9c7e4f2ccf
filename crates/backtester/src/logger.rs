// In crates/backtester/src/logger.rs

use chrono::{DateTime, Utc};
use engine::ClosedTrade;
use serde::Serialize;

/// Realized PnL after a bar has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub realized_pnl: f64,
}

/// A logger responsible for recording trades and equity changes during a replay.
#[derive(Debug, Default)]
pub struct TradeLogger {
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl TradeLogger {
    /// Creates a new, empty logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a point in the equity curve.
    pub fn record_equity(&mut self, open_time: i64, realized_pnl: f64) {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(open_time).unwrap_or_default();
        self.equity_curve.push(EquityPoint { timestamp, realized_pnl });
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        tracing::debug!(side = ?trade.side, entry = trade.entry_price, exit = trade.exit_price, pnl = trade.pnl, "Trade closed.");
        self.trades.push(trade);
    }

    /// Largest peak-to-trough fall of the realized PnL curve, as a positive number.
    pub fn max_drawdown(&self) -> f64 {
        let mut peak = 0.0_f64;
        let mut worst = 0.0_f64;
        for point in &self.equity_curve {
            peak = peak.max(point.realized_pnl);
            worst = worst.max(peak - point.realized_pnl);
        }
        worst
    }
}
