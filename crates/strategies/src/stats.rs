// In crates/strategies/src/stats.rs

use crate::trendline::SignalRow;
use serde::Serialize;

/// The headline numbers shown next to a signal chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalSummary {
    pub last_price: f64,
    /// Last close minus the close before it (0 with a single row).
    pub price_change: f64,
    pub buy_signals: usize,
    pub sell_signals: usize,
}

impl SignalSummary {
    pub fn from_rows(rows: &[SignalRow]) -> Option<Self> {
        let last = rows.last()?;
        let price_change = match rows.len() {
            0 | 1 => 0.0,
            n => last.close - rows[n - 2].close,
        };
        Some(Self {
            last_price: last.close,
            price_change,
            buy_signals: rows.iter().filter(|r| r.long_cond).count(),
            sell_signals: rows.iter().filter(|r| r.short_cond).count(),
        })
    }

    pub fn total_signals(&self) -> usize {
        self.buy_signals + self.sell_signals
    }
}
