// --- Trade events and the notifiers that deliver them ---

use chrono::{DateTime, Utc};
use core_types::{Side, Symbol, Timeframe};
use serde::Serialize;
use std::fmt;

pub mod error;
pub mod notifier;

pub use error::{Error, Result};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};

/// Something a trading loop wants a human to know about.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum TradeEvent {
    Started {
        symbol: Symbol,
        timeframe: Timeframe,
    },
    PositionOpened {
        symbol: Symbol,
        timeframe: Timeframe,
        side: Side,
        price: f64,
        /// Open time of the confirmed bar that triggered the entry.
        bar_time: DateTime<Utc>,
    },
    PositionClosed {
        symbol: Symbol,
        side: Side,
        price: f64,
        /// Realized PnL in price units (one unit of the base asset).
        pnl: f64,
        bar_time: DateTime<Utc>,
    },
    LoopError {
        symbol: Symbol,
        message: String,
    },
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeEvent::Started { symbol, timeframe } => {
                write!(f, "🚀 Trading bot started on {} ({})", symbol, timeframe)
            }
            TradeEvent::PositionOpened { symbol, timeframe, side: Side::Long, price, .. } => {
                write!(f, "✅ BUY signal at {:.6} | {} | {}", price, symbol, timeframe)
            }
            TradeEvent::PositionOpened { symbol, timeframe, side: Side::Short, price, .. } => {
                write!(f, "🚨 SELL signal at {:.6} | {} | {}", price, symbol, timeframe)
            }
            TradeEvent::PositionClosed { symbol, side, price, pnl, .. } => {
                let side = match side {
                    Side::Long => "Long",
                    Side::Short => "Short",
                };
                write!(f, "❌ {} closed at {:.6} | PnL = {:.6} {}", side, price, pnl, symbol)
            }
            TradeEvent::LoopError { symbol, message } => write!(f, "⚠️ Bot error on {}: {}", symbol, message),
        }
    }
}
