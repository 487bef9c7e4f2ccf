// In crates/engine/src/position.rs

use chrono::{DateTime, Utc};
use core_types::{Side, Signal, Symbol, Timeframe};
use events::TradeEvent;
use serde::Serialize;
use strategies::SignalRow;

/// The single position a trading loop may hold.
///
/// The entry price only exists while a position is open.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum Position {
    #[default]
    Flat,
    Long { entry_price: f64, entry_time: i64 },
    Short { entry_price: f64, entry_time: i64 },
}

impl Position {
    pub fn side(&self) -> Option<Side> {
        match self {
            Position::Flat => None,
            Position::Long { .. } => Some(Side::Long),
            Position::Short { .. } => Some(Side::Short),
        }
    }

    pub fn entry_price(&self) -> Option<f64> {
        match *self {
            Position::Flat => None,
            Position::Long { entry_price, .. } | Position::Short { entry_price, .. } => Some(entry_price),
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Position::Flat)
    }
}

/// A round trip that has been closed by a reversal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: i64,
    pub exit_price: f64,
    pub exit_time: i64,
    /// Per unit of the base asset, fees not included.
    pub pnl: f64,
}

/// What a single `apply` call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    /// Events to forward to the notifier, in order.
    pub events: Vec<TradeEvent>,
    pub closed: Option<ClosedTrade>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Flat/Long/Short bookkeeping with realized PnL.
///
/// Only the confirmed bar's close is used as a fill price. A signal for the
/// side already held, or `NoAction`, changes nothing.
#[derive(Debug, Clone)]
pub struct PositionStateMachine {
    symbol: Symbol,
    timeframe: Timeframe,
    position: Position,
    realized_pnl: f64,
    closed_trades: usize,
    winning_trades: usize,
}

impl PositionStateMachine {
    pub fn new(symbol: Symbol, timeframe: Timeframe) -> Self {
        Self {
            symbol,
            timeframe,
            position: Position::Flat,
            realized_pnl: 0.0,
            closed_trades: 0,
            winning_trades: 0,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn closed_trades(&self) -> usize {
        self.closed_trades
    }

    pub fn winning_trades(&self) -> usize {
        self.winning_trades
    }

    pub fn apply(&mut self, signal: Signal, confirmed: &SignalRow) -> Transition {
        let target = match signal {
            Signal::NoAction => return Transition::default(),
            Signal::EnterLong => Side::Long,
            Signal::EnterShort => Side::Short,
        };
        if self.position.side() == Some(target) {
            return Transition::default();
        }

        let price = confirmed.close;
        let bar_time = DateTime::<Utc>::from_timestamp_millis(confirmed.open_time).unwrap_or_default();
        let mut transition = Transition::default();

        if let Some(closed) = self.close(price, confirmed.open_time) {
            transition.events.push(TradeEvent::PositionClosed {
                symbol: self.symbol.clone(),
                side: closed.side,
                price,
                pnl: closed.pnl,
                bar_time,
            });
            transition.closed = Some(closed);
        }

        self.position = match target {
            Side::Long => Position::Long {
                entry_price: price,
                entry_time: confirmed.open_time,
            },
            Side::Short => Position::Short {
                entry_price: price,
                entry_time: confirmed.open_time,
            },
        };
        transition.events.push(TradeEvent::PositionOpened {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            side: target,
            price,
            bar_time,
        });
        transition
    }

    fn close(&mut self, exit_price: f64, exit_time: i64) -> Option<ClosedTrade> {
        let (side, entry_price, entry_time, pnl) = match self.position {
            Position::Flat => return None,
            Position::Long { entry_price, entry_time } => (Side::Long, entry_price, entry_time, exit_price - entry_price),
            Position::Short { entry_price, entry_time } => {
                (Side::Short, entry_price, entry_time, entry_price - exit_price)
            }
        };
        self.position = Position::Flat;
        self.realized_pnl += pnl;
        self.closed_trades += 1;
        if pnl > 0.0 {
            self.winning_trades += 1;
        }
        Some(ClosedTrade {
            side,
            entry_price,
            entry_time,
            exit_price,
            exit_time,
            pnl,
        })
    }
}
