// In crates/backtester/src/lib.rs

pub mod logger;

use crate::logger::{EquityPoint, TradeLogger};
use core_types::{CandleSeries, Symbol, Timeframe};
use engine::{ClosedTrade, Position, PositionStateMachine};
use serde::Serialize;
use strategies::evaluator::evaluate;
use strategies::{TrendlinePipeline, TrendlineSettings};

/// The outcome of replaying a series through the live decision path.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub candles: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub trades: Vec<ClosedTrade>,
    pub realized_pnl: f64,
    pub winning_trades: usize,
    pub max_drawdown: f64,
    /// Still open at the end of the replay, not counted in `realized_pnl`.
    pub final_position: Position,
    pub equity_curve: Vec<EquityPoint>,
}

impl ReplayReport {
    /// Share of closed trades with a positive PnL, 0 without trades.
    pub fn win_rate(&self) -> f64 {
        if self.trades.is_empty() {
            0.0
        } else {
            self.winning_trades as f64 / self.trades.len() as f64
        }
    }
}

/// Replays closed historical candles through the trendline pipeline and the
/// position state machine.
///
/// Every candle handed to [`Backtester::run`] is treated as confirmed, so the
/// caller must leave out a candle that is still forming.
pub struct Backtester {
    /// The symbol to be tested.
    pub symbol: Symbol,
    /// The timeframe interval for the test.
    pub timeframe: Timeframe,
    pipeline: TrendlinePipeline,
}

impl Backtester {
    pub fn new(symbol: Symbol, timeframe: Timeframe, settings: TrendlineSettings) -> anyhow::Result<Self> {
        Ok(Self {
            symbol,
            timeframe,
            pipeline: TrendlinePipeline::new(settings)?,
        })
    }

    pub fn run(&self, candles: &CandleSeries) -> anyhow::Result<ReplayReport> {
        tracing::info!(symbol = %self.symbol, timeframe = %self.timeframe, candles = candles.len(), "Starting replay.");

        let mut frame = self.pipeline.frame()?;
        let mut machine = PositionStateMachine::new(self.symbol.clone(), self.timeframe);
        let mut logger = TradeLogger::new();
        let (mut buy_signals, mut sell_signals) = (0, 0);

        for candle in candles {
            let row = frame.push(candle)?;
            buy_signals += usize::from(row.long_cond);
            sell_signals += usize::from(row.short_cond);

            let transition = machine.apply(evaluate(row), row);
            if let Some(trade) = transition.closed {
                logger.record_trade(trade);
            }
            logger.record_equity(row.open_time, machine.realized_pnl());
        }

        let max_drawdown = logger.max_drawdown();
        let report = ReplayReport {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            candles: candles.len(),
            buy_signals,
            sell_signals,
            trades: logger.trades,
            realized_pnl: machine.realized_pnl(),
            winning_trades: machine.winning_trades(),
            max_drawdown,
            final_position: machine.position(),
            equity_curve: logger.equity_curve,
        };

        tracing::info!(
            symbol = %self.symbol,
            trades = report.trades.len(),
            realized_pnl = report.realized_pnl,
            win_rate = report.win_rate(),
            "Replay complete."
        );
        Ok(report)
    }
}
