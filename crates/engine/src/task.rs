use crate::position::{Position, PositionStateMachine};
use crate::{Error, Result};
use app_config::BotSettings;
use core_types::{Signal, Symbol, Timeframe};
use events::{Notifier, TradeEvent};
use market_data::MarketDataSource;
use std::sync::Arc;
use std::time::Duration;
use strategies::{Strategy, TrendlineSettings};
use tokio::sync::watch;

/// Timing and sizing of one poll loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    /// Number of candles requested per fetch.
    pub history: usize,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
}

impl PollSettings {
    pub fn new(bot: &BotSettings, strategy: &TrendlineSettings) -> Self {
        Self {
            history: bot.history_len(strategy),
            poll_interval: Duration::from_secs(bot.poll_seconds),
            fetch_timeout: Duration::from_secs(bot.fetch_timeout_seconds),
        }
    }
}

/// What one iteration ended up doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Not enough candles for a confirmed bar.
    Skipped { candles: usize },
    /// The confirmed bar was already acted upon by an earlier iteration.
    AlreadyProcessed { open_time: i64 },
    Evaluated { open_time: i64, signal: Signal, events: usize },
}

/// A self-contained task that polls and trades a single asset.
pub struct TradingTask {
    symbol: Symbol,
    timeframe: Timeframe,
    strategy: Box<dyn Strategy + Send + Sync>,
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn Notifier>,
    poll: PollSettings,
    machine: PositionStateMachine,
    // Open time of the last confirmed bar handed to the state machine.
    last_confirmed: Option<i64>,
}

impl TradingTask {
    pub fn new(
        symbol: Symbol,
        timeframe: Timeframe,
        strategy: Box<dyn Strategy + Send + Sync>,
        source: Arc<dyn MarketDataSource>,
        notifier: Arc<dyn Notifier>,
        poll: PollSettings,
    ) -> Self {
        Self {
            machine: PositionStateMachine::new(symbol.clone(), timeframe),
            symbol,
            timeframe,
            strategy,
            source,
            notifier,
            poll,
            last_confirmed: None,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn position(&self) -> Position {
        self.machine.position()
    }

    pub fn machine(&self) -> &PositionStateMachine {
        &self.machine
    }

    /// Runs a single fetch → compute → evaluate → apply pass.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let fetch = self.source.fetch(&self.symbol, self.timeframe, self.poll.history);
        let series = tokio::time::timeout(self.poll.fetch_timeout, fetch)
            .await
            .map_err(|_| Error::FetchTimeout(self.poll.fetch_timeout))??;

        if series.len() < 2 {
            return Ok(TickOutcome::Skipped { candles: series.len() });
        }
        let Some(assessment) = self.strategy.assess(&series)? else {
            return Ok(TickOutcome::Skipped { candles: series.len() });
        };

        let open_time = assessment.confirmed.open_time;
        if self.last_confirmed.is_some_and(|last| open_time <= last) {
            return Ok(TickOutcome::AlreadyProcessed { open_time });
        }
        self.last_confirmed = Some(open_time);

        let transition = self.machine.apply(assessment.signal, &assessment.confirmed);
        if let Some(closed) = &transition.closed {
            tracing::info!(symbol = %self.symbol, side = ?closed.side, pnl = closed.pnl, "Position closed.");
        }
        for event in &transition.events {
            self.notify(event).await;
        }

        Ok(TickOutcome::Evaluated {
            open_time,
            signal: assessment.signal,
            events: transition.events.len(),
        })
    }

    /// The main, long-running loop for this trading task.
    ///
    /// Iteration errors are logged and reported, never propagated. The loop
    /// exits once `shutdown` turns true or its sender is dropped.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            symbol = %self.symbol,
            timeframe = %self.timeframe,
            strategy = self.strategy.name(),
            source = self.source.name(),
            "Starting trading task."
        );
        self.notify(&TradeEvent::Started {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
        })
        .await;

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.tick().await {
                Ok(TickOutcome::Skipped { candles }) => {
                    tracing::warn!(symbol = %self.symbol, candles, "Not enough data for a confirmed bar.");
                }
                Ok(TickOutcome::AlreadyProcessed { open_time }) => {
                    tracing::debug!(symbol = %self.symbol, open_time, "Confirmed bar already processed.");
                }
                Ok(TickOutcome::Evaluated { open_time, signal, events }) => {
                    tracing::info!(symbol = %self.symbol, open_time, ?signal, events, "Confirmed bar evaluated.");
                }
                Err(e) => {
                    tracing::error!(symbol = %self.symbol, error = %e, transient = e.is_transient(), "Trading loop iteration failed.");
                    self.notify(&TradeEvent::LoopError {
                        symbol: self.symbol.clone(),
                        message: e.to_string(),
                    })
                    .await;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!(
            symbol = %self.symbol,
            position = ?self.machine.position(),
            realized_pnl = self.machine.realized_pnl(),
            "Trading task stopped."
        );
    }

    async fn notify(&self, event: &TradeEvent) {
        if let Err(e) = self.notifier.notify(&event.to_string()).await {
            tracing::warn!(symbol = %self.symbol, error = %e, "Failed to deliver notification.");
        }
    }
}
