// In crates/engine/src/lib.rs

pub mod error;
pub mod position;
pub mod task;

use crate::task::{PollSettings, TradingTask};
use anyhow::Context;
use app_config::{LiveConfig, Settings};
use events::Notifier;
use futures::future;
use market_data::MarketDataSource;
use std::sync::Arc;
use strategies::TrendlineContinuation;
use tokio::sync::watch;

pub use error::{Error, Result};
pub use position::{ClosedTrade, Position, PositionStateMachine, Transition};
pub use task::TickOutcome;

/// The orchestrator for all trading loops.
pub struct Engine {
    live_config: LiveConfig,
    app_config: Settings,
    source: Arc<dyn MarketDataSource>,
    notifier: Arc<dyn Notifier>,
}

impl Engine {
    pub fn new(
        live_config: LiveConfig,
        app_config: Settings,
        source: Arc<dyn MarketDataSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            live_config,
            app_config,
            source,
            notifier,
        }
    }

    /// Builds one `TradingTask` per enabled pair.
    pub fn build_tasks(&self) -> anyhow::Result<Vec<TradingTask>> {
        let mut tasks = Vec::new();

        for pair_config in self.live_config.pair_configs.iter().filter(|p| !p.enabled) {
            tracing::warn!(symbol = %pair_config.symbol, "Skipping disabled trading pair.");
        }

        for pair_config in self.live_config.enabled_pairs() {
            tracing::info!(symbol = %pair_config.symbol, timeframe = %pair_config.timeframe, "Setting up trading task.");

            let settings = *pair_config.strategy_or(&self.app_config.strategy);
            let strategy = TrendlineContinuation::new(settings)
                .with_context(|| format!("Invalid strategy parameters for {}", pair_config.symbol))?;
            let poll = PollSettings::new(&self.app_config.bot, &settings);
            if let Some(max) = self.source.max_fetch() {
                if poll.history > max {
                    anyhow::bail!(
                        "{} needs {} candles per fetch but the {} source serves at most {}",
                        pair_config.symbol,
                        poll.history,
                        self.source.name(),
                        max
                    );
                }
            }

            tasks.push(TradingTask::new(
                pair_config.symbol.clone(),
                pair_config.timeframe,
                Box::new(strategy),
                self.source.clone(),
                self.notifier.clone(),
                poll,
            ));
        }

        Ok(tasks)
    }

    /// Spawns a `TradingTask` for each enabled pair and waits until all of them stop.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        tracing::info!("Initializing trading engine...");

        let tasks = self.build_tasks()?;
        if tasks.is_empty() {
            anyhow::bail!("No trading tasks were started. Check your live.toml configuration.");
        }

        let task_handles: Vec<_> = tasks
            .into_iter()
            .map(|mut task| {
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    task.run(shutdown).await;
                    task
                })
            })
            .collect();

        tracing::info!(count = task_handles.len(), "All trading tasks have been spawned.");

        // Tasks only return once the shutdown signal fires.
        for result in future::join_all(task_handles).await {
            match result {
                Ok(task) => tracing::info!(
                    symbol = %task.symbol(),
                    closed_trades = task.machine().closed_trades(),
                    realized_pnl = task.machine().realized_pnl(),
                    "Trading task finished."
                ),
                Err(e) => tracing::error!(error = %e, "A trading task panicked."),
            }
        }

        Ok(())
    }
}
