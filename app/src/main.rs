// In app/src/main.rs

use anyhow::{Context, Result};
use app_config::{MarketDataSettings, Settings, SourceKind};
use backtester::{Backtester, ReplayReport};
use clap::{Parser, Subcommand};
use core_types::{Symbol, Timeframe};
use engine::Engine;
use events::{LogNotifier, Notifier, TelegramNotifier};
use market_data::{BinanceSource, MarketDataSource, SyntheticSource};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use strategies::{SignalRow, SignalSummary, TrendlinePipeline, evaluator};
use tokio::sync::watch;
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A trendline continuation signal bot.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs one polling loop per enabled pair of `config/live.toml` until Ctrl-C.
    Run,

    /// Fetches candles once and prints the latest signal for each symbol.
    Signals {
        /// The trading symbols to inspect (e.g., "BTCUSDT").
        #[arg(short, long, value_delimiter = ',', default_value = "DOGEUSDT")]
        symbols: Vec<String>,

        /// The candle interval (e.g., "5m", "1h").
        #[arg(short, long, default_value = "5m")]
        timeframe: String,

        /// Number of candles to fetch. Defaults to the strategy look-back plus the history margin.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print the latest values and the signal statistics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Replays historical candles through the strategy and the position state machine.
    Backtest {
        /// The trading symbol to backtest (e.g., "BTCUSDT").
        #[arg(short, long, default_value = "DOGEUSDT")]
        symbol: String,

        /// The candle interval (e.g., "5m", "1h").
        #[arg(short, long, default_value = "5m")]
        timeframe: String,

        /// Number of candles to replay.
        #[arg(short, long, default_value_t = 1000)]
        limit: usize,

        /// Print the full report as JSON.
        #[arg(long)]
        json: bool,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings().context("Failed to load application settings")?;
    init_tracing(&settings.app.log_level);

    tracing::info!(environment = %settings.app.environment, "Starting trendline-bot");

    // Match on the parsed command and call the appropriate handler.
    match cli.command {
        Commands::Run => {
            run_app(settings).await?;
        }
        Commands::Signals {
            symbols,
            timeframe,
            limit,
            json,
        } => {
            handle_signals(&settings, symbols, &timeframe, limit, json).await?;
        }
        Commands::Backtest {
            symbol,
            timeframe,
            limit,
            json,
        } => {
            handle_backtest(&settings, symbol, &timeframe, limit, json).await?;
        }
    }

    tracing::info!("trendline-bot has finished successfully.");

    Ok(())
}

fn init_tracing(log_level: &str) {
    let level = tracing::Level::from_str(log_level).unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::filter::Targets::new()
            .with_target("hyper", tracing::Level::WARN)
            .with_target("hyper_util", tracing::Level::WARN)
            .with_target("reqwest", tracing::Level::WARN)
            .with_default(level),
    );
    tracing_subscriber::registry().with(fmt_layer).init();
}

// --- Component Construction ---

fn build_source(settings: &MarketDataSettings) -> Result<Arc<dyn MarketDataSource>> {
    let source: Arc<dyn MarketDataSource> = match settings.source {
        SourceKind::Binance => {
            tracing::info!(base_url = %settings.rest_base_url, "Using the Binance market data feed.");
            Arc::new(BinanceSource::new(
                settings.rest_base_url.clone(),
                Duration::from_secs(settings.request_timeout_seconds),
            )?)
        }
        SourceKind::Synthetic => {
            tracing::warn!("Using SYNTHETIC market data. Prices are simulated.");
            Arc::new(SyntheticSource::new())
        }
    };
    Ok(source)
}

fn build_notifier(settings: &Settings) -> Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match &settings.telegram {
        Some(telegram) => {
            tracing::info!("Notifications will be sent to Telegram.");
            Arc::new(TelegramNotifier::new(
                telegram.token.clone(),
                telegram.chat_id.clone(),
                Duration::from_secs(settings.market_data.request_timeout_seconds),
            )?)
        }
        None => {
            tracing::info!("No Telegram credentials configured. Notifications go to the log.");
            Arc::new(LogNotifier)
        }
    };
    Ok(notifier)
}

fn parse_timeframe(timeframe: &str) -> Result<Timeframe> {
    Timeframe::from_str(timeframe).with_context(|| format!("Unsupported timeframe {:?}", timeframe))
}

// --- "Run" Subcommand Logic ---

/// Starts the trading engine and runs until Ctrl-C.
async fn run_app(settings: Settings) -> Result<()> {
    let live_config = app_config::load_live_config().context("Failed to load config/live.toml")?;
    settings
        .validate_live(&live_config)
        .context("config/live.toml does not fit the application settings")?;
    let source = build_source(&settings.market_data)?;
    let notifier = build_notifier(&settings)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown requested, stopping after the current iteration."),
            Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C, stopping."),
        }
        shutdown_tx.send_replace(true);
    });

    let trading_engine = Engine::new(live_config, settings, source, notifier);
    trading_engine.run(shutdown_rx).await
}

// --- "Signals" Subcommand Logic ---

async fn handle_signals(
    settings: &Settings,
    symbols: Vec<String>,
    timeframe: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let timeframe = parse_timeframe(timeframe)?;
    let source = build_source(&settings.market_data)?;
    let pipeline = TrendlinePipeline::new(settings.strategy)?;
    let limit = limit.unwrap_or(settings.bot.history_len(&settings.strategy));
    let mut reports = Vec::new();

    for symbol in symbols.into_iter().map(Symbol) {
        tracing::info!(%symbol, %timeframe, limit, "Computing signals.");
        let result = async {
            let series = source.fetch(&symbol, timeframe, limit).await?;
            anyhow::Ok(pipeline.compute(&series)?)
        }
        .await;

        match result {
            Ok(frame) if json => reports.push(signal_report_json(&symbol, timeframe, frame.rows())),
            Ok(frame) => print_signal_report(&symbol, timeframe, frame.rows()),
            Err(e) => tracing::error!(%symbol, error = %e, "Failed to compute signals."),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

fn signal_report_json(symbol: &Symbol, timeframe: Timeframe, rows: &[SignalRow]) -> serde_json::Value {
    let confirmed = evaluator::confirmed_row(rows);
    serde_json::json!({
        "symbol": symbol,
        "timeframe": timeframe,
        "candles": rows.len(),
        "latest": rows.last(),
        "confirmed": confirmed,
        "signal": confirmed.map(evaluator::evaluate),
        "stats": SignalSummary::from_rows(rows),
    })
}

fn print_signal_report(symbol: &Symbol, timeframe: Timeframe, rows: &[SignalRow]) {
    println!("\n--- {} {} ({} candles) ---", symbol, timeframe, rows.len());
    let Some(last) = rows.last() else {
        println!("No data.");
        return;
    };
    println!("Price:      {:.6}", last.close);
    println!("SG (EMA):   {:.6}", last.sg);
    println!("Trendline:  {}", format_optional(last.trendline));
    println!("Slope:      {}", format_optional(last.slope_blue));

    match evaluator::confirmed_row(rows) {
        Some(confirmed) => println!(
            "Confirmed bar signal: {:?} (close {:.6})",
            evaluator::evaluate(confirmed),
            confirmed.close
        ),
        None => println!("Confirmed bar signal: not enough candles"),
    }

    if let Some(summary) = SignalSummary::from_rows(rows) {
        println!(
            "Last price change: {:+.6} | Buy signals: {} | Sell signals: {} | Total: {}",
            summary.price_change,
            summary.buy_signals,
            summary.sell_signals,
            summary.total_signals()
        );
    }
}

fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.6}", v))
}

// --- "Backtest" Subcommand Logic ---

/// Handles the logic for the `backtest` subcommand.
async fn handle_backtest(settings: &Settings, symbol: String, timeframe: &str, limit: usize, json: bool) -> Result<()> {
    let timeframe = parse_timeframe(timeframe)?;
    let symbol = Symbol(symbol);
    let source = build_source(&settings.market_data)?;

    tracing::info!(%symbol, %timeframe, limit, "Loading historical data for backtest...");
    let series = source.fetch(&symbol, timeframe, limit).await?;
    // The newest candle is still forming.
    let closed = series.prefix(series.len().saturating_sub(1));
    tracing::info!("Loaded {} closed candles.", closed.len());

    let backtester = Backtester::new(symbol, timeframe, settings.strategy)?;
    let report = backtester.run(&closed)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_backtest_report(&report);
    }
    Ok(())
}

/// Helper function to print the final replay summary.
fn print_backtest_report(report: &ReplayReport) {
    println!("\n--- Backtest {} {} ---", report.symbol, report.timeframe);
    println!("Candles: {} | Buy signals: {} | Sell signals: {}", report.candles, report.buy_signals, report.sell_signals);
    println!(
        "Closed trades: {} | Win rate: {:.1}% | Realized PnL: {:.6} | Max drawdown: {:.6}",
        report.trades.len(),
        report.win_rate() * 100.0,
        report.realized_pnl,
        report.max_drawdown
    );
    for trade in report.trades.iter().rev().take(10).rev() {
        let exit = chrono::DateTime::from_timestamp_millis(trade.exit_time)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "  {} {:?}: {:.6} -> {:.6} | PnL {:+.6}",
            exit, trade.side, trade.entry_price, trade.exit_price, trade.pnl
        );
    }
    println!("Open position at the end: {:?}", report.final_position);
}
