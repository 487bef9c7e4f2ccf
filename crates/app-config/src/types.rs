// In crates/app-config/src/types.rs

use core_types::{Symbol, Timeframe};
use serde::Deserialize;
use strategies::TrendlineSettings;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Default parameters of the trendline strategy.
    #[serde(default)]
    pub strategy: TrendlineSettings,
    #[serde(default)]
    pub bot: BotSettings,
    #[serde(default)]
    pub market_data: MarketDataSettings,
    /// Without credentials, notifications only go to the log.
    pub telegram: Option<TelegramSettings>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

/// Timing of the poll loop.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BotSettings {
    /// Pause between two iterations.
    pub poll_seconds: u64,
    /// Candles fetched on top of the longest indicator look-back.
    pub history_margin: usize,
    /// Upper bound for one fetch, network included.
    pub fetch_timeout_seconds: u64,
}

impl BotSettings {
    /// Number of candles one fetch requests for a strategy with these parameters.
    pub fn history_len(&self, strategy: &TrendlineSettings) -> usize {
        strategy.longest_lookback() + self.history_margin
    }
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            poll_seconds: 300,
            history_margin: 55,
            fetch_timeout_seconds: 30,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Synthetic,
    Binance,
}

impl SourceKind {
    /// The largest number of candles one request to this source may ask for.
    pub fn max_fetch(&self) -> Option<usize> {
        match self {
            SourceKind::Synthetic => None,
            SourceKind::Binance => Some(market_data::binance::MAX_KLINES_PER_REQUEST),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MarketDataSettings {
    pub source: SourceKind,
    /// The REST API base URL for Binance.
    pub rest_base_url: String,
    pub request_timeout_seconds: u64,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            source: SourceKind::Synthetic,
            rest_base_url: "https://api.binance.com".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct TelegramSettings {
    pub token: String,
    pub chat_id: String,
}

// --- Structs for live.toml Configuration ---

/// The list of pairs to trade.
#[derive(Deserialize, Debug, Clone)]
pub struct LiveConfig {
    #[serde(rename = "pairs")]
    pub pair_configs: Vec<PairConfig>,
}

/// Configuration for a single trading pair/asset.
#[derive(Deserialize, Debug, Clone)]
pub struct PairConfig {
    pub symbol: Symbol,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Overrides the global `[strategy]` section for this pair only.
    pub strategy: Option<TrendlineSettings>,
}

impl PairConfig {
    pub fn strategy_or<'a>(&'a self, default: &'a TrendlineSettings) -> &'a TrendlineSettings {
        self.strategy.as_ref().unwrap_or(default)
    }
}

impl LiveConfig {
    pub fn enabled_pairs(&self) -> impl Iterator<Item = &PairConfig> {
        self.pair_configs.iter().filter(|p| p.enabled)
    }
}

/// Helper functions for serde defaults
fn default_enabled() -> bool {
    true
}
