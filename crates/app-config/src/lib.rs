// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};
use std::path::Path;
use strategies::TrendlineSettings;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    AppSettings, BotSettings, LiveConfig, MarketDataSettings, PairConfig, Settings, SourceKind, TelegramSettings,
};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());
    load_settings_from(Path::new("config"), &environment)
}

/// Same as [`load_settings`], reading the files from `dir`.
pub fn load_settings_from(dir: &Path, environment: &str) -> Result<Settings> {
    let settings = Config::builder()
        // 1. Load the base configuration file.
        .add_source(File::with_name(&dir.join("base").to_string_lossy()))
        // 2. Load the environment-specific configuration file.
        .add_source(File::with_name(&dir.join(environment).to_string_lossy()).required(false))
        // 3. Load settings from environment variables (e.g., `APP__BOT__POLL_SECONDS=60`).
        // The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Deserialize the configuration into our `Settings` struct.
    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

/// Loads the list of trading pairs from `config/live.toml`.
pub fn load_live_config() -> Result<LiveConfig> {
    load_live_config_from(Path::new("config/live.toml"))
}

pub fn load_live_config_from(path: &Path) -> Result<LiveConfig> {
    let content = std::fs::read_to_string(path)?;
    parse_live_config(&content)
}

pub fn parse_live_config(content: &str) -> Result<LiveConfig> {
    let config: LiveConfig = toml::from_str(content)?;
    for pair in &config.pair_configs {
        if pair.symbol.0.trim().is_empty() {
            return Err(Error::Invalid("pair symbol must not be empty".to_string()));
        }
        if let Some(strategy) = &pair.strategy {
            strategy
                .validate()
                .map_err(|e| Error::Invalid(format!("strategy override for {}: {}", pair.symbol, e)))?;
        }
    }
    Ok(config)
}

impl Settings {
    /// Rejects settings that would make the trading loop misbehave.
    pub fn validate(&self) -> Result<()> {
        self.strategy
            .validate()
            .map_err(|e| Error::Invalid(format!("strategy: {}", e)))?;
        self.check_fetch_size("strategy", &self.strategy)?;
        if self.bot.poll_seconds == 0 {
            return Err(Error::Invalid("bot.poll_seconds must be greater than 0".to_string()));
        }
        if self.bot.fetch_timeout_seconds == 0 {
            return Err(Error::Invalid("bot.fetch_timeout_seconds must be greater than 0".to_string()));
        }
        if self.market_data.request_timeout_seconds == 0 {
            return Err(Error::Invalid(
                "market_data.request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.market_data.source == SourceKind::Binance && self.market_data.rest_base_url.trim().is_empty() {
            return Err(Error::Invalid("market_data.rest_base_url is required for the binance source".to_string()));
        }
        if let Some(telegram) = &self.telegram {
            if telegram.token.trim().is_empty() || telegram.chat_id.trim().is_empty() {
                return Err(Error::Invalid("telegram.token and telegram.chat_id must both be set".to_string()));
            }
        }
        Ok(())
    }

    /// Checks the per-pair strategy overrides of `live` against these settings.
    pub fn validate_live(&self, live: &LiveConfig) -> Result<()> {
        for pair in live.enabled_pairs() {
            if let Some(strategy) = &pair.strategy {
                self.check_fetch_size(&format!("strategy override for {}", pair.symbol), strategy)?;
            }
        }
        Ok(())
    }

    fn check_fetch_size(&self, label: &str, strategy: &TrendlineSettings) -> Result<()> {
        let history = self.bot.history_len(strategy);
        match self.market_data.source.max_fetch() {
            Some(max) if history > max => Err(Error::Invalid(format!(
                "{}: fetching {} candles (longest look-back {} + bot.history_margin {}) exceeds the {} limit of {}",
                label,
                history,
                strategy.longest_lookback(),
                self.bot.history_margin,
                source_name(self.market_data.source),
                max
            ))),
            _ => Ok(()),
        }
    }
}

fn source_name(source: SourceKind) -> &'static str {
    match source {
        SourceKind::Synthetic => "synthetic",
        SourceKind::Binance => "binance",
    }
}
