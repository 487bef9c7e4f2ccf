// In crates/market-data/src/binance.rs

use crate::{Error, MarketDataSource, Result};
use async_trait::async_trait;
use core_types::{Candle, CandleSeries, Symbol, Timeframe};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// The spot klines endpoint caps a single request at this many candles.
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

/// Public (unauthenticated) Binance spot market data.
#[derive(Debug, Clone)]
pub struct BinanceSource {
    /// The persistent HTTP client.
    http_client: Client,
    /// The base URL for the REST API, e.g. `https://api.binance.com`.
    base_url: String,
}

/// Temporary struct to deserialize the kline response from Binance,
/// which is a JSON array of mixed types. Only the first seven columns are used.
#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct RawKline(
    i64,    // 0: Open time
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time
    String, // 7: Quote asset volume
    i64,    // 8: Number of trades
    String, // 9: Taker buy base asset volume
    String, // 10: Taker buy quote asset volume
    String, // 11: Ignore
);

impl BinanceSource {
    /// Builds a client whose every request is bounded by `request_timeout`.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::SourceError(format!("failed to build the HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Uses a preconfigured client (proxy settings, custom TLS, ...).
    pub fn with_client(base_url: impl Into<String>, http_client: Client) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches historical kline (candlestick) data.
    ///
    /// This corresponds to the `GET /api/v3/klines` endpoint.
    pub async fn get_klines(&self, symbol: &Symbol, interval: Timeframe, limit: usize) -> Result<CandleSeries> {
        if limit == 0 || limit > MAX_KLINES_PER_REQUEST {
            return Err(Error::SourceError(format!(
                "limit must be between 1 and {}, got {}",
                MAX_KLINES_PER_REQUEST, limit
            )));
        }
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol.0, interval, limit
        );

        let response_body = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(classify)?
            .text()
            .await
            .map_err(classify)?;

        parse_klines(&response_body)
    }
}

#[async_trait]
impl MarketDataSource for BinanceSource {
    fn name(&self) -> &'static str {
        "binance"
    }

    fn max_fetch(&self) -> Option<usize> {
        Some(MAX_KLINES_PER_REQUEST)
    }

    async fn fetch(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize) -> Result<CandleSeries> {
        tracing::debug!(%symbol, %timeframe, limit, "Fetching klines from Binance.");
        self.get_klines(symbol, timeframe, limit).await
    }
}

/// Timeouts and refused connections mean the exchange cannot be reached;
/// everything else is reported as a request failure.
fn classify(e: reqwest::Error) -> Error {
    if e.is_timeout() || e.is_connect() {
        Error::SourceUnavailable(e.to_string())
    } else {
        Error::RequestFailed(e)
    }
}

/// Turns a klines response body into a validated series.
///
/// Binance answers errors with an object such as `{"code":-1121,"msg":"Invalid symbol."}`.
pub fn parse_klines(body: &str) -> Result<CandleSeries> {
    let raw_klines: Vec<RawKline> = serde_json::from_str(body).map_err(|e| {
        // If deserialization fails, it might be a Binance error object.
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            if let Some(code) = value.get("code").and_then(Value::as_i64) {
                let msg = value.get("msg").and_then(Value::as_str).unwrap_or("").to_string();
                return Error::ApiError { code, msg };
            }
        }
        Error::DeserializationFailed(e)
    })?;

    let candles = raw_klines
        .into_iter()
        .map(|raw| {
            Ok(Candle {
                open_time: raw.0,
                open: parse_price("open", &raw.1)?,
                high: parse_price("high", &raw.2)?,
                low: parse_price("low", &raw.3)?,
                close: parse_price("close", &raw.4)?,
                volume: parse_price("volume", &raw.5)?,
                close_time: raw.6,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CandleSeries::new(candles)?)
}

fn parse_price(field: &str, value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|e| Error::SourceError(format!("invalid {} value {:?}: {}", field, value, e)))
}
