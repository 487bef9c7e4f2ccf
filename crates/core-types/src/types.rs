// In crates/core-types/src/types.rs

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A trading pair as the exchange names it (e.g., "BTCUSDT").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Symbol(value.to_string())
    }
}

/// The direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

/// The decision produced for a single confirmed bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Signal {
    #[default]
    NoAction,
    EnterLong,
    EnterShort,
}

/// The candle intervals supported by the data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[default]
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// The exchange notation of the interval ("5m", "1h", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    /// Length of one candle in milliseconds.
    pub fn millis(&self) -> i64 {
        self.minutes() * 60_000
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            other => Err(Error::UnknownTimeframe(other.to_string())),
        }
    }
}

/// One OHLCV sample for a fixed time interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Interval start, in milliseconds since the Unix epoch.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Interval end, in milliseconds since the Unix epoch.
    pub close_time: i64,
}

impl Candle {
    /// Checks that prices and volume are finite and non-negative. `index`
    /// is only used to label the error.
    pub fn validate(&self, index: usize) -> Result<()> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidCandle {
                    index,
                    reason: format!("{} must be finite and non-negative, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

/// An immutable, strictly time-ordered sequence of candles.
///
/// The ordering invariant is checked once, at construction. Gaps between
/// candles are allowed; duplicate or decreasing timestamps are not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Result<Self> {
        for (index, candle) in candles.iter().enumerate() {
            candle.validate(index)?;
            if index > 0 && candle.open_time <= candles[index - 1].open_time {
                return Err(Error::UnorderedCandles {
                    index,
                    open_time: candle.open_time,
                });
            }
        }
        Ok(Self { candles })
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// A new series holding the first `len` candles.
    pub fn prefix(&self, len: usize) -> CandleSeries {
        let len = len.min(self.candles.len());
        Self {
            candles: self.candles[..len].to_vec(),
        }
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64, close: f64) -> Candle {
        Candle {
            open_time,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
            close_time: open_time + 59_999,
        }
    }

    #[test]
    fn series_accepts_irregular_spacing() {
        let series = CandleSeries::new(vec![candle(0, 1.0), candle(60_000, 1.1), candle(600_000, 1.2)]).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last().unwrap().close, 1.2);
    }

    #[test]
    fn series_rejects_duplicate_timestamps() {
        let err = CandleSeries::new(vec![candle(0, 1.0), candle(0, 1.1)]).unwrap_err();
        assert_eq!(err, Error::UnorderedCandles { index: 1, open_time: 0 });
    }

    #[test]
    fn series_rejects_decreasing_timestamps() {
        let err = CandleSeries::new(vec![candle(120_000, 1.0), candle(60_000, 1.1)]).unwrap_err();
        assert!(matches!(err, Error::UnorderedCandles { index: 1, .. }));
    }

    #[test]
    fn series_rejects_non_finite_prices() {
        let mut bad = candle(60_000, 1.0);
        bad.close = f64::NAN;
        let err = CandleSeries::new(vec![candle(0, 1.0), bad]).unwrap_err();
        assert!(matches!(err, Error::InvalidCandle { index: 1, .. }));
    }

    #[test]
    fn series_rejects_negative_volume() {
        let mut bad = candle(0, 1.0);
        bad.volume = -3.0;
        assert!(CandleSeries::new(vec![bad]).is_err());
    }

    #[test]
    fn prefix_is_clamped_to_length() {
        let series = CandleSeries::new(vec![candle(0, 1.0), candle(60_000, 1.1)]).unwrap();
        assert_eq!(series.prefix(1).len(), 1);
        assert_eq!(series.prefix(10).len(), 2);
    }

    #[test]
    fn timeframe_parses_exchange_notation() {
        for tf in [Timeframe::M1, Timeframe::M5, Timeframe::M15, Timeframe::H1, Timeframe::H4, Timeframe::D1] {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
        assert!("2m".parse::<Timeframe>().is_err());
        assert_eq!(Timeframe::H4.millis(), 4 * 60 * 60 * 1000);
    }

    #[test]
    fn timeframe_serializes_as_exchange_notation() {
        let json = serde_json::to_string(&Timeframe::M15).unwrap();
        assert_eq!(json, "\"15m\"");
        let parsed: Timeframe = serde_json::from_str("\"1d\"").unwrap();
        assert_eq!(parsed, Timeframe::D1);
    }
}
