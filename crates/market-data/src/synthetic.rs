// In crates/market-data/src/synthetic.rs

use crate::{Error, MarketDataSource, Result};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{Candle, CandleSeries, Symbol, Timeframe};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Standard deviation of the per-candle log-return of the walk.
const NOISE_SIGMA: f64 = 0.004;
/// Number of past candles whose noise makes up the current price level.
const WALK_WINDOW: i64 = 64;
/// Amplitude of the slow sinusoidal drift around the base price.
const DRIFT_AMPLITUDE: f64 = 0.05;
/// OHLC jitter, as a fraction of the current price.
const JITTER: f64 = 0.003;

/// A deterministic random-walk generator for running without an exchange.
///
/// Every candle is derived from its absolute index on the timeframe grid
/// (`open_time / step`). Its RNG is seeded from the symbol, the timeframe and
/// that index, and its level is the base price moved by a slow sinusoidal
/// drift and the summed noise of the last `WALK_WINDOW` candles. Two fetches
/// therefore agree on every candle they share, and each new interval brings
/// a new candle with new prices.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    end_time: Option<i64>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the clock: the last generated candle is the one containing `end_time_ms`.
    pub fn ending_at(end_time_ms: i64) -> Self {
        Self {
            end_time: Some(end_time_ms),
        }
    }

    pub fn generate(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize) -> Result<CandleSeries> {
        if limit == 0 {
            return Err(Error::SourceError("limit must be greater than 0".to_string()));
        }

        let step = timeframe.millis();
        let now = self.end_time.unwrap_or_else(|| Utc::now().timestamp_millis());
        let last_open = now - now.rem_euclid(step);
        let first_open = last_open - (limit as i64 - 1) * step;
        let first_index = first_open.div_euclid(step);

        // Walk noise for the window preceding the first candle, then for each candle.
        let noise: Vec<f64> = (first_index - WALK_WINDOW + 1..first_index + limit as i64)
            .map(|index| clamped_normal(&mut candle_rng(symbol, timeframe, index)))
            .collect();
        let window = WALK_WINDOW as usize;

        let base = base_price(symbol);
        let mut candles = Vec::with_capacity(limit);

        for i in 0..limit {
            let index = first_index + i as i64;
            let walk: f64 = noise[i..i + window].iter().sum();

            let drift = 1.0 + (index as f64 * 0.02).sin() * DRIFT_AMPLITUDE;
            let price = base * drift * (walk * NOISE_SIGMA).exp();

            let mut rng = candle_rng(symbol, timeframe, index);
            // The first draw is this candle's walk noise, already accounted for.
            let _ = clamped_normal(&mut rng);
            let volatility = price * JITTER;
            let open = price + clamped_normal(&mut rng) * volatility;
            let close = price + clamped_normal(&mut rng) * volatility;
            let high = open.max(close) + (clamped_normal(&mut rng) * volatility * 0.5).abs();
            let low = open.min(close) - (clamped_normal(&mut rng) * volatility * 0.5).abs();
            let volume: f64 = rng.gen_range(100.0..1000.0);

            let open_time = index * step;
            candles.push(Candle {
                open_time,
                open: round_to(open, 8),
                high: round_to(high, 8),
                low: round_to(low.max(0.0), 8),
                close: round_to(close, 8),
                volume: round_to(volume, 2),
                close_time: open_time + step - 1,
            });
        }

        Ok(CandleSeries::new(candles)?)
    }
}

#[async_trait]
impl MarketDataSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn fetch(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize) -> Result<CandleSeries> {
        tracing::debug!(%symbol, %timeframe, limit, "Generating synthetic candles.");
        self.generate(symbol, timeframe, limit)
    }
}

/// Typical price level of the well-known pairs, 1.0 for anything else.
pub fn base_price(symbol: &Symbol) -> f64 {
    match symbol.0.as_str() {
        "BTCUSDT" => 43_000.0,
        "ETHUSDT" => 2_600.0,
        "DOGEUSDT" => 0.08,
        "ADAUSDT" => 0.45,
        "SOLUSDT" => 95.0,
        "BNBUSDT" => 310.0,
        _ => 1.0,
    }
}

fn candle_rng(symbol: &Symbol, timeframe: Timeframe, index: i64) -> StdRng {
    StdRng::seed_from_u64(seed_for(symbol, timeframe, index))
}

fn seed_for(symbol: &Symbol, timeframe: Timeframe, index: i64) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.0.as_bytes());
    hasher.update(timeframe.as_str().as_bytes());
    hasher.update(&index.to_le_bytes());
    let hash = hasher.finalize();
    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(seed)
}

/// A standard normal draw clamped to three standard deviations.
fn clamped_normal(rng: &mut StdRng) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z.clamp(-3.0, 3.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    const END: i64 = 1_700_000_123_456;

    #[test]
    fn generates_the_requested_number_of_aligned_candles() {
        let source = SyntheticSource::ending_at(END);
        let series = source.generate(&Symbol::from("BTCUSDT"), Timeframe::M5, 200).unwrap();
        assert_eq!(series.len(), 200);

        let step = Timeframe::M5.millis();
        let last = series.last().unwrap();
        assert_eq!(last.open_time % step, 0);
        assert!(last.open_time <= END && END < last.open_time + step);
        for pair in series.as_slice().windows(2) {
            assert_eq!(pair[1].open_time - pair[0].open_time, step);
        }
    }

    #[test]
    fn same_arguments_give_the_same_prices() {
        let symbol = Symbol::from("DOGEUSDT");
        let a = SyntheticSource::ending_at(END).generate(&symbol, Timeframe::M15, 50).unwrap();
        let b = SyntheticSource::ending_at(END).generate(&symbol, Timeframe::M15, 50).unwrap();
        assert_eq!(a, b);

        let other = SyntheticSource::ending_at(END).generate(&symbol, Timeframe::H1, 50).unwrap();
        assert_ne!(a.as_slice()[0].close, other.as_slice()[0].close);
    }

    #[test]
    fn consecutive_fetches_agree_on_shared_candles() {
        let symbol = Symbol::from("DOGEUSDT");
        let step = Timeframe::M5.millis();
        let first = SyntheticSource::ending_at(END).generate(&symbol, Timeframe::M5, 205).unwrap();
        let second = SyntheticSource::ending_at(END + step).generate(&symbol, Timeframe::M5, 205).unwrap();

        assert_eq!(second.as_slice()[0].open_time, first.as_slice()[1].open_time);
        assert_eq!(&first.as_slice()[1..], &second.as_slice()[..204]);

        let newest = second.last().unwrap();
        assert_eq!(newest.open_time, first.last().unwrap().open_time + step);
        assert_ne!(newest.close, first.last().unwrap().close);
    }

    #[test]
    fn a_longer_fetch_extends_the_same_history() {
        let symbol = Symbol::from("BTCUSDT");
        let short = SyntheticSource::ending_at(END).generate(&symbol, Timeframe::H1, 10).unwrap();
        let long = SyntheticSource::ending_at(END).generate(&symbol, Timeframe::H1, 300).unwrap();
        assert_eq!(short.as_slice(), &long.as_slice()[290..]);
    }

    #[test]
    fn prices_stay_near_the_base_price() {
        let symbol = Symbol::from("ETHUSDT");
        let series = SyntheticSource::ending_at(END).generate(&symbol, Timeframe::M5, 300).unwrap();
        for candle in &series {
            assert!(candle.low <= candle.open.min(candle.close));
            assert!(candle.high >= candle.open.max(candle.close));
            assert!(candle.low > 0.0);
            assert!((100.0..=1000.0).contains(&candle.volume));
            assert!(candle.close > 2_600.0 * 0.25 && candle.close < 2_600.0 * 4.0);
        }
    }

    #[test]
    fn unknown_symbols_start_at_one() {
        assert_eq!(base_price(&Symbol::from("FOOBAR")), 1.0);
        assert_eq!(base_price(&Symbol::from("SOLUSDT")), 95.0);
    }

    #[test]
    fn zero_limit_is_an_error() {
        let source = SyntheticSource::ending_at(END);
        assert!(source.generate(&Symbol::from("BTCUSDT"), Timeframe::M1, 0).is_err());
    }
}
