// In crates/strategies/src/lib.rs

use core_types::{CandleSeries, Signal};

pub mod error;
pub mod evaluator;
pub mod stats;
pub mod trendline;
pub mod types;

pub use error::{Error, Result};
pub use stats::SignalSummary;
pub use trendline::{SignalFrame, SignalRow, TrendlinePipeline};
pub use types::TrendlineSettings;

/// The decision taken on the latest confirmed bar, together with that bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub signal: Signal,
    pub confirmed: SignalRow,
}

/// The universal interface for a trading strategy.
///
/// A strategy turns the latest candles of a live feed into a `Signal` for the
/// most recent *closed* candle. The last candle of the series is assumed to be
/// still forming and must never drive a decision.
pub trait Strategy {
    /// The name of the strategy.
    fn name(&self) -> &'static str;

    /// Returns `Ok(None)` when the series has fewer than two candles, and
    /// `Err(Error::InsufficientData)` when it is empty.
    fn assess(&self, candles: &CandleSeries) -> Result<Option<Assessment>>;
}

/// The "Trendline Continuation" strategy: trendline pipeline plus the
/// confirmed-bar evaluator.
#[derive(Debug, Clone)]
pub struct TrendlineContinuation {
    pipeline: TrendlinePipeline,
}

impl TrendlineContinuation {
    pub fn new(settings: TrendlineSettings) -> Result<Self> {
        Ok(Self {
            pipeline: TrendlinePipeline::new(settings)?,
        })
    }
}

impl Strategy for TrendlineContinuation {
    fn name(&self) -> &'static str {
        "TrendlineContinuation"
    }

    fn assess(&self, candles: &CandleSeries) -> Result<Option<Assessment>> {
        let frame = self.pipeline.compute(candles)?;
        Ok(frame.confirmed().map(|confirmed| Assessment {
            signal: evaluator::evaluate(confirmed),
            confirmed: *confirmed,
        }))
    }
}
