// In crates/strategies/src/trendline.rs

use crate::types::TrendlineSettings;
use crate::{Error, Result};
use core_types::{Candle, CandleSeries};
use serde::Serialize;
use std::collections::VecDeque;
use ta::Next;
use ta::indicators::{ExponentialMovingAverage as Ema, SimpleMovingAverage as Sma};

/// The derived fields for one candle. Fields that need more history than
/// was available at this index are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalRow {
    pub open_time: i64,
    pub close: f64,
    /// EMA of the close.
    pub sg: f64,
    /// Bar-to-bar change of the regression end point fitted over `sg`.
    pub slope_sg: Option<f64>,
    /// Running sum of `slope_sg`, seeded from the first `sg`.
    pub trend: f64,
    /// SMA of `trend`.
    pub trendline: Option<f64>,
    /// First difference of `trendline`.
    pub slope_blue: Option<f64>,
    /// Per-bar noise threshold (`close * sensitivity`).
    pub min_move: f64,
    pub long_cond: bool,
    pub short_cond: bool,
}

/// Fits an ordinary least squares line to `values` (sampled at x = 0, 1, ...)
/// and returns the fitted value at the last sample.
fn linreg_endpoint<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    let (mut n, mut sum_x, mut sum_y, mut sum_xx, mut sum_xy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    let mut last = 0.0;
    for (x, y) in values.enumerate() {
        let x = x as f64;
        n += 1.0;
        sum_x += x;
        sum_y += *y;
        sum_xx += x * x;
        sum_xy += x * *y;
        last = *y;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        // A single point has no slope; the fit passes through it.
        return last;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    intercept + slope * (n - 1.0)
}

/// Everything the fold carries from one bar to the next.
#[derive(Debug, Clone)]
struct PipelineState {
    ema: Ema,
    /// The last `slope_length + 1` values of `sg`.
    sg_window: VecDeque<f64>,
    trend_sma: Sma,
    trend_count: usize,
    /// The persistent accumulator. `None` until the first candle.
    trend: Option<f64>,
    prev_trendline: Option<f64>,
    prev_slope_blue: Option<f64>,
}

impl PipelineState {
    fn new(settings: &TrendlineSettings) -> Result<Self> {
        let ema = Ema::new(settings.sg_length as usize).map_err(|e| Error::InvalidParameters(format!("{:?}", e)))?;
        let trend_sma = Sma::new(settings.sma_length as usize).map_err(|e| Error::InvalidParameters(format!("{:?}", e)))?;
        Ok(Self {
            ema,
            sg_window: VecDeque::with_capacity(settings.slope_length as usize + 1),
            trend_sma,
            trend_count: 0,
            trend: None,
            prev_trendline: None,
            prev_slope_blue: None,
        })
    }

    fn step(&mut self, settings: &TrendlineSettings, candle: &Candle) -> SignalRow {
        let slope_length = settings.slope_length as usize;

        // 1. sg: the EMA seeds itself with the first close.
        let sg = self.ema.next(candle.close);

        // 2. slopeSG: regression end point now minus the one a bar ago.
        self.sg_window.push_back(sg);
        if self.sg_window.len() > slope_length + 1 {
            self.sg_window.pop_front();
        }
        let filled = self.sg_window.len();
        let current_fit = (filled >= slope_length).then(|| linreg_endpoint(self.sg_window.range(filled - slope_length..)));
        let previous_fit = (filled > slope_length).then(|| linreg_endpoint(self.sg_window.range(..slope_length)));
        let slope_sg = match (current_fit, previous_fit) {
            (Some(val0), Some(val1)) => Some(val0 - val1),
            _ => None,
        };

        // 3. trend: never reset, only ever incremented.
        let trend = match self.trend {
            None => sg,
            Some(prev) => prev + slope_sg.unwrap_or(0.0),
        };
        self.trend = Some(trend);

        // 4-5. trendline and its slope.
        self.trend_count += 1;
        let average = self.trend_sma.next(trend);
        let trendline = (self.trend_count >= settings.sma_length as usize).then_some(average);
        let slope_blue = match (trendline, self.prev_trendline) {
            (Some(current), Some(previous)) => Some(current - previous),
            _ => None,
        };

        // 6-8. Both comparisons use this bar's threshold.
        let min_move = candle.close * settings.sensitivity;
        let (long_cond, short_cond) = match (slope_blue, self.prev_slope_blue) {
            (Some(current), Some(previous)) => (
                current > min_move && previous <= min_move,
                current < -min_move && previous >= -min_move,
            ),
            _ => (false, false),
        };

        self.prev_trendline = trendline;
        self.prev_slope_blue = slope_blue;

        SignalRow {
            open_time: candle.open_time,
            close: candle.close,
            sg,
            slope_sg,
            trend,
            trendline,
            slope_blue,
            min_move,
            long_cond,
            short_cond,
        }
    }
}

/// The pipeline output: one row per consumed candle, plus the fold state
/// needed to extend it with later candles.
#[derive(Debug, Clone)]
pub struct SignalFrame {
    settings: TrendlineSettings,
    state: PipelineState,
    rows: Vec<SignalRow>,
}

impl SignalFrame {
    fn new(settings: TrendlineSettings) -> Result<Self> {
        Ok(Self {
            state: PipelineState::new(&settings)?,
            settings,
            rows: Vec::new(),
        })
    }

    /// Extends the frame by one closed candle.
    ///
    /// The candle must come strictly after the last one consumed. Rows that
    /// already exist are never touched.
    pub fn push(&mut self, candle: &Candle) -> Result<&SignalRow> {
        if let Some(last) = self.rows.last() {
            if candle.open_time <= last.open_time {
                return Err(Error::Series(core_types::Error::UnorderedCandles {
                    index: self.rows.len(),
                    open_time: candle.open_time,
                }));
            }
        }
        candle.validate(self.rows.len())?;

        let row = self.state.step(&self.settings, candle);
        self.rows.push(row);
        Ok(&self.rows[self.rows.len() - 1])
    }

    pub fn settings(&self) -> &TrendlineSettings {
        &self.settings
    }

    pub fn rows(&self) -> &[SignalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The most recent fully closed bar, i.e. the second-to-last row.
    pub fn confirmed(&self) -> Option<&SignalRow> {
        crate::evaluator::confirmed_row(&self.rows)
    }

    /// True when the rows were computed from exactly the first `len()` candles of `series`.
    fn is_prefix_of(&self, series: &CandleSeries) -> bool {
        series.len() >= self.rows.len()
            && self
                .rows
                .iter()
                .zip(series.iter())
                .all(|(row, candle)| row.open_time == candle.open_time && row.close.to_bits() == candle.close.to_bits())
    }
}

/// Turns a candle series into the trendline signal rows.
///
/// The computation is a strict left-to-right fold, so row `i` only ever
/// depends on candles `0..=i`, and extending a frame produces the same bits
/// as recomputing it from scratch.
#[derive(Debug, Clone)]
pub struct TrendlinePipeline {
    settings: TrendlineSettings,
}

impl TrendlinePipeline {
    /// Creates a pipeline, failing fast on non-positive lengths or an invalid sensitivity.
    pub fn new(settings: TrendlineSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &TrendlineSettings {
        &self.settings
    }

    /// An empty frame, to be extended candle by candle with [`SignalFrame::push`].
    pub fn frame(&self) -> Result<SignalFrame> {
        SignalFrame::new(self.settings)
    }

    /// Computes every row of `series` from index 0.
    pub fn compute(&self, series: &CandleSeries) -> Result<SignalFrame> {
        if series.is_empty() {
            return Err(Error::InsufficientData);
        }
        let mut frame = self.frame()?;
        frame.rows.reserve(series.len());
        for candle in series {
            let row = frame.state.step(&frame.settings, candle);
            frame.rows.push(row);
        }
        Ok(frame)
    }

    /// Brings `frame` up to date with `series`, computing only the new tail.
    ///
    /// The accumulator remembers every increment it has seen, so the frame is
    /// rebuilt from index 0 whenever it was computed with different settings
    /// or from candles that are not a prefix of `series`.
    pub fn resume(&self, mut frame: SignalFrame, series: &CandleSeries) -> Result<SignalFrame> {
        if frame.settings != self.settings {
            tracing::debug!("Strategy parameters changed, recomputing signals from scratch.");
            return self.compute(series);
        }
        if !frame.is_prefix_of(series) {
            tracing::debug!(rows = frame.len(), candles = series.len(), "Series diverged from the cached frame, recomputing.");
            return self.compute(series);
        }
        if series.is_empty() {
            return Err(Error::InsufficientData);
        }
        for candle in &series.as_slice()[frame.rows.len()..] {
            let row = frame.state.step(&frame.settings, candle);
            frame.rows.push(row);
        }
        Ok(frame)
    }
}
