// In crates/strategies/src/types.rs

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the trendline continuation pipeline.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TrendlineSettings {
    /// EMA length used to smooth the close into `sg`.
    pub sg_length: u32,
    /// Window of the linear regression fitted over `sg`.
    pub slope_length: u32,
    /// SMA length used to smooth the `trend` accumulator into the trendline.
    pub sma_length: u32,
    /// Fraction of the close treated as a dead zone for crossovers.
    pub sensitivity: f64,
}

impl Default for TrendlineSettings {
    fn default() -> Self {
        Self {
            sg_length: 150,
            slope_length: 20,
            sma_length: 50,
            sensitivity: 0.000085,
        }
    }
}

impl TrendlineSettings {
    /// The longest look-back of the three smoothing stages.
    pub fn longest_lookback(&self) -> usize {
        self.sg_length.max(self.slope_length).max(self.sma_length) as usize
    }

    pub fn validate(&self) -> Result<()> {
        let lengths = [
            ("sg_length", self.sg_length),
            ("slope_length", self.slope_length),
            ("sma_length", self.sma_length),
        ];
        for (name, value) in lengths {
            if value == 0 {
                return Err(Error::InvalidParameters(format!("{} must be greater than 0", name)));
            }
        }
        if !self.sensitivity.is_finite() || self.sensitivity < 0.0 {
            return Err(Error::InvalidParameters(format!(
                "sensitivity must be finite and non-negative, got {}",
                self.sensitivity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_tuning() {
        let settings = TrendlineSettings::default();
        assert_eq!(settings.sg_length, 150);
        assert_eq!(settings.slope_length, 20);
        assert_eq!(settings.sma_length, 50);
        assert_eq!(settings.sensitivity, 0.000085);
        assert_eq!(settings.longest_lookback(), 150);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_lengths_are_rejected() {
        let settings = TrendlineSettings { slope_length: 0, ..Default::default() };
        assert!(matches!(settings.validate(), Err(Error::InvalidParameters(_))));
    }

    #[test]
    fn negative_sensitivity_is_rejected() {
        let settings = TrendlineSettings { sensitivity: -0.1, ..Default::default() };
        assert!(settings.validate().is_err());
        let settings = TrendlineSettings { sensitivity: f64::INFINITY, ..Default::default() };
        assert!(settings.validate().is_err());
    }
}
