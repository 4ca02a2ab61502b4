use crate::error::BotError;
use crate::models::Candle;
use crate::Result;

/// Short-term momentum detector
///
/// Compares the close of the newest candle with the one before it and flags
/// moves larger than `threshold_pct` in either direction.
#[derive(Debug, Clone)]
pub struct SignalDetector {
    threshold_pct: f64,
}

impl SignalDetector {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }

    pub fn threshold_pct(&self) -> f64 {
        self.threshold_pct
    }

    /// Percentage change between the last two closes
    ///
    /// # Errors
    /// * `InsufficientData` with fewer than 2 candles
    /// * `DivisionByZero` when the previous close is zero
    pub fn change_pct(candles: &[Candle]) -> Result<f64> {
        let [.., previous, latest] = candles else {
            return Err(BotError::InsufficientData { got: candles.len() });
        };

        if previous.close == 0.0 {
            return Err(BotError::DivisionByZero);
        }

        Ok((latest.close - previous.close) / previous.close * 100.0)
    }

    /// `Some(change)` when the move exceeds the threshold
    pub fn detect(&self, candles: &[Candle]) -> Result<Option<f64>> {
        let change = Self::change_pct(candles)?;

        if change.abs() > self.threshold_pct {
            Ok(Some(change))
        } else {
            Ok(None)
        }
    }

    /// Second-stage check after the cooldown
    ///
    /// The refreshed window must still clear the threshold and move in the
    /// same direction as the first detection.
    pub fn confirm(&self, first_change: f64, candles: &[Candle]) -> Result<Option<f64>> {
        Ok(self
            .detect(candles)?
            .filter(|change| change.signum() == first_change.signum()))
    }
}
