use crate::config::RiskParameters;
use crate::error::BotError;
use crate::models::{OrderSide, SymbolInfo};
use crate::Result;

/// Size and protective levels for one order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskResult {
    pub volume: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Derives position size, stop-loss and take-profit from account equity
#[derive(Debug, Clone)]
pub struct RiskCalculator {
    params: RiskParameters,
}

impl RiskCalculator {
    pub fn new(params: RiskParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RiskParameters {
        &self.params
    }

    /// Compute order size and levels
    ///
    /// Volume is `equity * equity_fraction_per_trade / entry_price` rounded to
    /// 2 decimals, then snapped down to the instrument's volume step. A volume
    /// under the instrument minimum is rejected rather than rounded up; a
    /// volume over the maximum is capped.
    pub fn compute(
        &self,
        equity: f64,
        entry_price: f64,
        side: OrderSide,
        symbol: &SymbolInfo,
    ) -> Result<RiskResult> {
        if !(equity.is_finite() && equity > 0.0) {
            return Err(BotError::InvalidEquity(equity));
        }
        if !(entry_price.is_finite() && entry_price > 0.0) {
            return Err(BotError::InvalidPrice(entry_price));
        }

        let mut volume = snap_to_step(
            round2(equity * self.params.equity_fraction_per_trade / entry_price),
            symbol.volume_step,
        );

        if volume <= 0.0 || volume < symbol.volume_min {
            return Err(BotError::VolumeBelowMinimum {
                volume,
                minimum: symbol.volume_min,
            });
        }
        if symbol.volume_max > 0.0 && volume > symbol.volume_max {
            tracing::warn!(
                "Volume {:.2} above instrument maximum, capping to {:.2}",
                volume,
                symbol.volume_max
            );
            volume = symbol.volume_max;
        }

        let (stop_loss, take_profit) = self.levels(entry_price, side);

        Ok(RiskResult {
            volume,
            stop_loss,
            take_profit,
        })
    }

    /// Stop-loss and take-profit prices for an entry
    pub fn levels(&self, entry_price: f64, side: OrderSide) -> (f64, f64) {
        let sl = self.params.stop_loss_pct / 100.0;
        let tp = self.params.take_profit_pct / 100.0;

        match side {
            OrderSide::Buy => (entry_price * (1.0 - sl), entry_price * (1.0 + tp)),
            OrderSide::Sell => (entry_price * (1.0 + sl), entry_price * (1.0 - tp)),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Largest multiple of `step` not above `volume`; a zero step leaves it as is
fn snap_to_step(volume: f64, step: f64) -> f64 {
    if !(step.is_finite() && step > 0.0) {
        return volume;
    }
    let steps = (volume / step + 1e-9).floor();
    // Strip float noise such as 0.30000000000000004
    (steps * step * 1e8).round() / 1e8
}
