//! Runtime configuration
//!
//! Layers, lowest precedence first: built-in defaults, an optional config
//! file, then `MOMENTUMBOT_*` environment variables (`__` separates
//! sections, e.g. `MOMENTUMBOT_RISK__STOP_LOSS_PCT=4`). The broker password
//! also falls back to `MT5_PASSWORD`.

use crate::error::BotError;
use crate::models::{OrderSide, Timeframe};
use crate::Result;
use ::config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "MOMENTUMBOT";

/// Longest candle window the bot will request (one year)
pub const MAX_LOOKBACK_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub broker: BrokerConfig,
    pub trading: TradingConfig,
    pub risk: RiskParameters,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    pub bridge_url: String,
    pub account: Option<u64>,
    pub password: Option<String>,
    pub server: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub lookback_hours: u64,
    pub poll_interval_secs: u64,
    pub side_mode: SideMode,
    pub fixed_side: OrderSide,
    pub equity_mode: EquityMode,
    pub comment: String,
}

/// How the order side is chosen once a move is confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideMode {
    /// Always trade `fixed_side`
    Fixed,
    /// Up move buys, down move sells
    SignalDirected,
}

/// When account equity is read for position sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquityMode {
    Startup,
    PerCycle,
}

/// Risk settings, immutable for the process lifetime
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RiskParameters {
    pub price_threshold_pct: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub cooldown_secs: u64,
    pub equity_fraction_per_trade: f64,
    pub magic: u64,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            price_threshold_pct: 3.0,
            stop_loss_pct: 5.0,
            take_profit_pct: 8.0,
            cooldown_secs: 8,
            equity_fraction_per_trade: 0.05, // 1/20 of equity
            magic: 66,
        }
    }
}

impl TradingConfig {
    /// Side to trade for a confirmed move of `change_pct`
    pub fn side_for(&self, change_pct: f64) -> OrderSide {
        match self.side_mode {
            SideMode::Fixed => self.fixed_side,
            SideMode::SignalDirected if change_pct < 0.0 => OrderSide::Sell,
            SideMode::SignalDirected => OrderSide::Buy,
        }
    }
}

impl BotConfig {
    /// Load from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::defaults()?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let mut config: BotConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if config.broker.password.is_none() {
            config.broker.password = std::env::var("MT5_PASSWORD").ok();
        }

        Ok(config)
    }

    fn defaults() -> Result<::config::ConfigBuilder<::config::builder::DefaultState>> {
        let risk = RiskParameters::default();

        Ok(Config::builder()
            .set_default("broker.bridge_url", "http://127.0.0.1:8228")?
            .set_default("broker.request_timeout_secs", 10)?
            .set_default("trading.symbol", "BTCUSD!")?
            .set_default("trading.timeframe", "M10")?
            .set_default("trading.lookback_hours", 24)?
            .set_default("trading.poll_interval_secs", 10)?
            .set_default("trading.side_mode", "fixed")?
            .set_default("trading.fixed_side", "buy")?
            .set_default("trading.equity_mode", "startup")?
            .set_default("trading.comment", "momentumbot")?
            .set_default("risk.price_threshold_pct", risk.price_threshold_pct)?
            .set_default("risk.stop_loss_pct", risk.stop_loss_pct)?
            .set_default("risk.take_profit_pct", risk.take_profit_pct)?
            .set_default("risk.cooldown_secs", risk.cooldown_secs)?
            .set_default(
                "risk.equity_fraction_per_trade",
                risk.equity_fraction_per_trade,
            )?
            .set_default("risk.magic", risk.magic)?)
    }

    /// Reject settings the loop cannot trade safely with
    ///
    /// Credentials are only required when talking to a live account.
    pub fn validate(&self, require_credentials: bool) -> Result<()> {
        if self.trading.symbol.trim().is_empty() {
            return Err(BotError::Config("trading.symbol is empty".to_string()));
        }
        if !(1..=MAX_LOOKBACK_HOURS).contains(&self.trading.lookback_hours) {
            return Err(BotError::Config(format!(
                "trading.lookback_hours must be in 1..={}, got {}",
                MAX_LOOKBACK_HOURS, self.trading.lookback_hours
            )));
        }

        let risk = &self.risk;
        if !(risk.price_threshold_pct.is_finite() && risk.price_threshold_pct > 0.0) {
            return Err(BotError::Config(format!(
                "risk.price_threshold_pct must be positive, got {}",
                risk.price_threshold_pct
            )));
        }
        for (name, pct) in [
            ("risk.stop_loss_pct", risk.stop_loss_pct),
            ("risk.take_profit_pct", risk.take_profit_pct),
        ] {
            if !(pct > 0.0 && pct < 100.0) {
                return Err(BotError::Config(format!(
                    "{} must be in (0, 100), got {}",
                    name, pct
                )));
            }
        }
        if !(risk.equity_fraction_per_trade > 0.0 && risk.equity_fraction_per_trade <= 1.0) {
            return Err(BotError::Config(format!(
                "risk.equity_fraction_per_trade must be in (0, 1], got {}",
                risk.equity_fraction_per_trade
            )));
        }

        if require_credentials {
            if self.broker.account.is_none() {
                return Err(BotError::Config("broker.account is not set".to_string()));
            }
            if self.broker.password.as_deref().map_or(true, str::is_empty) {
                return Err(BotError::Config(
                    "broker.password is not set (or MT5_PASSWORD)".to_string(),
                ));
            }
            if self.broker.server.as_deref().map_or(true, str::is_empty) {
                return Err(BotError::Config("broker.server is not set".to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> BotConfig {
        BotConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = default_config();

        assert_eq!(config.trading.symbol, "BTCUSD!");
        assert_eq!(config.trading.timeframe, Timeframe::M10);
        assert_eq!(config.trading.side_mode, SideMode::Fixed);
        assert_eq!(config.trading.fixed_side, OrderSide::Buy);
        assert_eq!(config.trading.equity_mode, EquityMode::Startup);
        assert_eq!(config.risk, RiskParameters::default());
        assert!(config.broker.account.is_none());
    }

    #[test]
    fn test_defaults_validate_without_credentials() {
        let config = default_config();
        assert!(config.validate(false).is_ok());
        assert!(matches!(config.validate(true), Err(BotError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_percentages() {
        let mut config = default_config();
        config.risk.stop_loss_pct = 100.0;
        assert!(config.validate(false).is_err());

        let mut config = default_config();
        config.risk.equity_fraction_per_trade = 1.5;
        assert!(config.validate(false).is_err());

        let mut config = default_config();
        config.risk.price_threshold_pct = 0.0;
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_validate_bounds_lookback_window() {
        let mut config = default_config();
        config.trading.lookback_hours = MAX_LOOKBACK_HOURS;
        assert!(config.validate(false).is_ok());

        for hours in [0, MAX_LOOKBACK_HOURS + 1, 10_000_000_000, u64::MAX] {
            config.trading.lookback_hours = hours;
            assert!(
                matches!(config.validate(false), Err(BotError::Config(msg)) if msg.contains("lookback_hours")),
                "{} hours accepted",
                hours
            );
        }
    }

    #[test]
    fn test_validate_requires_full_credentials() {
        let mut config = default_config();
        config.broker.account = Some(2121944313);
        config.broker.password = Some("secret".to_string());
        assert!(config.validate(true).is_err());

        config.broker.server = Some("XBTFX-MetaTrader5".to_string());
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_side_for_modes() {
        let mut config = default_config();
        assert_eq!(config.trading.side_for(-4.0), OrderSide::Buy);

        config.trading.side_mode = SideMode::SignalDirected;
        assert_eq!(config.trading.side_for(4.0), OrderSide::Buy);
        assert_eq!(config.trading.side_for(-4.0), OrderSide::Sell);
    }
}
