use thiserror::Error;

/// Errors raised by the trading cycle and its collaborators
///
/// Only `Connection`, `Config` and `InvalidEquity` are fatal, and only before
/// the loop starts. Everything else ends the current cycle.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("gateway connection failed: {0}")]
    Connection(String),

    #[error("insufficient data: {got} candles, need at least 2")]
    InsufficientData { got: usize },

    #[error("previous candle closed at zero, cannot compute change")]
    DivisionByZero,

    #[error("symbol {0} is not available for trading")]
    SymbolUnavailable(String),

    #[error("order rejected with retcode {retcode} ({description})")]
    OrderRejected { retcode: u32, description: String },

    #[error("volume {volume:.2} is below the instrument minimum {minimum:.2}")]
    VolumeBelowMinimum { volume: f64, minimum: f64 },

    #[error("account equity {0} is not a positive finite number")]
    InvalidEquity(f64),

    #[error("price {0} is not a positive finite number")]
    InvalidPrice(f64),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Connection(err.to_string())
    }
}

impl From<::config::ConfigError> for BotError {
    fn from(err: ::config::ConfigError) -> Self {
        BotError::Config(err.to_string())
    }
}
