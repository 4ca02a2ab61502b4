// Core modules
pub mod config;
pub mod error;
pub mod execution;
pub mod gateway;
pub mod models;
pub mod risk;
pub mod shutdown;
pub mod strategy;
pub mod trade_loop;

// Re-export commonly used types
pub use config::BotConfig;
pub use error::BotError;
pub use gateway::BrokerGateway;
pub use models::*;
pub use trade_loop::{CycleOutcome, CycleState, TradeLoop};

// Error handling
pub type Result<T> = std::result::Result<T, BotError>;
