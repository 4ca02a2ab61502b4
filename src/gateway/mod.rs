// Broker terminal access
pub mod http;
pub mod paper;
pub mod session;

#[cfg(test)]
pub(crate) mod fake;

pub use http::HttpGateway;
pub use paper::PaperGateway;
pub use session::BrokerSession;

use crate::models::{
    Candle, Order, OrderRequest, OrderResult, Position, Quote, SymbolInfo, Timeframe,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Everything the trade loop needs from the broker terminal
///
/// Calls are awaited one at a time; implementations need not be re-entrant.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    async fn login(&self, account: u64, password: &str, server: &str) -> Result<bool>;

    async fn account_equity(&self) -> Result<f64>;

    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>>;

    async fn quote(&self, symbol: &str) -> Result<Quote>;

    async fn open_positions(&self, symbol: &str) -> Result<Vec<Position>>;

    async fn open_orders(&self, symbol: &str) -> Result<Vec<Order>>;

    /// `None` when the terminal does not know the symbol
    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>>;

    async fn select_symbol(&self, symbol: &str, visible: bool) -> Result<bool>;

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult>;

    async fn shutdown(&self) -> Result<()>;
}
