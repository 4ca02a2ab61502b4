use super::BrokerGateway;
use crate::models::{
    Candle, Order, OrderRequest, OrderResult, Position, Quote, SymbolInfo, Timeframe,
    RETCODE_DONE,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Dry-run gateway: real market data, simulated fills
///
/// Orders are filled at the requested price and kept as open positions for
/// the rest of the session, so the position guard behaves as it would live.
pub struct PaperGateway<G> {
    inner: G,
    fills: Mutex<Vec<Position>>,
}

impl<G: BrokerGateway> PaperGateway<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            fills: Mutex::new(Vec::new()),
        }
    }

    /// Simulated positions opened so far
    pub fn fills(&self) -> Vec<Position> {
        self.fills.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl<G: BrokerGateway> BrokerGateway for PaperGateway<G> {
    async fn login(&self, account: u64, password: &str, server: &str) -> Result<bool> {
        self.inner.login(account, password, server).await
    }

    async fn account_equity(&self) -> Result<f64> {
        self.inner.account_equity().await
    }

    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        self.inner.candles(symbol, timeframe, from, to).await
    }

    async fn quote(&self, symbol: &str) -> Result<Quote> {
        self.inner.quote(symbol).await
    }

    async fn open_positions(&self, symbol: &str) -> Result<Vec<Position>> {
        let fills = self.fills.lock().map(|f| f.clone()).unwrap_or_default();
        Ok(fills.into_iter().filter(|p| p.symbol == symbol).collect())
    }

    async fn open_orders(&self, _symbol: &str) -> Result<Vec<Order>> {
        // Market orders fill immediately, nothing stays pending
        Ok(Vec::new())
    }

    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>> {
        self.inner.symbol_info(symbol).await
    }

    async fn select_symbol(&self, symbol: &str, visible: bool) -> Result<bool> {
        self.inner.select_symbol(symbol, visible).await
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult> {
        let mut fills = match self.fills.lock() {
            Ok(fills) => fills,
            Err(poisoned) => poisoned.into_inner(),
        };
        let ticket = fills.len() as u64 + 1;

        fills.push(Position {
            ticket,
            symbol: request.symbol.clone(),
            volume: request.volume,
            price_open: request.price,
            magic: request.magic,
        });

        tracing::info!(
            "  📝 [PAPER] Filled {} {} @ {:.2} (ticket {})",
            request.volume,
            request.symbol,
            request.price,
            ticket
        );

        Ok(OrderResult {
            retcode: RETCODE_DONE,
            order: ticket,
            deal: ticket,
            volume: request.volume,
            price: request.price,
            comment: "paper fill".to_string(),
        })
    }

    async fn shutdown(&self) -> Result<()> {
        self.inner.shutdown().await
    }
}
