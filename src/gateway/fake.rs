use super::BrokerGateway;
use crate::error::BotError;
use crate::models::{
    Candle, Order, OrderRequest, OrderResult, Position, Quote, SymbolInfo, Timeframe,
    RETCODE_DONE,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// In-memory gateway with scripted responses for unit tests
pub(crate) struct FakeGateway {
    pub windows: Mutex<VecDeque<Vec<Candle>>>,
    pub quote: Mutex<Quote>,
    pub equity: Mutex<f64>,
    pub positions: Mutex<Vec<Position>>,
    pub orders: Mutex<Vec<Order>>,
    pub symbol: Mutex<Option<SymbolInfo>>,
    pub select_ok: bool,
    pub retcode: u32,
    pub fail_candles: bool,
    pub submitted: Mutex<Vec<OrderRequest>>,
    pub selected: Mutex<Vec<String>>,
    pub shutdown_calls: Arc<Mutex<u32>>,
    pub calls: Mutex<Vec<&'static str>>,
}

pub(crate) fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let start = Utc::now() - Duration::minutes(10 * closes.len() as i64);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            timestamp: start + Duration::minutes(10 * i as i64),
            open: close,
            high: close,
            low: close,
            close,
            tick_volume: 1,
        })
        .collect()
}

pub(crate) fn position(symbol: &str) -> Position {
    Position {
        ticket: 1,
        symbol: symbol.to_string(),
        volume: 0.01,
        price_open: 100.0,
        magic: 66,
    }
}

pub(crate) fn order(symbol: &str) -> Order {
    Order {
        ticket: 2,
        symbol: symbol.to_string(),
        volume_current: 0.01,
        price_open: 100.0,
        magic: 66,
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(VecDeque::new()),
            quote: Mutex::new(Quote {
                bid: 49990.0,
                ask: 50000.0,
                timestamp: Utc::now(),
            }),
            equity: Mutex::new(10000.0),
            positions: Mutex::new(Vec::new()),
            orders: Mutex::new(Vec::new()),
            symbol: Mutex::new(Some(SymbolInfo {
                visible: true,
                volume_min: 0.01,
                volume_max: 100.0,
                volume_step: 0.01,
            })),
            select_ok: true,
            retcode: RETCODE_DONE,
            fail_candles: false,
            submitted: Mutex::new(Vec::new()),
            selected: Mutex::new(Vec::new()),
            shutdown_calls: Arc::new(Mutex::new(0)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue candle windows by close prices, served in order
    pub fn with_windows(self, windows: &[&[f64]]) -> Self {
        {
            let mut queue = self.windows.lock().unwrap();
            for closes in windows {
                queue.push_back(candles_from_closes(closes));
            }
        }
        self
    }

    pub fn submitted(&self) -> Vec<OrderRequest> {
        self.submitted.lock().unwrap().clone()
    }

    /// Gateway methods in the order they were called
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BrokerGateway for FakeGateway {
    async fn login(&self, _account: u64, password: &str, _server: &str) -> Result<bool> {
        self.record("login");
        Ok(password == "secret")
    }

    async fn account_equity(&self) -> Result<f64> {
        self.record("account_equity");
        Ok(*self.equity.lock().unwrap())
    }

    async fn candles(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        self.record("candles");
        if self.fail_candles {
            return Err(BotError::Connection("bridge unreachable".to_string()));
        }
        Ok(self.windows.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn quote(&self, _symbol: &str) -> Result<Quote> {
        self.record("quote");
        Ok(*self.quote.lock().unwrap())
    }

    async fn open_positions(&self, _symbol: &str) -> Result<Vec<Position>> {
        self.record("open_positions");
        Ok(self.positions.lock().unwrap().clone())
    }

    async fn open_orders(&self, _symbol: &str) -> Result<Vec<Order>> {
        self.record("open_orders");
        Ok(self.orders.lock().unwrap().clone())
    }

    async fn symbol_info(&self, _symbol: &str) -> Result<Option<SymbolInfo>> {
        self.record("symbol_info");
        Ok(self.symbol.lock().unwrap().clone())
    }

    async fn select_symbol(&self, symbol: &str, _visible: bool) -> Result<bool> {
        self.record("select_symbol");
        self.selected.lock().unwrap().push(symbol.to_string());
        Ok(self.select_ok)
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult> {
        self.record("submit_order");
        self.submitted.lock().unwrap().push(request.clone());
        let accepted = self.retcode == RETCODE_DONE;
        Ok(OrderResult {
            retcode: self.retcode,
            order: if accepted { 1001 } else { 0 },
            deal: if accepted { 2001 } else { 0 },
            volume: request.volume,
            price: request.price,
            comment: String::new(),
        })
    }

    async fn shutdown(&self) -> Result<()> {
        self.record("shutdown");
        *self.shutdown_calls.lock().unwrap() += 1;
        Ok(())
    }
}
