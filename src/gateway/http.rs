use super::BrokerGateway;
use crate::error::BotError;
use crate::models::{
    Candle, Order, OrderRequest, OrderResult, Position, Quote, SymbolInfo, Timeframe,
};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for a REST bridge running next to the MT5 terminal
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    login: u64,
    password: &'a str,
    server: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    authorized: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    equity: f64,
}

#[derive(Debug, Deserialize)]
struct RateRow {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    tick_volume: u64,
}

#[derive(Debug, Deserialize)]
struct TickResponse {
    time: i64,
    bid: f64,
    ask: f64,
}

#[derive(Debug, Serialize)]
struct SelectRequest<'a> {
    symbol: &'a str,
    enable: bool,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    selected: bool,
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| BotError::Connection(format!("bridge returned invalid time {}", secs)))
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

#[async_trait]
impl BrokerGateway for HttpGateway {
    async fn login(&self, account: u64, password: &str, server: &str) -> Result<bool> {
        let response: LoginResponse = self
            .post_json(
                "/login",
                &LoginRequest {
                    login: account,
                    password,
                    server,
                },
            )
            .await?;

        if let Some(error) = response.error.filter(|_| !response.authorized) {
            tracing::warn!("Login to #{} refused by terminal: {}", account, error);
        }

        Ok(response.authorized)
    }

    async fn account_equity(&self) -> Result<f64> {
        let response: AccountResponse = self.get_json("/account", &[]).await?;
        Ok(response.equity)
    }

    async fn candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        let rows: Vec<RateRow> = self
            .get_json(
                "/rates",
                &[
                    ("symbol", symbol.to_string()),
                    ("timeframe", timeframe.to_string()),
                    ("from", from.timestamp().to_string()),
                    ("to", to.timestamp().to_string()),
                ],
            )
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(Candle {
                    timestamp: timestamp(row.time)?,
                    open: row.open,
                    high: row.high,
                    low: row.low,
                    close: row.close,
                    tick_volume: row.tick_volume,
                })
            })
            .collect()
    }

    async fn quote(&self, symbol: &str) -> Result<Quote> {
        let tick: TickResponse = self
            .get_json("/tick", &[("symbol", symbol.to_string())])
            .await?;

        Ok(Quote {
            bid: tick.bid,
            ask: tick.ask,
            timestamp: timestamp(tick.time)?,
        })
    }

    async fn open_positions(&self, symbol: &str) -> Result<Vec<Position>> {
        self.get_json("/positions", &[("symbol", symbol.to_string())])
            .await
    }

    async fn open_orders(&self, symbol: &str) -> Result<Vec<Order>> {
        self.get_json("/orders", &[("symbol", symbol.to_string())])
            .await
    }

    async fn symbol_info(&self, symbol: &str) -> Result<Option<SymbolInfo>> {
        let response = self
            .client
            .get(self.url("/symbol"))
            .query(&[("symbol", symbol)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(response.error_for_status()?.json().await?))
    }

    async fn select_symbol(&self, symbol: &str, visible: bool) -> Result<bool> {
        let response: SelectResponse = self
            .post_json(
                "/symbol/select",
                &SelectRequest {
                    symbol,
                    enable: visible,
                },
            )
            .await?;
        Ok(response.selected)
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResult> {
        self.post_json("/order", request).await
    }

    async fn shutdown(&self) -> Result<()> {
        self.client
            .post(self.url("/shutdown"))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
