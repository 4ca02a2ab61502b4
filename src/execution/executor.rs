use crate::error::BotError;
use crate::gateway::BrokerGateway;
use crate::models::{OrderIntent, OrderRequest, SymbolInfo, RETCODE_DONE};
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub accepted: bool,
    pub broker_order_id: Option<u64>,
    pub retcode: u32,
}

/// Human-readable meaning of common terminal retcodes
pub fn describe_retcode(retcode: u32) -> &'static str {
    match retcode {
        10004 => "requote",
        10006 => "request rejected",
        10008 => "order placed",
        10009 => "request completed",
        10010 => "only part of the request was completed",
        10013 => "invalid request",
        10014 => "invalid volume, raise equity_fraction_per_trade",
        10015 => "invalid price",
        10016 => "invalid stops",
        10018 => "market is closed",
        10019 => "not enough money",
        10027 => "autotrading disabled in the terminal",
        _ => "unknown retcode",
    }
}

/// Sends market orders through the gateway
///
/// A rejected order is logged with its full request and never retried.
pub struct OrderExecutor<'a, G: BrokerGateway> {
    gateway: &'a G,
}

impl<'a, G: BrokerGateway> OrderExecutor<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Look up the instrument, adding it to Market Watch if hidden
    pub async fn prepare_symbol(&self, symbol: &str) -> Result<SymbolInfo> {
        let mut info = self
            .gateway
            .symbol_info(symbol)
            .await?
            .ok_or_else(|| BotError::SymbolUnavailable(symbol.to_string()))?;

        if !info.visible {
            tracing::info!("  {} is not visible, trying to switch on", symbol);
            if !self.gateway.select_symbol(symbol, true).await? {
                return Err(BotError::SymbolUnavailable(symbol.to_string()));
            }
            info.visible = true;
        }

        Ok(info)
    }

    pub async fn submit(&self, intent: &OrderIntent) -> Result<ExecutionResult> {
        let request = OrderRequest::market(intent);

        tracing::info!(
            "  → order_send(): {} {} {:.2} lots @ {:.2} (sl {:.2}, tp {:.2})",
            intent.side,
            intent.symbol,
            intent.volume,
            intent.entry_price,
            intent.stop_loss,
            intent.take_profit
        );

        let result = self.gateway.submit_order(&request).await?;

        if result.retcode != RETCODE_DONE {
            let rejection = BotError::OrderRejected {
                retcode: result.retcode,
                description: describe_retcode(result.retcode).to_string(),
            };
            tracing::error!("  ✗ {} | request: {:?} | result: {:?}", rejection, request, result);

            return Ok(ExecutionResult {
                accepted: false,
                broker_order_id: None,
                retcode: result.retcode,
            });
        }

        tracing::info!(
            "  ✓ Opened position, ticket {} ({:.2} @ {:.2})",
            result.order,
            result.volume,
            result.price
        );

        Ok(ExecutionResult {
            accepted: true,
            broker_order_id: Some(result.order),
            retcode: result.retcode,
        })
    }
}
