use crate::gateway::BrokerGateway;
use crate::models::PositionSnapshot;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardResult {
    pub can_trade: bool,
    pub active_count: usize,
    pub snapshot: PositionSnapshot,
}

/// Refuses new orders while the symbol already has exposure
///
/// Read-only. Call right before submitting; the broker can change between
/// the check and the order and there is no lock to take against it.
pub struct PositionGuard<'a, G: BrokerGateway> {
    gateway: &'a G,
}

impl<'a, G: BrokerGateway> PositionGuard<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    pub async fn check(&self, symbol: &str) -> Result<GuardResult> {
        let positions = self.gateway.open_positions(symbol).await?;
        let orders = self.gateway.open_orders(symbol).await?;

        let snapshot = PositionSnapshot {
            open_positions: positions.len(),
            open_orders: orders.len(),
        };
        let active_count = snapshot.active_count();

        Ok(GuardResult {
            can_trade: active_count == 0,
            active_count,
            snapshot,
        })
    }
}
