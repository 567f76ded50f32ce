use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::dca::EntryRequest;
use crate::risk::RiskParameters;

/// Boundary with the order-execution collaborator. The engine hands over a
/// sized request and gets back an order id; brokerage connectivity, fill
/// tracking and retries live on the other side of this trait.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    async fn submit_entry(&self, request: &EntryRequest, risk: &RiskParameters) -> Result<String>;
}

/// Logs requests instead of routing them to a brokerage.
pub struct PaperExecutor;

#[async_trait]
impl OrderExecutor for PaperExecutor {
    async fn submit_entry(&self, request: &EntryRequest, risk: &RiskParameters) -> Result<String> {
        let order_id = Uuid::new_v4().to_string();
        tracing::info!(
            "📝 PAPER {} {} {} @ {} (size {}, stop {})",
            order_id,
            request.side,
            request.symbol,
            request.price,
            risk.position_size,
            risk.stop_loss_price
        );
        Ok(order_id)
    }
}
