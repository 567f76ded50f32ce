use anyhow::Result;
use async_trait::async_trait;

use super::PriceSeries;

/// Boundary with the market-data collaborator. The engine only consumes
/// time-ordered `PriceSeries` snapshots; retrieval cadence, vendors and
/// caching live behind this trait.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_series(&self, symbol: &str, timeframe: &str) -> Result<PriceSeries>;
}
