use thiserror::Error;

use crate::persistence::StoreError;

/// Engine-level failures. Almost everything in the core degrades locally
/// (empty results, clamped configuration, `None` sizing); what surfaces
/// here is either a desynchronized caller or a failed durable write.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller addressed a symbol the engine is not tracking. This is a
    /// programming-contract violation on the host side, not a market
    /// condition.
    #[error("symbol {0} is not tracked")]
    UnknownSymbol(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
