use anyhow::Result;
use std::sync::Arc;

use breakout_dca_bot::core::{logging, Config};
use breakout_dca_bot::dca::DcaEngine;
use breakout_dca_bot::market::AssetClass;
use breakout_dca_bot::persistence::EquityStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level);

    tracing::info!("🚀 Breakout/DCA trading engine starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Equities file: {}", config.dca.equities_file);
    tracing::info!("Account size: {}", config.risk.account_size);

    // Restore DCA state; a corrupt file is quarantined inside open()
    let store = EquityStore::new(&config.dca.equities_file);
    let engine = Arc::new(DcaEngine::open(store)?);

    let tracked = engine.snapshots().await;
    tracing::info!("✅ Restored {} tracked symbols", tracked.len());
    for (symbol, state) in &tracked {
        tracing::info!(
            "  {} ({}): system {}, {} legs",
            symbol,
            state.asset_type,
            if state.system_on { "on" } else { "off" },
            state.position_count
        );
    }

    // Keep running; price ticks and operator commands arrive from the
    // data/GUI collaborators
    loop {
        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
        let summary = engine.asset_class_summary().await;
        tracing::info!(
            "Tracking {} symbols (stock: {}, crypto: {}, forex: {})",
            summary.values().sum::<usize>(),
            summary.get(&AssetClass::Stock).copied().unwrap_or(0),
            summary.get(&AssetClass::Crypto).copied().unwrap_or(0),
            summary.get(&AssetClass::Forex).copied().unwrap_or(0)
        );
    }
}
