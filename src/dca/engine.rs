use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::core::EngineError;
use crate::market::AssetClass;
use crate::persistence::{EquityStore, LoadError};
use crate::strategy::SignalType;

use super::state::{generate_dca_levels, EquityState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Initial,
    DcaLeg { level_index: usize },
}

/// Request handed to the order-execution collaborator. The engine never
/// submits orders itself and never learns fill status here; fills come back
/// through `apply_fill`.
#[derive(Debug, Clone, Serialize)]
pub struct EntryRequest {
    pub symbol: String,
    pub side: SignalType,
    pub price: Decimal,
    pub kind: EntryKind,
    pub requested_at: DateTime<Utc>,
}

/// Per-symbol layered-entry state machine:
/// `Removed -> Configured/Off <-> Armed -> Layered(n)`.
///
/// Each symbol lives behind its own mutex, so concurrent `on_price` calls
/// for different symbols run in parallel while a single symbol's
/// read-modify-write of state plus store stays serialized.
pub struct DcaEngine {
    equities: RwLock<HashMap<String, Arc<Mutex<EquityState>>>>,
    store: EquityStore,
}

impl DcaEngine {
    /// Load persisted state and build the engine. A corrupt store is
    /// quarantined and the engine cold-starts; only an unreadable disk
    /// propagates.
    pub fn open(store: EquityStore) -> Result<Self, LoadError> {
        let states = match store.load() {
            Ok(states) => states,
            Err(LoadError::Corrupt { path, source }) => {
                tracing::error!("equities file {} is corrupt: {}", path.display(), source);
                match store.quarantine() {
                    Ok(backup) => {
                        tracing::warn!(
                            "quarantined corrupt state to {}, cold-starting",
                            backup.display()
                        );
                    }
                    Err(e) => {
                        tracing::error!("failed to quarantine corrupt state: {}", e);
                    }
                }
                HashMap::new()
            }
            Err(e) => return Err(e),
        };

        let equities = states
            .into_iter()
            .map(|(symbol, state)| (symbol, Arc::new(Mutex::new(state))))
            .collect();

        Ok(Self {
            equities: RwLock::new(equities),
            store,
        })
    }

    /// Track a new instrument, off by default. Level count and drawdown are
    /// clamped into the asset class's bounds; the class is detected from the
    /// symbol when not supplied.
    pub async fn add(
        &self,
        symbol: &str,
        levels: u32,
        drawdown_pct: Decimal,
        asset_class: Option<AssetClass>,
    ) -> Result<EquityState, EngineError> {
        let class = asset_class.unwrap_or_else(|| AssetClass::detect(symbol));
        let profile = class.profile();

        let levels = if levels == 0 {
            tracing::warn!("{}: 0 DCA levels requested, using class default {}", symbol, profile.default_dca_levels);
            profile.default_dca_levels
        } else if levels > profile.max_dca_levels {
            tracing::warn!(
                "{}: {} DCA levels exceeds {} cap of {}, clamping",
                symbol,
                levels,
                class,
                profile.max_dca_levels
            );
            profile.max_dca_levels
        } else {
            levels
        };

        let drawdown_pct = if drawdown_pct <= Decimal::ZERO {
            tracing::warn!(
                "{}: drawdown {}% is invalid, using class default {}%",
                symbol,
                drawdown_pct,
                profile.default_drawdown_pct
            );
            profile.default_drawdown_pct
        } else if drawdown_pct > profile.max_drawdown_pct {
            tracing::warn!(
                "{}: drawdown {}% exceeds {} cap of {}%, clamping",
                symbol,
                drawdown_pct,
                class,
                profile.max_drawdown_pct
            );
            profile.max_drawdown_pct
        } else {
            drawdown_pct
        };

        let state = EquityState::new(class, levels, drawdown_pct);
        let mut equities = self.equities.write().await;
        if equities.contains_key(symbol) {
            tracing::warn!("{}: already tracked, replacing configuration", symbol);
        }
        // Persist first; the in-memory map only learns the symbol once the
        // write is durable
        self.store.upsert(symbol, state.clone())?;
        equities.insert(symbol.to_string(), Arc::new(Mutex::new(state.clone())));

        tracing::info!(
            "➕ Tracking {} ({}): {} levels, {}% base drawdown",
            symbol,
            class,
            levels,
            drawdown_pct
        );
        Ok(state)
    }

    /// Flip `system_on` without touching position state. Returns the new
    /// setting.
    pub async fn toggle(&self, symbol: &str) -> Result<bool, EngineError> {
        let slot = self.slot(symbol).await?;
        let mut state = slot.lock().await;
        let mut staged = state.clone();
        staged.system_on = !staged.system_on;
        self.store.upsert(symbol, staged.clone())?;
        *state = staged;
        tracing::info!(
            "{} system {} for {}",
            if state.system_on { "🟢" } else { "🔴" },
            if state.system_on { "ON" } else { "OFF" },
            symbol
        );
        Ok(state.system_on)
    }

    /// Evaluate one price tick. At most one entry request comes back per
    /// call: the initial entry when flat, otherwise the first (shallowest)
    /// DCA level the price has reached, gated by the drop-from-last-buy
    /// threshold. Every state change is persisted before the request is
    /// returned.
    pub async fn on_price(
        &self,
        symbol: &str,
        price: Decimal,
    ) -> Result<Option<EntryRequest>, EngineError> {
        if price <= Decimal::ZERO {
            return Ok(None);
        }
        let slot = self.slot(symbol).await?;
        let mut state = slot.lock().await;
        if !state.system_on {
            return Ok(None);
        }

        if !state.has_position {
            // Stage on a copy so a failed write leaves the symbol flat and
            // the next tick can retry the entry
            let mut staged = state.clone();
            staged.has_position = true;
            staged.entry_price = price;
            staged.last_buy_price = price;
            staged.position_count = 1;
            self.store.upsert(symbol, staged.clone())?;
            *state = staged;
            tracing::info!("📈 {} initial entry requested @ {}", symbol, price);
            return Ok(Some(self.request(symbol, price, EntryKind::Initial)));
        }

        let profile = state.asset_type.profile();
        let trigger = state.last_buy_price * (Decimal::ONE - profile.dca_trigger_threshold);
        if price >= trigger {
            return Ok(None);
        }

        let ladder = generate_dca_levels(
            state.entry_price,
            state.drawdown_pct,
            state.levels,
            state.asset_type,
        );
        for (index, level) in ladder.into_iter().enumerate() {
            if level > Decimal::ZERO && price <= level {
                let mut staged = state.clone();
                staged.position_count += 1;
                staged.last_buy_price = price;
                self.store.upsert(symbol, staged.clone())?;
                *state = staged;
                tracing::info!(
                    "📉 {} DCA leg {} requested @ {} (tick {}, leg count {})",
                    symbol,
                    index,
                    level,
                    price,
                    state.position_count
                );
                return Ok(Some(self.request(
                    symbol,
                    level,
                    EntryKind::DcaLeg { level_index: index },
                )));
            }
        }

        Ok(None)
    }

    /// Fold an executed fill back into the symbol's cost basis.
    pub async fn apply_fill(
        &self,
        symbol: &str,
        notional: Decimal,
        fill_price: Decimal,
    ) -> Result<(), EngineError> {
        if notional <= Decimal::ZERO || fill_price <= Decimal::ZERO {
            tracing::warn!(
                "{}: ignoring fill with notional {} @ {}",
                symbol,
                notional,
                fill_price
            );
            return Ok(());
        }
        let slot = self.slot(symbol).await?;
        let mut state = slot.lock().await;
        let mut staged = state.clone();
        staged.record_fill(notional, fill_price);
        self.store.upsert(symbol, staged.clone())?;
        *state = staged;
        Ok(())
    }

    /// Stop tracking a symbol and delete its persisted state.
    pub async fn remove(&self, symbol: &str) -> Result<(), EngineError> {
        let mut equities = self.equities.write().await;
        if !equities.contains_key(symbol) {
            return Err(EngineError::UnknownSymbol(symbol.to_string()));
        }
        self.store.remove(symbol)?;
        equities.remove(symbol);
        tracing::info!("➖ Removed {} from tracking", symbol);
        Ok(())
    }

    pub async fn snapshot(&self, symbol: &str) -> Option<EquityState> {
        let slot = self.equities.read().await.get(symbol).cloned()?;
        let state = slot.lock().await;
        Some(state.clone())
    }

    pub async fn snapshots(&self) -> Vec<(String, EquityState)> {
        let slots: Vec<(String, Arc<Mutex<EquityState>>)> = {
            let equities = self.equities.read().await;
            equities
                .iter()
                .map(|(s, slot)| (s.clone(), slot.clone()))
                .collect()
        };
        let mut out = Vec::with_capacity(slots.len());
        for (symbol, slot) in slots {
            let state = slot.lock().await;
            out.push((symbol, state.clone()));
        }
        out
    }

    pub async fn asset_class_summary(&self) -> HashMap<AssetClass, usize> {
        let mut summary = HashMap::new();
        for (_, state) in self.snapshots().await {
            *summary.entry(state.asset_type).or_insert(0) += 1;
        }
        summary
    }

    fn request(&self, symbol: &str, price: Decimal, kind: EntryKind) -> EntryRequest {
        EntryRequest {
            symbol: symbol.to_string(),
            side: SignalType::EnterLong,
            price,
            kind,
            requested_at: Utc::now(),
        }
    }

    async fn slot(&self, symbol: &str) -> Result<Arc<Mutex<EquityState>>, EngineError> {
        self.equities
            .read()
            .await
            .get(symbol)
            .cloned()
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))
    }
}
