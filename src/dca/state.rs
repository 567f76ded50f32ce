use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::market::AssetClass;

/// Per-symbol DCA state, exclusively owned by the engine. Presentation
/// layers only ever see cloned snapshots. Field names double as the
/// persisted record layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquityState {
    pub asset_type: AssetClass,
    pub levels: u32,
    pub drawdown_pct: Decimal,
    pub system_on: bool,
    pub has_position: bool,
    pub entry_price: Decimal,
    pub last_buy_price: Decimal,
    pub position_count: u32,
    pub total_invested: Decimal,
    pub avg_cost_basis: Decimal,
    pub created_at: DateTime<Utc>,
}

impl EquityState {
    pub fn new(asset_type: AssetClass, levels: u32, drawdown_pct: Decimal) -> Self {
        Self {
            asset_type,
            levels,
            drawdown_pct,
            system_on: false,
            has_position: false,
            entry_price: Decimal::ZERO,
            last_buy_price: Decimal::ZERO,
            position_count: 0,
            total_invested: Decimal::ZERO,
            avg_cost_basis: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }

    /// Fold a reported fill into the cost basis. The cumulative quantity is
    /// implied by `total_invested / avg_cost_basis`, so the record stays at
    /// the two persisted fields.
    pub fn record_fill(&mut self, notional: Decimal, fill_price: Decimal) {
        if notional <= Decimal::ZERO || fill_price <= Decimal::ZERO {
            return;
        }
        let prev_quantity = if self.avg_cost_basis > Decimal::ZERO {
            self.total_invested / self.avg_cost_basis
        } else {
            Decimal::ZERO
        };
        let quantity = notional / fill_price;
        self.total_invested += notional;
        let total_quantity = prev_quantity + quantity;
        if total_quantity > Decimal::ZERO {
            self.avg_cost_basis = self.total_invested / total_quantity;
        }
    }
}

/// Layered-entry price ladder below `entry_price`. Level `i` sits
/// `drawdown_pct x (i+1) x class multiplier` percent below entry, so each
/// successive level is progressively deeper.
pub fn generate_dca_levels(
    entry_price: Decimal,
    drawdown_pct: Decimal,
    levels: u32,
    asset_type: AssetClass,
) -> Vec<Decimal> {
    let multiplier = asset_type.profile().dca_level_multiplier;
    (0..levels)
        .map(|i| {
            let discount = drawdown_pct * Decimal::from(i + 1) * multiplier / Decimal::ONE_HUNDRED;
            entry_price * (Decimal::ONE - discount)
        })
        .collect()
}
