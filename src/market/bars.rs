use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AssetClass;

/// Single OHLCV bar.
///
/// Construct through [`PriceBar::new`], which widens `high`/`low` to enclose
/// `open`/`close` instead of rejecting inconsistent bars. Noisy feeds produce
/// such bars routinely and the pipeline must keep moving.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: f64,
}

impl PriceBar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: f64,
    ) -> Self {
        let high = high.max(open).max(close);
        let low = low.min(open).min(close);
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Ordered (oldest first) snapshot of bars for one instrument. Owned by the
/// caller and read-only to the engine; a fresh snapshot is supplied per
/// evaluation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub timeframe: String,
    pub asset_class: AssetClass,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
        asset_class: AssetClass,
        bars: Vec<PriceBar>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            asset_class,
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last_bar(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Mean volume over the most recent `lookback` bars, or over the whole
    /// series when it is shorter.
    pub fn average_volume(&self, lookback: usize) -> f64 {
        if self.bars.is_empty() {
            return 0.0;
        }
        let start = self.bars.len().saturating_sub(lookback);
        let window = &self.bars[start..];
        window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64
    }
}
