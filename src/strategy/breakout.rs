use chrono::Duration;
use serde_json::json;

use crate::market::PriceSeries;

use super::levels::{LevelKind, LevelSet, PriceLevel};
use super::signals::{Signal, SignalType};

const VOLUME_LOOKBACK: usize = 20;

#[derive(Debug, Clone)]
pub struct SignalConfig {
    pub min_level_strength: f64,
    pub confirmation_candles: usize,
    pub signal_expiry_minutes: i64,
    pub min_volume_ratio: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_level_strength: 0.7,
            confirmation_candles: 1,
            signal_expiry_minutes: 60,
            min_volume_ratio: 1.2,
        }
    }
}

/// Detects confirmed level breakouts and emits time-bounded signals.
/// One evaluation per call, no side effects.
pub struct BreakoutSignalGenerator {
    config: SignalConfig,
}

impl BreakoutSignalGenerator {
    pub fn new(mut config: SignalConfig) -> Self {
        if config.confirmation_candles == 0 {
            tracing::warn!("confirmation_candles 0 is invalid, clamping to 1");
            config.confirmation_candles = 1;
        }
        if config.signal_expiry_minutes < 1 {
            tracing::warn!(
                "signal_expiry_minutes {} is invalid, clamping to 1",
                config.signal_expiry_minutes
            );
            config.signal_expiry_minutes = 1;
        }
        Self { config }
    }

    pub fn generate(&self, series: &PriceSeries, levels: &LevelSet) -> Vec<Signal> {
        if series.is_empty() || levels.is_empty() {
            return Vec::new();
        }

        let strong: Vec<&PriceLevel> = levels
            .levels
            .iter()
            .filter(|l| l.strength >= self.config.min_level_strength)
            .collect();
        if strong.is_empty() {
            return Vec::new();
        }

        // Window: bars before it must close on the original side of the
        // level, bars inside it must close on the breakout side.
        let need = self.config.confirmation_candles + 2;
        if series.bars.len() < need {
            return Vec::new();
        }
        let recent = &series.bars[series.bars.len() - need..];
        let (before, confirm) = recent.split_at(need - self.config.confirmation_candles);
        let last = &recent[recent.len() - 1];

        let avg_volume = series.average_volume(VOLUME_LOOKBACK);
        let volume_confirmed = last.volume > avg_volume * self.config.min_volume_ratio;
        if !volume_confirmed {
            return Vec::new();
        }

        let mut signals = Vec::new();
        for level in strong {
            let fired = match level.kind {
                LevelKind::Resistance => {
                    let was_below = before.iter().all(|b| b.close < level.price);
                    let is_above = confirm.iter().all(|b| b.close > level.price);
                    (was_below && is_above).then_some(SignalType::EnterLong)
                }
                LevelKind::Support => {
                    let was_above = before.iter().all(|b| b.close > level.price);
                    let is_below = confirm.iter().all(|b| b.close < level.price);
                    (was_above && is_below).then_some(SignalType::EnterShort)
                }
            };

            if let Some(signal_type) = fired {
                tracing::debug!(
                    "💥 {} breakout of {} {} @ {} (strength {:.2})",
                    series.symbol,
                    level.kind,
                    level.price,
                    last.close,
                    level.strength
                );
                signals.push(
                    Signal::new(
                        series.symbol.clone(),
                        signal_type,
                        last.close,
                        level.strength,
                        Duration::minutes(self.config.signal_expiry_minutes),
                    )
                    .with_metadata("level_price", json!(level.price))
                    .with_metadata("level_type", json!(level.kind))
                    .with_metadata("asset_type", json!(series.asset_class))
                    .with_metadata("breakout_bar", json!(last.timestamp.to_rfc3339())),
                );
            }
        }

        signals
    }
}
