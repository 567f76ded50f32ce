use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::market::{AssetClass, PriceSeries};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Support,
    Resistance,
}

impl fmt::Display for LevelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelKind::Support => write!(f, "support"),
            LevelKind::Resistance => write!(f, "resistance"),
        }
    }
}

/// Support or resistance level with a relative strength in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Decimal,
    pub kind: LevelKind,
    pub strength: f64,
    pub created_at: DateTime<Utc>,
    pub asset_class: AssetClass,
}

/// Levels for one instrument, strongest first, capped at `max_levels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSet {
    pub symbol: String,
    pub timeframe: String,
    pub levels: Vec<PriceLevel>,
    pub last_updated: DateTime<Utc>,
}

impl LevelSet {
    fn empty(symbol: &str, timeframe: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            levels: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LevelDetectorConfig {
    /// Bars on each side of a candidate extremum.
    pub window_size: usize,
    /// Fractional reversal that maps to full strength (3% default).
    pub threshold: f64,
    pub min_strength: f64,
    pub max_levels: usize,
}

impl Default for LevelDetectorConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            threshold: 0.03,
            min_strength: 0.5,
            max_levels: 5,
        }
    }
}

/// Scans a price series for swing highs/lows and clusters them into ranked
/// support/resistance levels. Pure function of input and configuration.
pub struct LevelDetector {
    config: LevelDetectorConfig,
}

impl LevelDetector {
    pub fn new(mut config: LevelDetectorConfig) -> Self {
        // Out-of-bound configuration is clamped, not rejected
        if config.window_size == 0 {
            tracing::warn!("window_size 0 is invalid, clamping to 1");
            config.window_size = 1;
        }
        if config.threshold <= 0.0 {
            tracing::warn!("threshold {} is invalid, using 0.03", config.threshold);
            config.threshold = 0.03;
        }
        if !(0.0..=1.0).contains(&config.min_strength) {
            tracing::warn!("min_strength {} is invalid, using 0.5", config.min_strength);
            config.min_strength = 0.5;
        }
        if config.max_levels == 0 {
            tracing::warn!("max_levels 0 is invalid, clamping to 1");
            config.max_levels = 1;
        }
        Self { config }
    }

    /// Detect levels. Short history is a normal condition for fresh
    /// instruments and yields an empty set, never an error.
    pub fn detect(&self, series: &PriceSeries) -> LevelSet {
        let w = self.config.window_size;
        if series.bars.len() < w * 2 {
            return LevelSet::empty(&series.symbol, &series.timeframe);
        }

        let highs: Vec<Decimal> = series.bars.iter().map(|b| b.high).collect();
        let lows: Vec<Decimal> = series.bars.iter().map(|b| b.low).collect();

        let resistance = self.cluster(self.find_extrema(&highs, LevelKind::Resistance));
        let support = self.cluster(self.find_extrema(&lows, LevelKind::Support));

        let now = Utc::now();
        let mut levels: Vec<PriceLevel> = resistance
            .into_iter()
            .map(|(price, strength)| (price, strength, LevelKind::Resistance))
            .chain(
                support
                    .into_iter()
                    .map(|(price, strength)| (price, strength, LevelKind::Support)),
            )
            .filter(|(_, strength, _)| *strength >= self.config.min_strength)
            .map(|(price, strength, kind)| PriceLevel {
                price,
                kind,
                strength,
                created_at: now,
                asset_class: series.asset_class,
            })
            .collect();

        levels.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(Ordering::Equal)
        });
        levels.truncate(self.config.max_levels);

        LevelSet {
            symbol: series.symbol.clone(),
            timeframe: series.timeframe.clone(),
            levels,
            last_updated: now,
        }
    }

    /// Raw swing extrema with strength `min(left, right) / threshold`,
    /// clamped to `[0, 1]`. For resistance the reversal is the fractional
    /// drop to the nearest lower extremum on each side; support mirrors it
    /// with rises.
    fn find_extrema(&self, data: &[Decimal], kind: LevelKind) -> Vec<(Decimal, f64)> {
        let w = self.config.window_size;
        let mut out = Vec::new();

        for i in w..data.len().saturating_sub(w) {
            let window = &data[i - w..=i + w];
            let is_extremum = match kind {
                LevelKind::Resistance => data[i] == fold_max(window),
                LevelKind::Support => data[i] == fold_min(window),
            };
            if !is_extremum || data[i] <= Decimal::ZERO {
                continue;
            }

            let left = &data[i - w..i];
            let right = &data[i + 1..=i + w];
            let (left_move, right_move) = match kind {
                LevelKind::Resistance => (data[i] - fold_min(left), data[i] - fold_min(right)),
                LevelKind::Support => (fold_max(left) - data[i], fold_max(right) - data[i]),
            };

            let reversal = left_move.min(right_move) / data[i];
            let strength = reversal.to_f64().unwrap_or(0.0) / self.config.threshold;
            if strength > 0.0 {
                out.push((data[i], strength.min(1.0)));
            }
        }

        out
    }

    /// Merge adjacent extrema whose relative price distance is below
    /// `threshold / 2`; each cluster collapses to its mean price and mean
    /// strength.
    fn cluster(&self, mut points: Vec<(Decimal, f64)>) -> Vec<(Decimal, f64)> {
        if points.is_empty() {
            return points;
        }
        points.sort_by(|a, b| a.0.cmp(&b.0));

        let merge_threshold = self.config.threshold / 2.0;
        let mut clustered = Vec::new();
        let mut cluster: Vec<(Decimal, f64)> = vec![points[0]];

        for pair in points.windows(2) {
            let (prev_price, _) = pair[0];
            let (price, strength) = pair[1];
            let distance = ((price - prev_price) / prev_price).to_f64().unwrap_or(f64::MAX);
            if distance < merge_threshold {
                cluster.push((price, strength));
            } else {
                clustered.push(collapse(&cluster));
                cluster = vec![(price, strength)];
            }
        }
        clustered.push(collapse(&cluster));

        clustered
    }
}

fn collapse(cluster: &[(Decimal, f64)]) -> (Decimal, f64) {
    let n = Decimal::from(cluster.len() as u64);
    let price = cluster.iter().map(|(p, _)| *p).sum::<Decimal>() / n;
    let strength = cluster.iter().map(|(_, s)| *s).sum::<f64>() / cluster.len() as f64;
    (price, strength)
}

fn fold_max(data: &[Decimal]) -> Decimal {
    data.iter().copied().fold(Decimal::MIN, Decimal::max)
}

fn fold_min(data: &[Decimal]) -> Decimal {
    data.iter().copied().fold(Decimal::MAX, Decimal::min)
}
