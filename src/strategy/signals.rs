use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use super::levels::LevelKind;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    EnterLong,
    EnterShort,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::EnterLong => write!(f, "ENTER_LONG"),
            SignalType::EnterShort => write!(f, "ENTER_SHORT"),
        }
    }
}

/// Time-bounded trading signal. Immutable once created: it is either
/// consumed before `expiration` or discarded by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    pub symbol: String,
    pub signal_type: SignalType,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub expiration: DateTime<Utc>,
    pub confidence: f64,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Signal {
    pub fn new(
        symbol: impl Into<String>,
        signal_type: SignalType,
        price: Decimal,
        confidence: f64,
        ttl: Duration,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            signal_type,
            price,
            created_at,
            expiration: created_at + ttl,
            confidence,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Consumers must check this before acting; a signal consumed after
    /// expiry is discarded, not retried.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiration
    }

    /// Breakout level that triggered this signal, when breakout-derived.
    pub fn level_price(&self) -> Option<Decimal> {
        self.metadata
            .get("level_price")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn level_kind(&self) -> Option<LevelKind> {
        self.metadata
            .get("level_type")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_expiration_follows_creation() {
        let signal = Signal::new(
            "AAPL",
            SignalType::EnterLong,
            dec!(100),
            0.9,
            Duration::minutes(60),
        );
        assert!(signal.expiration > signal.created_at);
        assert!(!signal.is_expired(signal.created_at));
        assert!(signal.is_expired(signal.expiration));
    }

    #[test]
    fn test_level_metadata_round_trip() {
        let signal = Signal::new(
            "AAPL",
            SignalType::EnterLong,
            dec!(51),
            0.8,
            Duration::minutes(60),
        )
        .with_metadata("level_price", serde_json::to_value(dec!(50)).unwrap())
        .with_metadata(
            "level_type",
            serde_json::to_value(LevelKind::Resistance).unwrap(),
        );

        assert_eq!(signal.level_price(), Some(dec!(50)));
        assert_eq!(signal.level_kind(), Some(LevelKind::Resistance));
    }
}
