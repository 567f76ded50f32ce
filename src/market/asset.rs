use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset classification driving risk, sizing and DCA spacing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Stock,
    Crypto,
    Forex,
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetClass::Stock => write!(f, "stock"),
            AssetClass::Crypto => write!(f, "crypto"),
            AssetClass::Forex => write!(f, "forex"),
        }
    }
}

const CRYPTO_BASES: &[&str] = &[
    "BTC", "ETH", "SOL", "DOGE", "ADA", "XRP", "LTC", "BNB", "AVAX", "DOT", "LINK", "MATIC",
];

const FIAT_CODES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CHF", "NZD",
];

const METAL_ALIASES: &[&str] = &["XAUUSD", "XAGUSD", "GOLD", "SILVER", "GC=F", "SI=F"];

impl AssetClass {
    /// Classify a symbol by its syntax when the operator does not supply a
    /// class explicitly. `BTC-USD`/`ETHUSD` style pairs are crypto, six-letter
    /// fiat pairs / `=X` suffixes / precious-metal aliases are forex,
    /// everything else is treated as a stock ticker.
    pub fn detect(symbol: &str) -> AssetClass {
        let upper = symbol.trim().to_ascii_uppercase();

        if METAL_ALIASES.contains(&upper.as_str()) {
            return AssetClass::Forex;
        }
        if upper.ends_with("=X") {
            return AssetClass::Forex;
        }
        if let Some(base) = upper.strip_suffix("-USD") {
            if !base.is_empty() {
                return AssetClass::Crypto;
            }
        }
        if let Some(base) = upper.strip_suffix("USDT").or_else(|| upper.strip_suffix("USD")) {
            if CRYPTO_BASES.contains(&base) {
                return AssetClass::Crypto;
            }
        }
        if upper.len() == 6 && upper.chars().all(|c| c.is_ascii_alphabetic()) {
            let (base, quote) = upper.split_at(3);
            if FIAT_CODES.contains(&base) && FIAT_CODES.contains(&quote) {
                return AssetClass::Forex;
            }
        }

        AssetClass::Stock
    }

    /// Static per-class risk table. All class-specific constants live here so
    /// a new asset class is a data change, not scattered branching.
    pub fn profile(&self) -> AssetClassProfile {
        match self {
            AssetClass::Stock => AssetClassProfile {
                risk_per_trade: Decimal::new(1, 2),              // 1%
                max_position_fraction: Decimal::new(10, 2),      // 10%
                atr_stop_multiplier: Decimal::new(15, 1),        // 1.5x ATR
                target_rr_ratio: Decimal::new(20, 1),            // 2.0 R:R
                min_price: Decimal::ONE,
                min_stop_distance_fraction: Decimal::new(5, 3),  // 0.5%
                min_order_notional: Decimal::ONE_HUNDRED,
                dca_level_multiplier: Decimal::new(12, 1),       // 1.2
                dca_trigger_threshold: Decimal::new(5, 2),       // 5%
                max_dca_levels: 10,
                max_drawdown_pct: Decimal::from(20),
                default_dca_levels: 5,
                default_drawdown_pct: Decimal::from(5),
            },
            AssetClass::Crypto => AssetClassProfile {
                risk_per_trade: Decimal::new(2, 2),              // 2%
                max_position_fraction: Decimal::new(15, 2),      // 15%
                atr_stop_multiplier: Decimal::TWO,
                target_rr_ratio: Decimal::new(25, 1),            // 2.5 R:R
                min_price: Decimal::new(1, 6),
                min_stop_distance_fraction: Decimal::new(1, 2),  // 1%
                min_order_notional: Decimal::TEN,
                dca_level_multiplier: Decimal::new(13, 1),       // 1.3
                dca_trigger_threshold: Decimal::new(3, 2),       // 3%
                max_dca_levels: 15,
                max_drawdown_pct: Decimal::from(30),
                default_dca_levels: 8,
                default_drawdown_pct: Decimal::from(3),
            },
            AssetClass::Forex => AssetClassProfile {
                risk_per_trade: Decimal::new(1, 2),              // 1%
                max_position_fraction: Decimal::new(10, 2),      // 10%
                atr_stop_multiplier: Decimal::ONE,
                target_rr_ratio: Decimal::new(15, 1),            // 1.5 R:R
                min_price: Decimal::new(1, 4),
                min_stop_distance_fraction: Decimal::new(1, 3),  // 0.1%
                min_order_notional: Decimal::ONE_THOUSAND,
                dca_level_multiplier: Decimal::new(11, 1),       // 1.1
                dca_trigger_threshold: Decimal::new(2, 2),       // 2%
                max_dca_levels: 8,
                max_drawdown_pct: Decimal::from(15),
                default_dca_levels: 4,
                default_drawdown_pct: Decimal::TWO,
            },
        }
    }
}

/// Per-class risk and sizing constants. Configuration data, never mutated at
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssetClassProfile {
    pub risk_per_trade: Decimal,
    pub max_position_fraction: Decimal,
    pub atr_stop_multiplier: Decimal,
    pub target_rr_ratio: Decimal,
    pub min_price: Decimal,
    pub min_stop_distance_fraction: Decimal,
    pub min_order_notional: Decimal,
    pub dca_level_multiplier: Decimal,
    pub dca_trigger_threshold: Decimal,
    pub max_dca_levels: u32,
    pub max_drawdown_pct: Decimal,
    pub default_dca_levels: u32,
    pub default_drawdown_pct: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_detection() {
        assert_eq!(AssetClass::detect("BTC-USD"), AssetClass::Crypto);
        assert_eq!(AssetClass::detect("ETHUSD"), AssetClass::Crypto);
        assert_eq!(AssetClass::detect("solusdt"), AssetClass::Crypto);
    }

    #[test]
    fn test_forex_detection() {
        assert_eq!(AssetClass::detect("EURUSD"), AssetClass::Forex);
        assert_eq!(AssetClass::detect("GBPJPY"), AssetClass::Forex);
        assert_eq!(AssetClass::detect("EURUSD=X"), AssetClass::Forex);
        assert_eq!(AssetClass::detect("XAUUSD"), AssetClass::Forex);
        assert_eq!(AssetClass::detect("GOLD"), AssetClass::Forex);
    }

    #[test]
    fn test_stock_default() {
        assert_eq!(AssetClass::detect("AAPL"), AssetClass::Stock);
        assert_eq!(AssetClass::detect("TSLA"), AssetClass::Stock);
        // Six letters but not a fiat pair
        assert_eq!(AssetClass::detect("GOOGLE"), AssetClass::Stock);
    }

    #[test]
    fn test_profiles_are_sane() {
        for class in [AssetClass::Stock, AssetClass::Crypto, AssetClass::Forex] {
            let p = class.profile();
            assert!(p.risk_per_trade > Decimal::ZERO);
            assert!(p.risk_per_trade < p.max_position_fraction);
            assert!(p.default_dca_levels <= p.max_dca_levels);
            assert!(p.default_drawdown_pct <= p.max_drawdown_pct);
        }
    }
}
