use anyhow::Result;
use rust_decimal::Decimal;
use std::env;

use crate::strategy::{LevelDetectorConfig, SignalConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub detector: LevelDetectorConfig,
    pub signals: SignalConfig,
    pub risk: RiskConfig,
    pub dca: DcaConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub account_size: Decimal,
}

#[derive(Debug, Clone)]
pub struct DcaConfig {
    pub equities_file: String,
}

#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            detector: LevelDetectorConfig {
                window_size: env::var("LEVEL_WINDOW_SIZE")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                threshold: env::var("LEVEL_THRESHOLD")
                    .unwrap_or_else(|_| "0.03".to_string())
                    .parse()
                    .unwrap_or(0.03),
                min_strength: env::var("LEVEL_MIN_STRENGTH")
                    .unwrap_or_else(|_| "0.5".to_string())
                    .parse()
                    .unwrap_or(0.5),
                max_levels: env::var("LEVEL_MAX_COUNT")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            signals: SignalConfig {
                min_level_strength: env::var("SIGNAL_MIN_LEVEL_STRENGTH")
                    .unwrap_or_else(|_| "0.7".to_string())
                    .parse()
                    .unwrap_or(0.7),
                confirmation_candles: env::var("SIGNAL_CONFIRMATION_CANDLES")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .unwrap_or(1),
                signal_expiry_minutes: env::var("SIGNAL_EXPIRY_MINUTES")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .unwrap_or(60),
                min_volume_ratio: env::var("SIGNAL_MIN_VOLUME_RATIO")
                    .unwrap_or_else(|_| "1.2".to_string())
                    .parse()
                    .unwrap_or(1.2),
            },
            risk: RiskConfig {
                account_size: env::var("ACCOUNT_SIZE")
                    .unwrap_or_else(|_| "10000".to_string())
                    .parse()
                    .unwrap_or_else(|_| Decimal::from(10000)),
            },
            dca: DcaConfig {
                equities_file: env::var("EQUITIES_FILE")
                    .unwrap_or_else(|_| "data/equities.json".to_string()),
            },
            monitoring: MonitoringConfig {
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            },
        })
    }
}
