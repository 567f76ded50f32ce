pub mod core;
pub mod dca;
pub mod execution;
pub mod market;
pub mod persistence;
pub mod risk;
pub mod strategy;

pub use crate::core::{Config, EngineError};
pub use dca::{DcaEngine, EntryRequest, EquityState};
pub use market::{AssetClass, AssetClassProfile, PriceBar, PriceSeries};
pub use persistence::{EquityStore, LoadError};
pub use risk::{RiskParameters, RiskSizer};
pub use strategy::{
    BreakoutSignalGenerator, LevelDetector, LevelKind, LevelSet, PriceLevel, Signal, SignalType,
};
