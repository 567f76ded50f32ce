pub mod asset;
pub mod bars;
pub mod provider;

pub use asset::{AssetClass, AssetClassProfile};
pub use bars::{PriceBar, PriceSeries};
pub use provider::MarketDataProvider;
