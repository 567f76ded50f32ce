pub mod breakout;
pub mod levels;
pub mod signals;

pub use breakout::{BreakoutSignalGenerator, SignalConfig};
pub use levels::{LevelDetector, LevelDetectorConfig, LevelKind, LevelSet, PriceLevel};
pub use signals::{Signal, SignalType};
