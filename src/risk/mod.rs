pub mod atr;
pub mod sizer;

pub use atr::average_true_range;
pub use sizer::{RiskParameters, RiskSizer};
