pub mod engine;
pub mod state;

pub use engine::{DcaEngine, EntryKind, EntryRequest};
pub use state::{generate_dca_levels, EquityState};
