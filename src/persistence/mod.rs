pub mod store;

pub use store::{EquityStore, LoadError, StoreError};
