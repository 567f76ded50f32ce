use chrono::Utc;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::dca::EquityState;

/// Startup load failure. Corruption is a distinct variant so the caller can
/// quarantine the bad document and cold-start instead of crashing.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("equities file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("failed to serialize equity states: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable symbol-keyed store for DCA state: one JSON document per install.
/// Every mutation writes through synchronously, copying the previous
/// document to a `.bak` sidecar first. Missed or duplicated DCA legs after
/// a crash are only avoided because nothing here is batched.
pub struct EquityStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, EquityState>>,
}

impl EquityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all persisted states. A missing or zero-length file is a cold
    /// start, not an error; a file that exists but does not parse is
    /// reported as [`LoadError::Corrupt`].
    pub fn load(&self) -> Result<HashMap<String, EquityState>, LoadError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }

        let states: HashMap<String, EquityState> =
            serde_json::from_str(&raw).map_err(|source| LoadError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        *self.lock_cache() = states.clone();
        Ok(states)
    }

    /// Move a corrupt document aside as `<file>.backup_<unix_ts>` so it can
    /// be inspected later, and let the engine make forward progress.
    pub fn quarantine(&self) -> io::Result<PathBuf> {
        let target = sidecar(&self.path, &format!(".backup_{}", Utc::now().timestamp()));
        std::fs::rename(&self.path, &target)?;
        Ok(target)
    }

    /// Write through synchronously. The cache only takes the new entry once
    /// the document is on disk, so a failed write leaves both cache and file
    /// showing the last durable state.
    pub fn upsert(&self, symbol: &str, state: EquityState) -> Result<(), StoreError> {
        let mut cache = self.lock_cache();
        let mut staged = cache.clone();
        staged.insert(symbol.to_string(), state);
        self.write_document(&staged)?;
        *cache = staged;
        Ok(())
    }

    pub fn remove(&self, symbol: &str) -> Result<(), StoreError> {
        let mut cache = self.lock_cache();
        let mut staged = cache.clone();
        staged.remove(symbol);
        self.write_document(&staged)?;
        *cache = staged;
        Ok(())
    }

    fn write_document(&self, states: &HashMap<String, EquityState>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Keep the previous good document around before overwriting
        if self
            .path
            .metadata()
            .map(|m| m.len() > 0)
            .unwrap_or(false)
        {
            std::fs::copy(&self.path, sidecar(&self.path, ".bak"))?;
        }

        let json = serde_json::to_string_pretty(states)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<String, EquityState>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::AssetClass;
    use rust_decimal_macros::dec;

    fn state() -> EquityState {
        EquityState::new(AssetClass::Stock, 5, dec!(5))
    }

    #[test]
    fn test_missing_file_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = EquityStore::new(dir.path().join("equities.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_empty_file_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equities.json");
        std::fs::write(&path, "").unwrap();
        let store = EquityStore::new(&path);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equities.json");

        let mut original = state();
        original.system_on = true;
        original.has_position = true;
        original.entry_price = dec!(101.5);
        original.last_buy_price = dec!(96.2);
        original.position_count = 3;
        original.total_invested = dec!(1500);
        original.avg_cost_basis = dec!(98.7);

        EquityStore::new(&path).upsert("AAPL", original.clone()).unwrap();

        let loaded = EquityStore::new(&path).load().unwrap();
        assert_eq!(loaded.get("AAPL"), Some(&original));
    }

    #[test]
    fn test_corrupt_file_reported_and_quarantined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equities.json");
        std::fs::write(&path, "{not valid json!").unwrap();

        let store = EquityStore::new(&path);
        assert!(matches!(store.load(), Err(LoadError::Corrupt { .. })));

        let backup = store.quarantine().unwrap();
        assert!(!path.exists());
        assert!(backup.exists());
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .contains(".backup_"));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{not valid json!");
    }

    #[test]
    fn test_bak_sidecar_holds_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equities.json");
        let store = EquityStore::new(&path);

        store.upsert("AAPL", state()).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        let mut toggled = state();
        toggled.system_on = true;
        store.upsert("AAPL", toggled).unwrap();

        let bak = std::fs::read_to_string(dir.path().join("equities.json.bak")).unwrap();
        assert_eq!(bak, first);
        assert_ne!(std::fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_failed_write_does_not_poison_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equities.json");
        let store = EquityStore::new(&path);
        store.upsert("AAPL", state()).unwrap();

        // A directory squatting on the .bak sidecar makes the pre-write
        // backup copy fail
        let bak = dir.path().join("equities.json.bak");
        std::fs::create_dir(&bak).unwrap();
        assert!(store.upsert("TSLA", state()).is_err());
        std::fs::remove_dir(&bak).unwrap();

        // The rejected entry must not leak into later successful writes
        store.upsert("MSFT", state()).unwrap();
        let loaded = EquityStore::new(&path).load().unwrap();
        assert!(loaded.contains_key("AAPL"));
        assert!(loaded.contains_key("MSFT"));
        assert!(!loaded.contains_key("TSLA"));
    }

    #[test]
    fn test_remove_deletes_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("equities.json");
        let store = EquityStore::new(&path);

        store.upsert("AAPL", state()).unwrap();
        store.upsert("TSLA", state()).unwrap();
        store.remove("AAPL").unwrap();

        let loaded = EquityStore::new(&path).load().unwrap();
        assert!(!loaded.contains_key("AAPL"));
        assert!(loaded.contains_key("TSLA"));
    }
}
