//! JSON-file ledger backend
//!
//! Layout: `<ledger-dir>/<site>/{pending,failed,processed,details}.json`, each a
//! top-level JSON array of URL strings.

use crate::storage::traits::{LedgerList, LedgerStore, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Ledger kept as one JSON array file per list
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    dir: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(ledger_dir: impl AsRef<Path>, site: &str) -> Self {
        Self {
            dir: ledger_dir.as_ref().join(site),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, list: LedgerList) -> PathBuf {
        self.dir.join(format!("{}.json", list.as_str()))
    }
}

impl LedgerStore for JsonLedgerStore {
    fn load(&self, list: LedgerList) -> StorageResult<Vec<String>> {
        let path = self.path(list);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| StorageError::MalformedPayload {
            origin: path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn save(&mut self, list: LedgerList, urls: &[String]) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(urls)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        // Write then rename so a crash never leaves a truncated list
        let path = self.path(list);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!("Saved {} {} URLs to {}", urls.len(), list, path.display());
        Ok(())
    }
}
