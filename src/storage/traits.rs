//! Storage traits and error types
//!
//! This module defines the trait interface for retry-ledger backends and
//! associated error types.

use std::fmt;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Malformed ledger data in {origin}: {message}")]
    MalformedPayload { origin: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The URL lists kept per site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerList {
    /// URLs the next cycle (or the next invocation) will drive
    Pending,
    /// URLs that failed in the current cycle
    Failed,
    /// URLs that succeeded in some cycle
    Processed,
    /// Links found on listing seeds; they are detail pages whatever their path
    Details,
}

impl LedgerList {
    pub const ALL: [LedgerList; 4] = [
        Self::Pending,
        Self::Failed,
        Self::Processed,
        Self::Details,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Processed => "processed",
            Self::Details => "details",
        }
    }
}

impl fmt::Display for LedgerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for retry-ledger backends
///
/// A store is scoped to one site. Lists are saved whole; the order of a
/// saved list is preserved on load.
pub trait LedgerStore {
    /// Loads a list; a list never saved is empty
    fn load(&self, list: LedgerList) -> StorageResult<Vec<String>>;

    /// Replaces a list
    fn save(&mut self, list: LedgerList, urls: &[String]) -> StorageResult<()>;

    /// Empties every list
    fn clear(&mut self) -> StorageResult<()> {
        for list in LedgerList::ALL {
            self.save(list, &[])?;
        }
        Ok(())
    }
}
