//! Storage module for persisting retry ledgers
//!
//! This module handles ledger persistence between wave cycles and between
//! invocations, including:
//! - JSON array files per site and list
//! - A SQLite database shared by every site

mod json;
mod schema;
mod sqlite;
mod traits;

pub use json::JsonLedgerStore;
pub use sqlite::SqliteLedgerStore;
pub use traits::{LedgerList, LedgerStore, StorageError, StorageResult};

use crate::config::{LedgerBackend, OutputConfig};
use std::path::Path;

/// File name of the SQLite ledger inside `ledger-dir`
pub const LEDGER_DB_FILE: &str = "ledger.db";

/// Opens the configured ledger backend for a site
pub fn open_ledger(output: &OutputConfig, site: &str) -> StorageResult<Box<dyn LedgerStore>> {
    let dir = Path::new(&output.ledger_dir);
    let store: Box<dyn LedgerStore> = match output.ledger_backend {
        LedgerBackend::Json => Box::new(JsonLedgerStore::new(dir, site)),
        LedgerBackend::Sqlite => Box::new(SqliteLedgerStore::new(&dir.join(LEDGER_DB_FILE), site)?),
    };
    Ok(store)
}
