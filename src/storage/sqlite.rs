//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the LedgerStore
//! trait. All sites share one database; every query is scoped by site.

use crate::storage::schema::{get_schema_version, initialize_schema};
use crate::storage::traits::{LedgerList, LedgerStore, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite ledger backend for one site
pub struct SqliteLedgerStore {
    conn: Connection,
    site: String,
}

impl SqliteLedgerStore {
    /// Opens (or creates) the ledger database at `path`
    pub fn new(path: &Path, site: &str) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        Self::init(conn, site)
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory(site: &str) -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?, site)
    }

    fn init(conn: Connection, site: &str) -> StorageResult<Self> {
        initialize_schema(&conn)?;
        conn.pragma_update(None, "user_version", get_schema_version())?;
        Ok(Self {
            conn,
            site: site.to_string(),
        })
    }

    pub fn site(&self) -> &str {
        &self.site
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn load(&self, list: LedgerList) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT url FROM ledger_entries WHERE site = ?1 AND list = ?2 ORDER BY position",
        )?;

        let urls = stmt
            .query_map(params![self.site, list.as_str()], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(urls)
    }

    fn save(&mut self, list: LedgerList, urls: &[String]) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM ledger_entries WHERE site = ?1 AND list = ?2",
            params![self.site, list.as_str()],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO ledger_entries (site, list, position, url, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (position, url) in urls.iter().enumerate() {
                stmt.execute(params![self.site, list.as_str(), position as i64, url, now])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Saved {} {} URLs for {}", urls.len(), list, self.site);
        Ok(())
    }
}
