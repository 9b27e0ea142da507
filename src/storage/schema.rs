//! Database schema definitions
//!
//! This module contains the SQL schema for the SQLite retry ledger.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per URL per ledger list; position keeps list order
CREATE TABLE IF NOT EXISTS ledger_entries (
    site TEXT NOT NULL,
    list TEXT NOT NULL,
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (site, list, position)
);

CREATE INDEX IF NOT EXISTS idx_ledger_site_list ON ledger_entries(site, list);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
