//! Diary database creation and open.

use std::path::Path;

use log::info;
use rusqlite::Connection;

use crate::errors::{DiaryError, Result};

/// Current schema version, recorded in `schema_meta` at creation.
pub const SCHEMA_VERSION: i64 = 1;

/// Create a fresh diary database at `path`.
///
/// Refuses to overwrite: an existing file means an existing diary, and
/// clobbering it would destroy entries and auth slots alike.
pub fn create_database(path: &Path) -> Result<Connection> {
    if path.exists() {
        return Err(DiaryError::DiaryAlreadyExists(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    create_tables(&conn)?;
    info!("Created diary database at {}", path.display());
    Ok(conn)
}

/// Open an existing diary database.
pub fn open_database(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(DiaryError::DiaryNotFound(path.to_path_buf()));
    }
    Ok(Connection::open(path)?)
}

/// Create the schema on an open connection.
///
/// Split out from `create_database` so tests can run against in-memory
/// connections.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_meta (
            version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS auth_slots (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            kind         TEXT NOT NULL,
            label        TEXT NOT NULL,
            params       BLOB NOT NULL,
            public_key   BLOB,
            wrapped_key  BLOB NOT NULL,
            verification TEXT,
            created_at   TEXT NOT NULL,
            last_used    TEXT
        );

        CREATE TABLE IF NOT EXISTS entries (
            date             TEXT PRIMARY KEY,
            title_nonce      BLOB NOT NULL,
            title_ciphertext BLOB NOT NULL,
            body_nonce       BLOB NOT NULL,
            body_ciphertext  BLOB NOT NULL,
            word_count       INTEGER NOT NULL DEFAULT 0,
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL
        );",
    )?;

    let rows: i64 = conn.query_row("SELECT COUNT(*) FROM schema_meta", [], |row| row.get(0))?;
    if rows == 0 {
        conn.execute("INSERT INTO schema_meta (version) VALUES (?1)", [SCHEMA_VERSION])?;
    }

    Ok(())
}

/// Read the schema version recorded at creation.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT version FROM schema_meta", [], |row| row.get(0))?)
}
