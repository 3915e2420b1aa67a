//! SQLite connection and schema.
//!
//! A single `Database` backs both the item store and the access log.
//! The connection sits behind a mutex; every statement is parameterized.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::debug;

use crate::errors::{Result, VaultError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS vault_items (
    id                 TEXT PRIMARY KEY NOT NULL,
    community_id       TEXT NOT NULL,
    title              TEXT NOT NULL,
    item_type          TEXT NOT NULL,
    encrypted_content  TEXT NOT NULL,
    encryption_iv      TEXT NOT NULL,
    encryption_tag     TEXT NOT NULL,
    encryption_salt    TEXT NOT NULL,
    encryption_iterations INTEGER NOT NULL CHECK (encryption_iterations > 0),
    description        TEXT,
    tags_json          TEXT NOT NULL DEFAULT '[]',
    created_by         TEXT NOT NULL,
    created_at         TEXT NOT NULL,
    expires_at         TEXT,
    access_count       INTEGER NOT NULL DEFAULT 0 CHECK (access_count >= 0),
    last_accessed_at   TEXT,
    last_accessed_by   TEXT,
    allowed_roles_json TEXT NOT NULL DEFAULT '[]',
    allowed_users_json TEXT NOT NULL DEFAULT '[]'
);
CREATE INDEX IF NOT EXISTS idx_vault_items_community ON vault_items (community_id);

CREATE TABLE IF NOT EXISTS vault_access_log (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    vault_item_id TEXT NOT NULL,
    user_id       TEXT NOT NULL,
    action        TEXT NOT NULL,
    ip_address    TEXT,
    user_agent    TEXT,
    accessed_at   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_vault_access_log_item ON vault_access_log (vault_item_id);
";

/// Shared handle to the vault database.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file at `path` and apply the schema.
    ///
    /// Missing parent directories are created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Owner-only permissions on the database file.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000; PRAGMA secure_delete=ON;",
        )?;

        debug!(path = %path.display(), "opened vault database");
        Self::with_schema(conn)
    }

    /// Open a private in-memory database (tests, dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::with_schema(conn)
    }

    fn with_schema(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| VaultError::Storage(format!("schema migration failed: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection for a unit of work.
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| VaultError::Storage(format!("database lock poisoned: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_database_and_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("vault.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());

        let conn = db.lock().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('vault_items', 'vault_access_log')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn reopening_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.db");
        drop(Database::open(&path).unwrap());
        assert!(Database::open(&path).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn database_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.db");
        let _db = Database::open(&path).unwrap();

        let perms = std::fs::metadata(&path).unwrap().permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}
