//! Access audit log — append-only record of vault reads.
//!
//! Every successful decrypt-and-return produces exactly one entry in
//! `vault_access_log`.  Entries are never updated or deleted by normal
//! operation, including when the item itself is deleted.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::errors::{Result, VaultError};
use crate::vault::db::Database;
use crate::vault::store::{format_ts, parse_ts};

/// What happened to the item.  Reads are the only audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessAction {
    View,
}

impl AccessAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
        }
    }
}

impl fmt::Display for AccessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessAction {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "view" => Ok(Self::View),
            other => Err(VaultError::SerializationError(format!(
                "unknown access action '{other}'"
            ))),
        }
    }
}

/// Transport-level details of the request that triggered a read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// A single access log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    pub id: i64,
    pub vault_item_id: String,
    pub user_id: String,
    pub action: AccessAction,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub accessed_at: DateTime<Utc>,
}

/// Insert one entry on an open connection or transaction.
pub(crate) fn insert_entry(
    conn: &Connection,
    vault_item_id: &str,
    user_id: &str,
    action: AccessAction,
    context: &RequestContext,
    at: DateTime<Utc>,
) -> rusqlite::Result<AccessLogEntry> {
    // Stored with microsecond precision; return what a re-read would see.
    let at = at.trunc_subsecs(6);
    conn.execute(
        "INSERT INTO vault_access_log (vault_item_id, user_id, action, ip_address, user_agent, accessed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            vault_item_id,
            user_id,
            action.as_str(),
            context.ip_address,
            context.user_agent,
            format_ts(at),
        ],
    )?;

    Ok(AccessLogEntry {
        id: conn.last_insert_rowid(),
        vault_item_id: vault_item_id.to_string(),
        user_id: user_id.to_string(),
        action,
        ip_address: context.ip_address.clone(),
        user_agent: context.user_agent.clone(),
        accessed_at: at,
    })
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<AccessLogEntry> {
    let action: String = row.get(3)?;
    Ok(AccessLogEntry {
        id: row.get(0)?,
        vault_item_id: row.get(1)?,
        user_id: row.get(2)?,
        action: action
            .parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        ip_address: row.get(4)?,
        user_agent: row.get(5)?,
        accessed_at: parse_ts(6, &row.get::<_, String>(6)?)?,
    })
}

/// SQLite-backed access log.
#[derive(Debug, Clone)]
pub struct AccessLog {
    db: Arc<Database>,
}

impl AccessLog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append an entry on its own.
    ///
    /// The read path uses `VaultItemStore::record_view` instead, which
    /// bundles the entry with the counter increment.
    pub fn record(
        &self,
        vault_item_id: &str,
        user_id: &str,
        action: AccessAction,
        context: &RequestContext,
    ) -> Result<AccessLogEntry> {
        let conn = self
            .db
            .lock()
            .map_err(|e| VaultError::AuditLogWrite(e.to_string()))?;
        insert_entry(&conn, vault_item_id, user_id, action, context, Utc::now())
            .map_err(|e| VaultError::AuditLogWrite(e.to_string()))
    }

    /// Entries for one item, most recent first.
    ///
    /// - `limit`: maximum number of entries to return; `None` for all.
    pub fn list(&self, vault_item_id: &str, limit: Option<usize>) -> Result<Vec<AccessLogEntry>> {
        let limit_i64 = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, vault_item_id, user_id, action, ip_address, user_agent, accessed_at
             FROM vault_access_log
             WHERE vault_item_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![vault_item_id, limit_i64], row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Number of entries with `action` for one item.
    pub fn count(&self, vault_item_id: &str, action: AccessAction) -> Result<u64> {
        let conn = self.db.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM vault_access_log WHERE vault_item_id = ?1 AND action = ?2",
            params![vault_item_id, action.as_str()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> AccessLog {
        AccessLog::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn ctx() -> RequestContext {
        RequestContext::new(Some("10.0.0.1".into()), Some("test-agent".into()))
    }

    #[test]
    fn record_and_list_roundtrip() {
        let log = log();

        log.record("item-1", "alice", AccessAction::View, &ctx()).unwrap();
        log.record("item-1", "bob", AccessAction::View, &ctx()).unwrap();
        log.record("item-2", "carol", AccessAction::View, &ctx()).unwrap();

        let entries = log.list("item-1", None).unwrap();
        assert_eq!(entries.len(), 2);

        // Most recent first.
        assert_eq!(entries[0].user_id, "bob");
        assert_eq!(entries[1].user_id, "alice");
        assert_eq!(entries[0].ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(entries[0].user_agent.as_deref(), Some("test-agent"));
    }

    #[test]
    fn list_with_limit() {
        let log = log();
        for i in 0..10 {
            log.record("item", &format!("user-{i}"), AccessAction::View, &ctx())
                .unwrap();
        }
        assert_eq!(log.list("item", Some(3)).unwrap().len(), 3);
        assert_eq!(log.list("item", None).unwrap().len(), 10);
    }

    #[test]
    fn count_by_item() {
        let log = log();
        log.record("a", "u", AccessAction::View, &ctx()).unwrap();
        log.record("a", "u", AccessAction::View, &ctx()).unwrap();
        log.record("b", "u", AccessAction::View, &ctx()).unwrap();
        assert_eq!(log.count("a", AccessAction::View).unwrap(), 2);
        assert_eq!(log.count("missing", AccessAction::View).unwrap(), 0);
    }

    #[test]
    fn context_fields_are_optional() {
        let log = log();
        let entry = log
            .record("a", "u", AccessAction::View, &RequestContext::default())
            .unwrap();
        assert!(entry.ip_address.is_none());
        let listed = log.list("a", None).unwrap();
        assert_eq!(listed[0], entry);
    }

    #[test]
    fn action_parses_from_text() {
        assert_eq!("view".parse::<AccessAction>().unwrap(), AccessAction::View);
        assert!("edit".parse::<AccessAction>().is_err());
    }
}
