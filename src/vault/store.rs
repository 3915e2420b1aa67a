//! SQLite-backed vault item store.
//!
//! Every query is scoped by `community_id`: an item id alone never
//! resolves across communities.  The listing path selects only the
//! plaintext columns, so ciphertext never leaves the database through it.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audit::{self, AccessAction, AccessLogEntry, RequestContext};
use crate::crypto::SealedContent;
use crate::errors::{Result, VaultError};
use crate::policy::{default_allowed_roles, AccessPolicy};

use super::db::Database;
use super::item::{
    normalize_tags, FieldChange, NewVaultItem, VaultItem, VaultItemSummary, DEFAULT_ITEM_TYPE,
};

/// Persistent store of vault items.
#[derive(Debug, Clone)]
pub struct VaultItemStore {
    db: Arc<Database>,
}

impl VaultItemStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // ------------------------------------------------------------------
    // Create / read
    // ------------------------------------------------------------------

    /// Insert a new item.
    ///
    /// Title and content are validated; roles default to `{owner, admin}`
    /// when the caller supplied none.  All four sealed fields are written
    /// by the same statement.
    pub fn create(
        &self,
        community_id: &str,
        created_by: &str,
        item: &NewVaultItem,
        sealed: SealedContent,
    ) -> Result<VaultItem> {
        item.validate()?;

        let allowed_roles = item
            .allowed_roles
            .clone()
            .filter(|roles| !roles.is_empty())
            .unwrap_or_else(default_allowed_roles);

        let record = VaultItem {
            id: Uuid::new_v4().to_string(),
            community_id: community_id.to_string(),
            title: item.title.trim().to_string(),
            item_type: item
                .item_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_ITEM_TYPE)
                .to_string(),
            description: item
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            tags: normalize_tags(&item.tags),
            sealed,
            policy: AccessPolicy::new(allowed_roles, item.allowed_users.clone()),
            created_by: created_by.to_string(),
            created_at: Utc::now().trunc_subsecs(6),
            expires_at: item.expires_at.map(|ts| ts.trunc_subsecs(6)),
            access_count: 0,
            last_accessed_at: None,
            last_accessed_by: None,
        };

        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO vault_items (
                id, community_id, title, item_type,
                encrypted_content, encryption_iv, encryption_tag, encryption_salt,
                encryption_iterations, description, tags_json, created_by, created_at,
                expires_at, access_count, allowed_roles_json, allowed_users_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0, ?15, ?16)",
            params![
                record.id,
                record.community_id,
                record.title,
                record.item_type,
                record.sealed.ciphertext,
                record.sealed.iv,
                record.sealed.tag,
                record.sealed.salt,
                record.sealed.iterations,
                record.description,
                serde_json::to_string(&record.tags)?,
                record.created_by,
                format_ts(record.created_at),
                record.expires_at.map(format_ts),
                serde_json::to_string(&record.policy.allowed_roles)?,
                serde_json::to_string(&record.policy.allowed_users)?,
            ],
        )?;

        debug!(item_id = %record.id, community_id, "inserted vault item");
        Ok(record)
    }

    /// List every item of a community, newest first, without encrypted fields.
    pub fn list(&self, community_id: &str) -> Result<Vec<VaultItemSummary>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, community_id, title, item_type, description, tags_json,
                    allowed_roles_json, allowed_users_json, created_by, created_at, expires_at,
                    access_count, last_accessed_at, last_accessed_by
             FROM vault_items
             WHERE community_id = ?1
             ORDER BY created_at DESC, id ASC",
        )?;

        let rows = stmt.query_map(params![community_id], row_to_summary)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Fetch one item, including its sealed content.
    ///
    /// An item that exists under another community is reported exactly
    /// like a missing one.
    pub fn get_by_id(&self, id: &str, community_id: &str) -> Result<VaultItem> {
        let conn = self.db.lock()?;
        conn.query_row(
            "SELECT id, community_id, title, item_type, description, tags_json,
                    allowed_roles_json, allowed_users_json, created_by, created_at, expires_at,
                    access_count, last_accessed_at, last_accessed_by,
                    encrypted_content, encryption_iv, encryption_tag, encryption_salt,
                    encryption_iterations
             FROM vault_items
             WHERE id = ?1 AND community_id = ?2",
            params![id, community_id],
            row_to_item,
        )
        .optional()?
        .ok_or_else(|| VaultError::NotFound(id.to_string()))
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Hard-delete an item.  Immediate and irreversible.
    pub fn delete(&self, id: &str, community_id: &str) -> Result<()> {
        let conn = self.db.lock()?;
        let removed = conn.execute(
            "DELETE FROM vault_items WHERE id = ?1 AND community_id = ?2",
            params![id, community_id],
        )?;
        if removed == 0 {
            return Err(VaultError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Apply a set of column changes in one transaction.
    ///
    /// Each `FieldChange` maps to a fixed statement; there is no way to
    /// name a column from the outside.
    pub fn update(&self, id: &str, community_id: &str, changes: &[FieldChange]) -> Result<()> {
        if changes.is_empty() {
            return Err(VaultError::Validation("no fields to update".into()));
        }

        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        for change in changes {
            let touched = apply_change(&tx, id, community_id, change)?;
            if touched == 0 {
                return Err(VaultError::NotFound(id.to_string()));
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Bump the access counter in place.
    ///
    /// Issued as a single `access_count = access_count + 1` statement so
    /// concurrent readers never lose an increment.
    pub fn increment_access(&self, id: &str, user_id: &str) -> Result<()> {
        let conn = self.db.lock()?;
        let touched = increment_in_place(&conn, id, user_id, Utc::now())?;
        if touched == 0 {
            return Err(VaultError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Record one successful read: append the access-log entry and bump
    /// the counter in the same transaction.
    ///
    /// Either both land or neither does, which keeps `access_count` equal
    /// to the number of `view` entries for the item.
    pub fn record_view(
        &self,
        id: &str,
        user_id: &str,
        context: &RequestContext,
    ) -> Result<AccessLogEntry> {
        let now = Utc::now();
        let mut conn = self.db.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| VaultError::AuditLogWrite(format!("begin: {e}")))?;

        let entry = audit::insert_entry(&tx, id, user_id, AccessAction::View, context, now)
            .map_err(|e| VaultError::AuditLogWrite(format!("insert: {e}")))?;

        let touched = increment_in_place(&tx, id, user_id, now)
            .map_err(|e| VaultError::AuditLogWrite(format!("increment: {e}")))?;
        if touched == 0 {
            // Deleted between fetch and commit; keep the trail of the view.
            warn!(item_id = id, "vault item vanished before its access counter was updated");
        }

        tx.commit()
            .map_err(|e| VaultError::AuditLogWrite(format!("commit: {e}")))?;
        Ok(entry)
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

fn increment_in_place(
    conn: &Connection,
    id: &str,
    user_id: &str,
    at: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE vault_items
         SET access_count = access_count + 1, last_accessed_at = ?1, last_accessed_by = ?2
         WHERE id = ?3",
        params![format_ts(at), user_id, id],
    )
}

fn apply_change(
    conn: &Connection,
    id: &str,
    community_id: &str,
    change: &FieldChange,
) -> Result<usize> {
    let touched = match change {
        FieldChange::Title(title) => conn.execute(
            "UPDATE vault_items SET title = ?1 WHERE id = ?2 AND community_id = ?3",
            params![title.trim(), id, community_id],
        )?,
        FieldChange::ItemType(item_type) => conn.execute(
            "UPDATE vault_items SET item_type = ?1 WHERE id = ?2 AND community_id = ?3",
            params![item_type.trim(), id, community_id],
        )?,
        FieldChange::Description(description) => conn.execute(
            "UPDATE vault_items SET description = ?1 WHERE id = ?2 AND community_id = ?3",
            params![
                description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty()),
                id,
                community_id
            ],
        )?,
        FieldChange::Tags(tags) => conn.execute(
            "UPDATE vault_items SET tags_json = ?1 WHERE id = ?2 AND community_id = ?3",
            params![serde_json::to_string(&normalize_tags(tags))?, id, community_id],
        )?,
        FieldChange::AllowedRoles(roles) => conn.execute(
            "UPDATE vault_items SET allowed_roles_json = ?1 WHERE id = ?2 AND community_id = ?3",
            params![serde_json::to_string(roles)?, id, community_id],
        )?,
        FieldChange::AllowedUsers(users) => conn.execute(
            "UPDATE vault_items SET allowed_users_json = ?1 WHERE id = ?2 AND community_id = ?3",
            params![serde_json::to_string(users)?, id, community_id],
        )?,
        FieldChange::Content(sealed) => conn.execute(
            "UPDATE vault_items
             SET encrypted_content = ?1, encryption_iv = ?2, encryption_tag = ?3,
                 encryption_salt = ?4, encryption_iterations = ?5
             WHERE id = ?6 AND community_id = ?7",
            params![
                sealed.ciphertext,
                sealed.iv,
                sealed.tag,
                sealed.salt,
                sealed.iterations,
                id,
                community_id
            ],
        )?,
    };
    Ok(touched)
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_ts(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| parse_ts(idx, &raw))
        .transpose()
}

fn parse_json<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<VaultItemSummary> {
    let access_count: i64 = row.get(11)?;
    Ok(VaultItemSummary {
        id: row.get(0)?,
        community_id: row.get(1)?,
        title: row.get(2)?,
        item_type: row.get(3)?,
        description: row.get(4)?,
        tags: parse_json(row, 5)?,
        allowed_roles: parse_json::<BTreeSet<String>>(row, 6)?,
        allowed_users: parse_json::<BTreeSet<String>>(row, 7)?,
        created_by: row.get(8)?,
        created_at: parse_ts(9, &row.get::<_, String>(9)?)?,
        expires_at: parse_opt_ts(row, 10)?,
        access_count: u64::try_from(access_count).unwrap_or(0),
        last_accessed_at: parse_opt_ts(row, 12)?,
        last_accessed_by: row.get(13)?,
    })
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<VaultItem> {
    let summary = row_to_summary(row)?;
    Ok(VaultItem {
        policy: summary.policy(),
        id: summary.id,
        community_id: summary.community_id,
        title: summary.title,
        item_type: summary.item_type,
        description: summary.description,
        tags: summary.tags,
        sealed: SealedContent {
            ciphertext: row.get(14)?,
            iv: row.get(15)?,
            tag: row.get(16)?,
            salt: row.get(17)?,
            iterations: row.get(18)?,
        },
        created_by: summary.created_by,
        created_at: summary.created_at,
        expires_at: summary.expires_at,
        access_count: summary.access_count,
        last_accessed_at: summary.last_accessed_at,
        last_accessed_by: summary.last_accessed_by,
    })
}
