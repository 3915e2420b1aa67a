//! Vault item types.
//!
//! `VaultItem` is the full row including the sealed content and is only
//! ever produced by the single-item read path.  `VaultItemSummary` is
//! the listing projection: it has no ciphertext, IV, tag or salt fields
//! at all, so a listing bug cannot leak them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::crypto::SealedContent;
use crate::errors::{Result, VaultError};
use crate::policy::AccessPolicy;

/// Category tag applied when the caller gives none.
pub const DEFAULT_ITEM_TYPE: &str = "secret";

/// Maximum title length in characters.
const MAX_TITLE_LEN: usize = 200;

/// Derived lifecycle state.  Deletion removes the row, so there is no
/// `Deleted` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Active,
    Expired,
}

impl ItemState {
    /// `Expired` iff `now` is strictly after `expires_at`.
    pub fn at(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match expires_at {
            Some(ts) if now > ts => Self::Expired,
            _ => Self::Active,
        }
    }
}

/// A stored vault item.
#[derive(Debug, Clone)]
pub struct VaultItem {
    pub id: String,
    pub community_id: String,
    pub title: String,
    pub item_type: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub sealed: SealedContent,
    pub policy: AccessPolicy,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_count: u64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub last_accessed_by: Option<String>,
}

impl VaultItem {
    pub fn state(&self, now: DateTime<Utc>) -> ItemState {
        ItemState::at(self.expires_at, now)
    }
}

/// Listing projection of a vault item (no encrypted fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultItemSummary {
    pub id: String,
    pub community_id: String,
    pub title: String,
    pub item_type: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub allowed_roles: BTreeSet<String>,
    pub allowed_users: BTreeSet<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_count: u64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub last_accessed_by: Option<String>,
}

impl VaultItemSummary {
    pub fn policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.allowed_roles.clone(), self.allowed_users.clone())
    }

    pub fn state(&self, now: DateTime<Utc>) -> ItemState {
        ItemState::at(self.expires_at, now)
    }
}

/// Caller-supplied fields for a new item.
#[derive(Debug, Clone, Default)]
pub struct NewVaultItem {
    pub title: String,
    pub content: String,
    pub item_type: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` falls back to `{owner, admin}`.
    pub allowed_roles: Option<BTreeSet<String>>,
    pub allowed_users: BTreeSet<String>,
}

impl NewVaultItem {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Check the required fields: title and content must be non-empty.
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)?;
        validate_content(&self.content)
    }
}

/// Plaintext view of a single item returned by a successful read.
///
/// The content is zeroed when the value is dropped and is never written
/// back anywhere.
#[derive(Clone)]
pub struct RevealedItem {
    pub id: String,
    pub title: String,
    pub item_type: String,
    pub content: Zeroizing<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_count: u64,
}

impl std::fmt::Debug for RevealedItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealedItem")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("item_type", &self.item_type)
            .field("content", &"<redacted>")
            .field("access_count", &self.access_count)
            .finish_non_exhaustive()
    }
}

/// A partial update.  Only the fields listed here can ever be changed;
/// `expires_at`, `created_by` and the counters are not updatable.
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub item_type: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub allowed_roles: Option<BTreeSet<String>>,
    pub allowed_users: Option<BTreeSet<String>>,
    /// New plaintext; re-sealed under a fresh salt and IV.
    pub content: Option<String>,
}

impl ItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.item_type.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.allowed_roles.is_none()
            && self.allowed_users.is_none()
            && self.content.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(VaultError::Validation("no fields to update".into()));
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(content) = &self.content {
            validate_content(content)?;
        }
        if let Some(item_type) = &self.item_type {
            if item_type.trim().is_empty() {
                return Err(VaultError::Validation("item type cannot be empty".into()));
            }
        }
        Ok(())
    }
}

/// One column-level change applied by `VaultItemStore::update`.
///
/// This closed enum is the allow-list of updatable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Title(String),
    ItemType(String),
    Description(Option<String>),
    Tags(Vec<String>),
    AllowedRoles(BTreeSet<String>),
    AllowedUsers(BTreeSet<String>),
    Content(SealedContent),
}

/// Trim, drop empty and de-duplicate tags, keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && seen.insert(tag.to_string()) {
            out.push(tag.to_string());
        }
    }
    out
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(VaultError::Validation("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(VaultError::Validation(format!(
            "title cannot exceed {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<()> {
    if content.is_empty() {
        return Err(VaultError::Validation("content is required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn state_is_active_without_expiry() {
        assert_eq!(ItemState::at(None, Utc::now()), ItemState::Active);
    }

    #[test]
    fn state_is_expired_after_deadline() {
        let now = Utc::now();
        assert_eq!(
            ItemState::at(Some(now - Duration::seconds(1)), now),
            ItemState::Expired
        );
        assert_eq!(
            ItemState::at(Some(now + Duration::hours(1)), now),
            ItemState::Active
        );
    }

    #[test]
    fn expiry_boundary_is_still_active() {
        let now = Utc::now();
        assert_eq!(ItemState::at(Some(now), now), ItemState::Active);
    }

    #[test]
    fn new_item_requires_title_and_content() {
        assert!(NewVaultItem::new("", "x").validate().is_err());
        assert!(NewVaultItem::new("   ", "x").validate().is_err());
        assert!(NewVaultItem::new("t", "").validate().is_err());
        assert!(NewVaultItem::new("t", "x").validate().is_ok());
    }

    #[test]
    fn title_length_is_bounded() {
        let long = "a".repeat(MAX_TITLE_LEN + 1);
        assert!(NewVaultItem::new(long, "x").validate().is_err());
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(ItemUpdate::default().validate().is_err());
    }

    #[test]
    fn update_rejects_blank_content() {
        let update = ItemUpdate {
            content: Some(String::new()),
            ..ItemUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn normalize_tags_trims_and_dedups() {
        let tags = normalize_tags([" db ", "prod", "", "db", "prod "]);
        assert_eq!(tags, vec!["db".to_string(), "prod".to_string()]);
    }

    #[test]
    fn revealed_item_debug_hides_content() {
        let item = RevealedItem {
            id: "1".into(),
            title: "t".into(),
            item_type: DEFAULT_ITEM_TYPE.into(),
            content: Zeroizing::new("s3cr3t".into()),
            description: None,
            tags: Vec::new(),
            created_by: "u".into(),
            created_at: Utc::now(),
            expires_at: None,
            access_count: 1,
        };
        assert!(!format!("{item:?}").contains("s3cr3t"));
    }
}
