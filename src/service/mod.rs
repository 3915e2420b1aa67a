//! Vault service — the orchestration layer behind every operation.
//!
//! Each call first resolves the caller's community role through the
//! `MembershipDirectory`; a non-member is rejected before any
//! vault-specific check runs, so outsiders learn nothing about items.
//!
//! Item lifecycle: `Active` -> `Expired` (derived from `expires_at`,
//! never stored, never reversed) -> deleted (row removed).

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::activity::{ActivityEvent, ActivityKind, ActivitySink};
use crate::audit::{AccessLog, AccessLogEntry, RequestContext};
use crate::crypto::{self, KdfParams, MasterSecret};
use crate::errors::{Result, VaultError};
use crate::membership::MembershipDirectory;
use crate::policy::{role_in, AccessPolicy, MANAGER_ROLES, WRITER_ROLES};
use crate::vault::{
    Database, FieldChange, ItemState, ItemUpdate, NewVaultItem, RevealedItem, VaultItemStore,
    VaultItemSummary,
};

/// Response of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedItem {
    pub id: String,
    pub title: String,
}

/// Composes the item store, access log, crypto and collaborators.
pub struct VaultService<M, A> {
    store: VaultItemStore,
    access_log: AccessLog,
    master: MasterSecret,
    kdf: KdfParams,
    membership: M,
    activity: A,
}

impl<M, A> std::fmt::Debug for VaultService<M, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultService")
            .field("kdf", &self.kdf)
            .finish_non_exhaustive()
    }
}

impl<M: MembershipDirectory, A: ActivitySink> VaultService<M, A> {
    pub fn new(
        db: Arc<Database>,
        master: MasterSecret,
        kdf: KdfParams,
        membership: M,
        activity: A,
    ) -> Self {
        Self {
            store: VaultItemStore::new(Arc::clone(&db)),
            access_log: AccessLog::new(db),
            master,
            kdf,
            membership,
            activity,
        }
    }

    /// The underlying item store.
    pub fn store(&self) -> &VaultItemStore {
        &self.store
    }

    /// The underlying access log.
    pub fn access_log(&self) -> &AccessLog {
        &self.access_log
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Encrypt and store a new item.  Requires owner, admin or moderator.
    pub fn create_item(
        &self,
        community_id: &str,
        actor_id: &str,
        payload: &NewVaultItem,
    ) -> Result<CreatedItem> {
        let role = self.member_role(community_id, actor_id)?;
        require_role(&role, WRITER_ROLES, "create vault items")?;

        // Validate before paying for key derivation.
        payload.validate()?;

        let sealed = crypto::seal(&self.master, &self.kdf, &payload.content)?;
        let item = self.store.create(community_id, actor_id, payload, sealed)?;

        info!(item_id = %item.id, community_id, actor_id, "vault item created");
        self.emit(ActivityKind::Created, community_id, &item.id, &item.title, actor_id);

        Ok(CreatedItem {
            id: item.id,
            title: item.title,
        })
    }

    /// Items the caller may read, without any encrypted fields.
    ///
    /// Items the policy denies are left out rather than reported.
    pub fn list_items(&self, community_id: &str, actor_id: &str) -> Result<Vec<VaultItemSummary>> {
        let role = self.member_role(community_id, actor_id)?;

        let items: Vec<VaultItemSummary> = self
            .store
            .list(community_id)?
            .into_iter()
            .filter(|item| item.policy().allows(&role, actor_id))
            .collect();

        debug!(community_id, actor_id, visible = items.len(), "listed vault items");
        Ok(items)
    }

    /// Decrypt one item for the caller.
    ///
    /// Order of checks: membership, existence, expiry, policy.  Only a
    /// successful decrypt is logged and counted; the log entry and the
    /// counter bump commit together.  If that write fails the plaintext
    /// is still returned and the failure is reported at `error` level.
    pub fn read_item(
        &self,
        community_id: &str,
        item_id: &str,
        actor_id: &str,
        context: &RequestContext,
    ) -> Result<RevealedItem> {
        let role = self.member_role(community_id, actor_id)?;
        let item = self.store.get_by_id(item_id, community_id)?;

        if item.state(Utc::now()) == ItemState::Expired {
            debug!(item_id, actor_id, "read of expired vault item refused");
            return Err(VaultError::Gone(item_id.to_string()));
        }

        if !item.policy.allows(&role, actor_id) {
            return Err(VaultError::Forbidden(format!(
                "role '{role}' and user '{actor_id}' are not on this item's access list"
            )));
        }

        let content = crypto::open(&self.master, &item.sealed).map_err(|e| {
            error!(item_id, community_id, error = %e, "vault item failed integrity check");
            e
        })?;

        let access_count = match self.store.record_view(item_id, actor_id, context) {
            Ok(_) => item.access_count + 1,
            Err(e) => {
                error!(
                    item_id,
                    actor_id,
                    error = %e,
                    "ALERT: vault read succeeded but its access log entry was not written"
                );
                item.access_count
            }
        };

        debug!(item_id, actor_id, "vault item read");
        Ok(RevealedItem {
            id: item.id,
            title: item.title,
            item_type: item.item_type,
            content,
            description: item.description,
            tags: item.tags,
            created_by: item.created_by,
            created_at: item.created_at,
            expires_at: item.expires_at,
            access_count,
        })
    }

    /// Change metadata, policy or content.  Requires owner or admin.
    ///
    /// New content is sealed under a fresh salt and IV.  Expiry cannot
    /// be changed after creation.  Returns the item's read policy after
    /// the update; a policy with both allow-lists empty locks the item.
    pub fn update_item(
        &self,
        community_id: &str,
        item_id: &str,
        actor_id: &str,
        update: &ItemUpdate,
    ) -> Result<AccessPolicy> {
        let role = self.member_role(community_id, actor_id)?;
        require_role(&role, MANAGER_ROLES, "update vault items")?;
        update.validate()?;

        let existing = self.store.get_by_id(item_id, community_id)?;

        let mut changes = Vec::new();
        if let Some(title) = &update.title {
            changes.push(FieldChange::Title(title.clone()));
        }
        if let Some(item_type) = &update.item_type {
            changes.push(FieldChange::ItemType(item_type.clone()));
        }
        if let Some(description) = &update.description {
            changes.push(FieldChange::Description(Some(description.clone())));
        }
        if let Some(tags) = &update.tags {
            changes.push(FieldChange::Tags(tags.clone()));
        }
        if let Some(roles) = &update.allowed_roles {
            changes.push(FieldChange::AllowedRoles(roles.clone()));
        }
        if let Some(users) = &update.allowed_users {
            changes.push(FieldChange::AllowedUsers(users.clone()));
        }
        if let Some(content) = &update.content {
            changes.push(FieldChange::Content(crypto::seal(
                &self.master,
                &self.kdf,
                content,
            )?));
        }

        self.store.update(item_id, community_id, &changes)?;

        let policy = AccessPolicy::new(
            update
                .allowed_roles
                .clone()
                .unwrap_or_else(|| existing.policy.allowed_roles.clone()),
            update
                .allowed_users
                .clone()
                .unwrap_or_else(|| existing.policy.allowed_users.clone()),
        );
        if policy.is_locked() {
            warn!(
                item_id,
                community_id,
                actor_id,
                "vault item is now unreadable: both allow-lists are empty"
            );
        }

        let title = update.title.as_deref().unwrap_or(&existing.title);
        info!(item_id, community_id, actor_id, fields = changes.len(), "vault item updated");
        self.emit(ActivityKind::Updated, community_id, item_id, title, actor_id);
        Ok(policy)
    }

    /// Hard-delete an item.  Requires owner or admin.
    pub fn delete_item(&self, community_id: &str, item_id: &str, actor_id: &str) -> Result<()> {
        let role = self.member_role(community_id, actor_id)?;
        require_role(&role, MANAGER_ROLES, "delete vault items")?;

        let existing = self.store.get_by_id(item_id, community_id)?;
        self.store.delete(item_id, community_id)?;

        info!(item_id, community_id, actor_id, "vault item deleted");
        self.emit(ActivityKind::Deleted, community_id, item_id, &existing.title, actor_id);
        Ok(())
    }

    /// Access history of one item, newest first.  Requires owner or admin.
    pub fn list_access_log(
        &self,
        community_id: &str,
        item_id: &str,
        actor_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<AccessLogEntry>> {
        let role = self.member_role(community_id, actor_id)?;
        require_role(&role, MANAGER_ROLES, "review the access log")?;

        // Tenant isolation: the item must belong to this community.
        self.store.get_by_id(item_id, community_id)?;
        self.access_log.list(item_id, limit)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn member_role(&self, community_id: &str, user_id: &str) -> Result<String> {
        self.membership
            .role(community_id, user_id)?
            .ok_or_else(|| VaultError::NotMember(community_id.to_string()))
    }

    fn emit(&self, kind: ActivityKind, community_id: &str, item_id: &str, title: &str, actor_id: &str) {
        let event = ActivityEvent {
            kind,
            community_id: community_id.to_string(),
            item_id: item_id.to_string(),
            title: title.to_string(),
            actor_id: actor_id.to_string(),
        };
        if let Err(e) = self.activity.publish(&event) {
            warn!(item_id, kind = %kind, error = %e, "activity event dropped");
        }
    }
}

fn require_role(role: &str, required: &[&str], action: &str) -> Result<()> {
    if role_in(role, required) {
        Ok(())
    } else {
        Err(VaultError::Forbidden(format!(
            "role '{role}' cannot {action} (requires one of: {})",
            required.join(", ")
        )))
    }
}
