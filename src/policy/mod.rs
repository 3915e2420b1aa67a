//! Access policy evaluation.
//!
//! A vault item's policy is the pair `(allowed_roles, allowed_users)`,
//! read as a logical OR.  The evaluator is a pure function: it never
//! looks up roles and never grants an implicit bypass to any role name.
//! Owner/admin privileges are decided by the caller when it builds the
//! allow-lists at creation time.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Well-known community role names.
pub mod roles {
    pub const OWNER: &str = "owner";
    pub const ADMIN: &str = "admin";
    pub const MODERATOR: &str = "moderator";
    pub const MEMBER: &str = "member";
    pub const VIEWER: &str = "viewer";
}

/// Roles allowed to create vault items.
pub const WRITER_ROLES: &[&str] = &[roles::OWNER, roles::ADMIN, roles::MODERATOR];

/// Roles allowed to update, delete and review the access log.
pub const MANAGER_ROLES: &[&str] = &[roles::OWNER, roles::ADMIN];

/// Allow-list applied when a new item is created without explicit roles.
pub fn default_allowed_roles() -> BTreeSet<String> {
    MANAGER_ROLES.iter().map(|r| (*r).to_string()).collect()
}

/// Returns `true` iff `user_role` is in `allowed_roles` or `user_id`
/// is in `allowed_users`.  Both sets empty means nobody can read.
pub fn can_access(
    user_role: &str,
    user_id: &str,
    allowed_roles: &BTreeSet<String>,
    allowed_users: &BTreeSet<String>,
) -> bool {
    allowed_roles.contains(user_role) || allowed_users.contains(user_id)
}

/// Returns `true` if `role` is one of `required`.
pub fn role_in(role: &str, required: &[&str]) -> bool {
    required.contains(&role)
}

/// The read policy attached to a vault item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub allowed_roles: BTreeSet<String>,
    pub allowed_users: BTreeSet<String>,
}

impl AccessPolicy {
    pub fn new(allowed_roles: BTreeSet<String>, allowed_users: BTreeSet<String>) -> Self {
        Self {
            allowed_roles,
            allowed_users,
        }
    }

    /// Evaluate this policy for a requester.
    pub fn allows(&self, user_role: &str, user_id: &str) -> bool {
        can_access(user_role, user_id, &self.allowed_roles, &self.allowed_users)
    }

    /// `true` when both allow-lists are empty: the item is unreadable.
    pub fn is_locked(&self) -> bool {
        self.allowed_roles.is_empty() && self.allowed_users.is_empty()
    }
}
