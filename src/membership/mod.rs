//! Community membership lookup.
//!
//! The vault never computes roles itself: it asks a `MembershipDirectory`
//! for the caller's role in the community and treats `None` as "not a
//! member".  `StaticMembership` is the directory used by the CLI, built
//! from the `[members]` table in `.commvault.toml`.

use std::collections::BTreeMap;

use crate::errors::Result;

/// Source of community roles.
pub trait MembershipDirectory {
    /// Role of `user_id` in `community_id`, or `None` if not a member.
    fn role(&self, community_id: &str, user_id: &str) -> Result<Option<String>>;
}

/// In-memory membership table: community -> user -> role.
#[derive(Debug, Clone, Default)]
pub struct StaticMembership {
    communities: BTreeMap<String, BTreeMap<String, String>>,
}

impl StaticMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `role` to `user_id` in `community_id`, replacing any previous role.
    pub fn insert(
        &mut self,
        community_id: impl Into<String>,
        user_id: impl Into<String>,
        role: impl Into<String>,
    ) {
        self.communities
            .entry(community_id.into())
            .or_default()
            .insert(user_id.into(), role.into());
    }

    /// Builder-style variant of `insert`.
    pub fn with_member(
        mut self,
        community_id: impl Into<String>,
        user_id: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        self.insert(community_id, user_id, role);
        self
    }

    /// Members of one community, sorted by user id.
    pub fn members(&self, community_id: &str) -> Vec<(String, String)> {
        self.communities
            .get(community_id)
            .map(|users| {
                users
                    .iter()
                    .map(|(user, role)| (user.clone(), role.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl From<BTreeMap<String, BTreeMap<String, String>>> for StaticMembership {
    fn from(communities: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        Self { communities }
    }
}

impl MembershipDirectory for StaticMembership {
    fn role(&self, community_id: &str, user_id: &str) -> Result<Option<String>> {
        Ok(self
            .communities
            .get(community_id)
            .and_then(|users| users.get(user_id))
            .cloned())
    }
}
