//! `commvault update` — change fields of an existing vault item.

use std::collections::BTreeSet;

use crate::cli::{community, open_service, output, to_set, user, Cli, ItemArgs};
use crate::errors::Result;
use crate::vault::ItemUpdate;

/// Execute the `update` command.
pub fn execute(
    cli: &Cli,
    id: &str,
    title: Option<&str>,
    content: Option<&str>,
    item: &ItemArgs,
) -> Result<()> {
    let community_id = community(cli)?;
    let actor_id = user(cli)?;

    if content.is_some() {
        output::warning("Content provided on command line — it may appear in shell history.");
    }

    let update = build_update(title, content, item);

    let service = open_service(cli)?;
    let policy = service.update_item(community_id, id, actor_id, &update)?;

    output::success(&format!("Updated vault item {id}"));
    if policy.is_locked() {
        output::warning("No role or user can read this item any more.");
        output::tip("Grant access again with --allow-role or --allow-user.");
    }
    Ok(())
}

/// Turn the flags into an `ItemUpdate`.  Flags that are absent, or that
/// hold only blank values, leave the field unchanged.
fn build_update(title: Option<&str>, content: Option<&str>, item: &ItemArgs) -> ItemUpdate {
    ItemUpdate {
        title: title.map(str::to_string),
        item_type: item.item_type.clone(),
        description: item.description.clone(),
        tags: (!item.tags.is_empty()).then(|| item.tags.clone()),
        allowed_roles: non_empty(to_set(&item.allow_roles)),
        allowed_users: non_empty(to_set(&item.allow_users)),
        content: content.map(str::to_string),
    }
}

fn non_empty(set: BTreeSet<String>) -> Option<BTreeSet<String>> {
    Some(set).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_allow_role_leaves_roles_unchanged() {
        let item = ItemArgs {
            allow_roles: vec![" ".into()],
            allow_users: vec![String::new()],
            ..ItemArgs::default()
        };
        let update = build_update(None, None, &item);
        assert!(update.allowed_roles.is_none());
        assert!(update.allowed_users.is_none());
        assert!(update.is_empty());
    }

    #[test]
    fn allow_flags_become_sets() {
        let item = ItemArgs {
            allow_roles: vec!["admin".into(), " member ".into()],
            ..ItemArgs::default()
        };
        let update = build_update(Some("renamed"), None, &item);
        let roles = update.allowed_roles.unwrap();
        assert!(roles.contains("member"));
        assert_eq!(roles.len(), 2);
        assert_eq!(update.title.as_deref(), Some("renamed"));
        assert!(update.allowed_users.is_none());
    }
}
