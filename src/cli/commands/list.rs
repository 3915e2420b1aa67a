//! `commvault list` — display the vault items the caller can read.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::{community, open_service, output, user, Cli};
use crate::errors::Result;
use crate::vault::{ItemState, VaultItemSummary};

/// JSON row: the summary plus its derived lifecycle state.
#[derive(Serialize)]
struct ListedItem<'a> {
    #[serde(flatten)]
    item: &'a VaultItemSummary,
    state: ItemState,
}

/// Execute the `list` command.
pub fn execute(cli: &Cli, json: bool) -> Result<()> {
    let community_id = community(cli)?;
    let actor_id = user(cli)?;

    let service = open_service(cli)?;
    let items = service.list_items(community_id, actor_id)?;

    if json {
        println!("{}", render_json(&items, Utc::now())?);
        return Ok(());
    }

    output::info(&format!(
        "{community_id} — {} readable item(s)",
        items.len()
    ));
    output::print_items_table(&items);

    Ok(())
}

fn render_json(items: &[VaultItemSummary], now: DateTime<Utc>) -> Result<String> {
    let rows: Vec<ListedItem<'_>> = items
        .iter()
        .map(|item| ListedItem {
            item,
            state: item.state(now),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeSet;

    fn summary(expires_at: Option<DateTime<Utc>>) -> VaultItemSummary {
        VaultItemSummary {
            id: "i1".into(),
            community_id: "c1".into(),
            title: "router".into(),
            item_type: "secret".into(),
            description: None,
            tags: Vec::new(),
            allowed_roles: BTreeSet::new(),
            allowed_users: BTreeSet::new(),
            created_by: "alice".into(),
            created_at: Utc::now(),
            expires_at,
            access_count: 0,
            last_accessed_at: None,
            last_accessed_by: None,
        }
    }

    #[test]
    fn json_rows_carry_state() {
        let now = Utc::now();
        let items = vec![summary(None), summary(Some(now - Duration::minutes(5)))];
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&items, now).unwrap()).unwrap();

        assert_eq!(value[0]["state"], "active");
        assert_eq!(value[1]["state"], "expired");
        assert_eq!(value[0]["title"], "router");
        assert!(value[0].get("salt").is_none());
    }
}
