//! `commvault create` — encrypt and store a new vault item.

use std::io::{self, IsTerminal, Read};

use crate::cli::{community, output, parse_expiry, to_set, user, Cli, ItemArgs};
use crate::errors::{Result, VaultError};
use crate::vault::NewVaultItem;

/// Execute the `create` command.
pub fn execute(
    cli: &Cli,
    title: &str,
    content: Option<&str>,
    item: &ItemArgs,
    expires_in: Option<&str>,
    expires_at: Option<&str>,
) -> Result<()> {
    let community_id = community(cli)?;
    let actor_id = user(cli)?;

    let payload = NewVaultItem {
        title: title.to_string(),
        content: read_content(content)?,
        item_type: item.item_type.clone(),
        description: item.description.clone(),
        tags: item.tags.clone(),
        expires_at: parse_expiry(expires_in, expires_at)?,
        allowed_roles: Some(to_set(&item.allow_roles)).filter(|r| !r.is_empty()),
        allowed_users: to_set(&item.allow_users),
    };

    let service = crate::cli::open_service(cli)?;
    let created = service.create_item(community_id, actor_id, &payload)?;

    output::success(&format!(
        "Created vault item '{}' in {community_id}",
        created.title
    ));
    println!("{}", created.id);
    output::tip(&format!("Read it back: commvault read {}", created.id));

    Ok(())
}

/// Take the content from the flag, piped stdin, or a hidden prompt.
pub(crate) fn read_content(content: Option<&str>) -> Result<String> {
    if let Some(v) = content {
        output::warning("Content provided on command line — it may appear in shell history.");
        return Ok(v.to_string());
    }

    if !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf.trim_end().to_string());
    }

    dialoguer::Password::new()
        .with_prompt("Enter secret content")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))
}
