//! `commvault delete` — permanently remove a vault item.

use dialoguer::Confirm;

use crate::cli::{community, open_service, output, user, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: &str, force: bool) -> Result<()> {
    let community_id = community(cli)?;
    let actor_id = user(cli)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Permanently delete vault item {id}?"))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let service = open_service(cli)?;
    service.delete_item(community_id, id, actor_id)?;

    output::success(&format!("Deleted vault item {id}"));
    Ok(())
}
