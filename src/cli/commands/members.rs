//! `commvault members` — show the configured members of a community.

use crate::cli::{community, load_settings, output, Cli};
use crate::errors::Result;

/// Execute the `members` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let community_id = community(cli)?;
    let settings = load_settings(cli)?;

    let members = settings.membership().members(community_id);
    output::print_members(community_id, &members);
    Ok(())
}
