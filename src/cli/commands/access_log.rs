//! `commvault access-log` — show who read an item.
//!
//! Usage:
//!   commvault access-log <ID>             # last 50 entries
//!   commvault access-log <ID> --last 10   # last 10

use crate::cli::{community, open_service, output, user, Cli};
use crate::errors::Result;

/// Execute the `access-log` command.
pub fn execute(cli: &Cli, id: &str, last: usize) -> Result<()> {
    let community_id = community(cli)?;
    let actor_id = user(cli)?;

    let service = open_service(cli)?;
    let entries = service.list_access_log(community_id, id, actor_id, Some(last))?;

    output::print_access_log(&entries);
    Ok(())
}
