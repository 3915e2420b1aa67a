//! `commvault read` — decrypt and print a single vault item.

use crate::cli::{community, open_service, output, request_context, user, Cli};
use crate::errors::Result;

/// Execute the `read` command.
pub fn execute(cli: &Cli, id: &str, quiet: bool) -> Result<()> {
    let community_id = community(cli)?;
    let actor_id = user(cli)?;

    let service = open_service(cli)?;
    let item = service.read_item(community_id, id, actor_id, &request_context())?;

    if quiet {
        println!("{}", item.content.as_str());
    } else {
        output::print_revealed(&item);
    }

    Ok(())
}
