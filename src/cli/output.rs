//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use chrono::Utc;
use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::audit::AccessLogEntry;
use crate::vault::{ItemState, RevealedItem, VaultItemSummary};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of item summaries (no content, no ciphertext).
pub fn print_items_table(items: &[VaultItemSummary]) {
    if items.is_empty() {
        info("No vault items you can read in this community.");
        tip("Run `commvault create --title <TITLE>` to add one.");
        return;
    }

    let now = Utc::now();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Title", "Type", "Tags", "Expires", "Reads", "State"]);

    for item in items {
        let state = match item.state(now) {
            ItemState::Active => style("active").green().to_string(),
            ItemState::Expired => style("expired").red().to_string(),
        };
        table.add_row(vec![
            item.id.clone(),
            item.title.clone(),
            item.item_type.clone(),
            item.tags.join(", "),
            item.expires_at
                .map_or_else(|| "-".to_string(), |ts| ts.format(TIME_FORMAT).to_string()),
            item.access_count.to_string(),
            state,
        ]);
    }

    println!("{table}");
}

/// Print a decrypted item with its metadata.
pub fn print_revealed(item: &RevealedItem) {
    println!("{} {}", style("Title:").bold(), item.title);
    println!("{} {}", style("Type:").bold(), item.item_type);
    if let Some(description) = &item.description {
        println!("{} {}", style("Description:").bold(), description);
    }
    if !item.tags.is_empty() {
        println!("{} {}", style("Tags:").bold(), item.tags.join(", "));
    }
    println!(
        "{} {} ({})",
        style("Created:").bold(),
        item.created_at.format(TIME_FORMAT),
        item.created_by
    );
    if let Some(expires_at) = item.expires_at {
        println!("{} {}", style("Expires:").bold(), expires_at.format(TIME_FORMAT));
    }
    println!("{} {}", style("Reads:").bold(), item.access_count);
    println!("{}", style("Content:").bold());
    println!("{}", item.content.as_str());
}

/// Print access log entries in a formatted table.
pub fn print_access_log(entries: &[AccessLogEntry]) {
    if entries.is_empty() {
        info("Nobody has read this item yet.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "User", "Action", "IP", "User agent"]);

    for entry in entries {
        table.add_row(vec![
            entry.accessed_at.format(TIME_FORMAT).to_string(),
            entry.user_id.clone(),
            style(entry.action.as_str()).cyan().to_string(),
            entry.ip_address.clone().unwrap_or_else(|| "-".to_string()),
            entry.user_agent.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }

    println!(
        "{}",
        style(format!("{} access entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Print community members and their roles.
pub fn print_members(community: &str, members: &[(String, String)]) {
    if members.is_empty() {
        info(&format!("No members configured for '{community}'."));
        tip("Add them under [members.<community>] in .commvault.toml.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["User", "Role"]);
    for (user, role) in members {
        table.add_row(vec![user.clone(), role.clone()]);
    }
    println!("{table}");
}
