//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use clap::Parser;

use crate::activity::TracingActivitySink;
use crate::audit::RequestContext;
use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::membership::StaticMembership;
use crate::service::VaultService;
use crate::vault::Database;

/// Service type used by every CLI command.
pub type CliService = VaultService<StaticMembership, TracingActivitySink>;

/// commvault CLI: encrypted per-community secret vault.
#[derive(Parser)]
#[command(
    name = "commvault",
    about = "Encrypted per-community secret vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Community the command operates on
    #[arg(short, long, global = true, env = "COMMVAULT_COMMUNITY")]
    pub community: Option<String>,

    /// Acting user id
    #[arg(short, long, global = true, env = "COMMVAULT_USER")]
    pub user: Option<String>,

    /// Directory holding .commvault.toml (default: current directory)
    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Item fields shared by `create` and `update`.
#[derive(clap::Args, Debug, Default)]
pub struct ItemArgs {
    /// Category tag (e.g. secret, credential)
    #[arg(long = "type")]
    pub item_type: Option<String>,

    /// Free-form description
    #[arg(long)]
    pub description: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Community role allowed to read (repeatable)
    #[arg(long = "allow-role")]
    pub allow_roles: Vec<String>,

    /// User id allowed to read (repeatable)
    #[arg(long = "allow-user")]
    pub allow_users: Vec<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault item
    Create {
        /// Item title
        #[arg(short, long)]
        title: String,

        /// Secret content (omit for stdin or interactive prompt)
        #[arg(long)]
        content: Option<String>,

        #[command(flatten)]
        item: ItemArgs,

        /// Expire after a duration (e.g. 7d, 24h, 30m)
        #[arg(long, conflicts_with = "expires_at")]
        expires_in: Option<String>,

        /// Expire at an RFC 3339 timestamp
        #[arg(long)]
        expires_at: Option<String>,
    },

    /// List the vault items you can read
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Decrypt and print a vault item
    Read {
        /// Item id
        id: String,

        /// Print only the content
        #[arg(short, long)]
        quiet: bool,
    },

    /// Update a vault item (owner/admin)
    Update {
        /// Item id
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New content (re-encrypted under a fresh salt and IV)
        #[arg(long)]
        content: Option<String>,

        #[command(flatten)]
        item: ItemArgs,
    },

    /// Delete a vault item (owner/admin)
    Delete {
        /// Item id
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show who read an item (owner/admin)
    AccessLog {
        /// Item id
        id: String,
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
    },

    /// Show the members of the community
    Members,

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Directory that holds `.commvault.toml`.
pub fn project_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.config_dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(std::env::current_dir()?),
    }
}

/// Load the settings for this invocation.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    Settings::load(&project_dir(cli)?)
}

/// Open the database and wire up the service from settings.
pub fn open_service(cli: &Cli) -> Result<CliService> {
    let dir = project_dir(cli)?;
    let settings = Settings::load(&dir)?;
    let master = settings.master_secret()?;
    let kdf = settings.kdf_params()?;
    let db = Database::open(&settings.database_path(&dir))?;

    Ok(VaultService::new(
        Arc::new(db),
        master,
        kdf,
        settings.membership(),
        TracingActivitySink,
    ))
}

/// The `--community` value, required by vault commands.
pub fn community(cli: &Cli) -> Result<&str> {
    cli.community.as_deref().filter(|c| !c.is_empty()).ok_or_else(|| {
        VaultError::CommandFailed(
            "no community given — pass --community or set COMMVAULT_COMMUNITY".into(),
        )
    })
}

/// The `--user` value, required by vault commands.
pub fn user(cli: &Cli) -> Result<&str> {
    cli.user.as_deref().filter(|u| !u.is_empty()).ok_or_else(|| {
        VaultError::CommandFailed("no user given — pass --user or set COMMVAULT_USER".into())
    })
}

/// Request context recorded in the access log for CLI reads.
pub fn request_context() -> RequestContext {
    RequestContext::new(
        None,
        Some(format!("commvault-cli/{}", env!("CARGO_PKG_VERSION"))),
    )
}

/// Turn repeatable flag values into a set, dropping blanks.
pub fn to_set(values: &[String]) -> BTreeSet<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a human-friendly duration string like "7d", "24h", "30m".
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();

    let (num_str, unit) = if let Some(s) = input.strip_suffix('d') {
        (s, 'd')
    } else if let Some(s) = input.strip_suffix('h') {
        (s, 'h')
    } else if let Some(s) = input.strip_suffix('m') {
        (s, 'm')
    } else {
        return Err(VaultError::CommandFailed(format!(
            "invalid duration '{input}' — use format like 7d, 24h, or 30m"
        )));
    };

    let num: i64 = num_str.parse().map_err(|_| {
        VaultError::CommandFailed(format!(
            "invalid duration '{input}' — number part is not valid"
        ))
    })?;

    Ok(match unit {
        'd' => Duration::days(num),
        'h' => Duration::hours(num),
        _ => Duration::minutes(num),
    })
}

/// Resolve `--expires-in` / `--expires-at` into an absolute timestamp.
pub fn parse_expiry(
    expires_in: Option<&str>,
    expires_at: Option<&str>,
) -> Result<Option<DateTime<Utc>>> {
    match (expires_in, expires_at) {
        (Some(rel), _) => Ok(Some(Utc::now() + parse_duration(rel)?)),
        (None, Some(abs)) => DateTime::parse_from_rfc3339(abs)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| VaultError::CommandFailed(format!("invalid --expires-at '{abs}': {e}"))),
        (None, None) => Ok(None),
    }
}
