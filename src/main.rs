use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use commvault::cli::{commands, output, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Create {
            ref title,
            ref content,
            ref item,
            ref expires_in,
            ref expires_at,
        } => commands::create::execute(
            &cli,
            title,
            content.as_deref(),
            item,
            expires_in.as_deref(),
            expires_at.as_deref(),
        ),
        Commands::List { json } => commands::list::execute(&cli, json),
        Commands::Read { ref id, quiet } => commands::read::execute(&cli, id, quiet),
        Commands::Update {
            ref id,
            ref title,
            ref content,
            ref item,
        } => commands::update::execute(&cli, id, title.as_deref(), content.as_deref(), item),
        Commands::Delete { ref id, force } => commands::delete::execute(&cli, id, force),
        Commands::AccessLog { ref id, last } => commands::access_log::execute(&cli, id, last),
        Commands::Members => commands::members::execute(&cli),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Logs go to stderr so they never mix with command output.
/// `COMMVAULT_LOG` overrides the default filter.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("COMMVAULT_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("commvault=debug")
        } else {
            EnvFilter::new("commvault=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}
