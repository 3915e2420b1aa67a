//! One module per subcommand; each exposes an `execute` function.

pub mod access_log;
pub mod completions;
pub mod create;
pub mod delete;
pub mod list;
pub mod members;
pub mod read;
pub mod update;
