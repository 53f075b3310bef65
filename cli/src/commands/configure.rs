pub(crate) mod get;
pub(crate) mod set;
use clap::Subcommand;

#[derive(Subcommand)]
pub(crate) enum ConfigureCommands {
    /// Show the stored configuration, secrets masked
    Get(get::GetCommand),

    /// Update one or more settings
    Set(set::SetCommand),
}
