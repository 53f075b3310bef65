pub(crate) mod configure;
pub(crate) mod delete;
pub(crate) mod deploy;
pub(crate) mod list;
pub(crate) mod logs;
pub(crate) mod validate;
use clap::Subcommand;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Package functions of a template and deploy them with their triggers
    Deploy(deploy::DeployCommand),

    /// Print invocation logs of a function
    Logs(logs::LogsCommand),

    /// Check a template without deploying it
    Validate(validate::ValidateCommand),

    /// Show the functions deployed to a namespace
    List(list::ListCommand),

    /// Delete a deployed function
    Delete(delete::DeleteCommand),

    /// Credentials, region and upload preferences
    #[clap(subcommand)]
    Configure(configure::ConfigureCommands),
}
