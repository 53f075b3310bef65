mod api;
mod commands;
mod config;
mod credentials;
mod deploy;
mod error;
mod logger;
mod logs;
mod package;
mod progress;
mod runner;
mod template;
mod writer;

#[cfg(test)]
mod testing;

use crate::commands::configure::ConfigureCommands;
use crate::commands::Commands;
use crate::error::Error;
use crate::logger::Logger;
use crate::runner::{Runnable, Runner};
use crate::writer::Writer;
use clap::{ArgAction, Parser};

#[derive(Parser)]
#[command(
    arg_required_else_help = true,
    name = "scf",
    version,
    about = "Package and deploy serverless functions",
    long_about = "Packages function code declared in a template, uploads it and deploys functions, namespaces and triggers to the SCF platform."
)]
struct Cli {
    /// Print machine readable JSON instead of human friendly text
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Derive a runner from the command and run it
async fn run(command: impl Runnable, writer: &Writer) -> Result<(), Error> {
    command.runner(writer).run().await
}

#[tokio::main]
async fn main() {
    Logger::init();

    let cli = Cli::parse();
    let writer = Writer::new(cli.json);

    // Match all commands here, in one place
    let result = match cli.command {
        Commands::Deploy(cmd) => run(cmd, &writer).await,
        Commands::Logs(cmd) => run(cmd, &writer).await,
        Commands::Validate(cmd) => run(cmd, &writer).await,
        Commands::List(cmd) => run(cmd, &writer).await,
        Commands::Delete(cmd) => run(cmd, &writer).await,

        Commands::Configure(configure) => match configure {
            ConfigureCommands::Get(cmd) => run(cmd, &writer).await,
            ConfigureCommands::Set(cmd) => run(cmd, &writer).await,
        },
    };

    if let Err(error) = result {
        log::error!("{:?} error: {}", error.kind(), error.message());

        eprintln!(
            "{}\n{error}",
            console::style("Error").red().bold()
        );

        std::process::exit(1);
    }
}
