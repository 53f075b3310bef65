mod runner;
use crate::runner::{Runnable, Runner};
use crate::template::DEFAULT_TEMPLATE;
use crate::writer::Writer;
use clap::ArgAction;
use runner::DeployRunner;
use std::path::PathBuf;

#[derive(clap::Args, Clone, Default)]
pub(crate) struct DeployCommand {
    /// Path of the template file
    #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
    template_file: PathBuf,

    /// Upload packages to this COS bucket
    #[arg(short, long)]
    cos_bucket: Option<String>,

    /// Deploy only the function with this name
    #[arg(short, long)]
    name: Option<String>,

    /// Deploy into this namespace instead of the one in the template
    #[arg(short = 'N', long)]
    namespace: Option<String>,

    /// Region to deploy to, the configured one by default
    #[arg(short, long)]
    region: Option<String>,

    /// Update functions that already exist
    #[arg(short, long, action = ArgAction::SetTrue)]
    forced: bool,

    /// Do not deploy triggers
    #[arg(long, action = ArgAction::SetTrue)]
    skip_event: bool,

    /// Send packages inline with the deploy call instead of uploading them to COS
    #[arg(long, action = ArgAction::SetTrue)]
    without_cos: bool,
}

impl Runnable for DeployCommand {
    fn runner(&self, writer: &Writer) -> impl Runner {
        DeployRunner {
            command: self.clone(),
            writer,
        }
    }
}
