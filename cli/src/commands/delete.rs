use crate::api::scf::FunctionPlatform;
use crate::error::{api_error, Error, ErrorKind};
use crate::runner::{Runnable, Runner};
use crate::writer::{Status, Writer};
use clap::ArgAction;
use eyre::Context;
use std::io::{self, Write};

#[derive(clap::Args, Clone)]
pub(crate) struct DeleteCommand {
    /// Name of the function to delete
    #[arg(short, long)]
    name: String,

    /// Namespace of the function
    #[arg(short = 'N', long, default_value = "default")]
    namespace: String,

    /// Region of the function, the configured one by default
    #[arg(short, long)]
    region: Option<String>,

    /// Delete without asking for confirmation
    #[arg(short, long, action = ArgAction::SetTrue)]
    force: bool,
}

impl Runnable for DeleteCommand {
    fn runner(&self, writer: &Writer) -> impl Runner {
        DeleteRunner {
            command: self.clone(),
            writer,
        }
    }
}

struct DeleteRunner<'a> {
    command: DeleteCommand,
    writer: &'a Writer,
}

impl Runner for DeleteRunner<'_> {
    /// Deletes a deployed function after confirmation
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.user_config()?;
        let region = config.region(self.command.region.as_deref())?;
        let platform = self.scf_client(&config, &region)?;
        let resource = format!("{}/{}", self.command.namespace, self.command.name);

        if !self.command.force {
            // Nobody is there to answer the prompt
            if self.writer.is_structured() {
                return Err(self.error(
                    ErrorKind::Args,
                    Some("Deletion needs a confirmation"),
                    Some("Pass --force to delete without one."),
                    None,
                ));
            }

            if !self.confirm(&resource)? {
                return self.writer.stage("Canceled", &resource, Status::Warning);
            }
        }

        delete(
            &platform,
            self.writer,
            &self.command.namespace,
            &self.command.name,
        )
        .await
    }
}

impl DeleteRunner<'_> {
    fn confirm(&self, resource: &str) -> Result<bool, Error> {
        print!(
            "{} {}: ",
            console::style(format!("Delete function {resource}?")).bold(),
            console::style("[y/N]").dim()
        );

        let mut input = String::new();

        io::stdout()
            .flush()
            .and_then(|_| io::stdin().read_line(&mut input))
            .wrap_err("Failed to read input")
            .map_err(|e| self.error(ErrorKind::Internal, None, None, Some(e.into())))?;

        Ok(is_confirmed(&input))
    }
}

fn is_confirmed(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_ref(), "y" | "yes")
}

async fn delete(
    platform: &dyn FunctionPlatform,
    writer: &Writer,
    namespace: &str,
    name: &str,
) -> Result<(), Error> {
    let resource = format!("{namespace}/{name}");

    platform
        .delete_function(namespace, name)
        .await
        .map_err(|e| {
            api_error(
                ErrorKind::CloudApi,
                &format!("Failed to delete function {resource}"),
                &e,
            )
        })?;

    writer.stage("Deleted", &resource, Status::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePlatform, PlatformCall};
    use std::collections::HashMap;

    #[tokio::test]
    async fn deployed_function_is_deleted() {
        let platform = FakePlatform {
            deployed: HashMap::from([("default".to_string(), vec!["hello".to_string()])]),
            ..Default::default()
        };
        let writer = Writer::new(true);

        delete(&platform, &writer, "default", "hello").await.unwrap();

        assert_eq!(
            platform.calls(),
            vec![PlatformCall::DeleteFunction {
                namespace: "default".into(),
                name: "hello".into(),
            }]
        );
    }

    #[tokio::test]
    async fn missing_function_reports_the_request_id() {
        let platform = FakePlatform::default();
        let writer = Writer::new(true);

        let error = delete(&platform, &writer, "default", "ghost")
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::CloudApi);
        assert_eq!(error.request_id(), Some("delete-req"));
    }

    #[test]
    fn only_yes_confirms() {
        assert!(is_confirmed("y\n"));
        assert!(is_confirmed(" YES "));
        assert!(!is_confirmed("\n"));
        assert!(!is_confirmed("no"));
    }
}
