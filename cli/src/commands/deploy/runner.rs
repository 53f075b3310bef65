use crate::commands::deploy::DeployCommand;
use crate::deploy::{DeployOptions, DeployReport, Deployer};
use crate::error::{Error, ErrorKind};
use crate::package::{PackageOptions, Packager};
use crate::runner::Runner;
use crate::template::Template;
use crate::writer::{Status, Writer};
use eyre::Context;

pub(crate) struct DeployRunner<'a> {
    pub(crate) command: DeployCommand,
    pub(crate) writer: &'a Writer,
}

impl Runner for DeployRunner<'_> {
    /// Package the selected functions, then deploy them
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.user_config()?;
        let region = config.region(self.command.region.as_deref())?;
        let template = Template::from_path(&self.command.template_file)?;

        if let Some(name) = &self.command.name {
            let found = template
                .resources
                .values()
                .any(|namespace| namespace.functions.contains_key(name));

            if !found {
                return Err(self.error(
                    ErrorKind::Args,
                    Some(&format!("Function \"{name}\" not found")),
                    Some(&format!(
                        "Check the function names in {}",
                        template.path().display()
                    )),
                    None,
                ));
            }
        }

        let storage = self.cos_client(&config, &region)?;
        let platform = self.scf_client(&config, &region)?;

        self.writer.stage(
            "Deploying",
            &format!("{} to {region}", template.path().display()),
            Status::Process,
        )?;

        let resources = Packager::new(
            &storage,
            &config,
            self.writer,
            PackageOptions {
                function: self.command.name.clone(),
                namespace: self.command.namespace.clone(),
                cos_bucket: self.command.cos_bucket.clone(),
                without_cos: self.command.without_cos,
                ..Default::default()
            },
        )
        .package(template)
        .await?;

        let report = Deployer::new(
            &platform,
            self.writer,
            DeployOptions {
                namespace: self.command.namespace.clone(),
                forced: self.command.forced,
                skip_event: self.command.skip_event,
            },
        )
        .deploy(&resources)
        .await?;

        self.writer.json(
            serde_json::to_value(&report)
                .wrap_err("Failed to serialize the deploy report")
                .map_err(|e| self.error(ErrorKind::Internal, None, None, Some(e.into())))?,
        )?;

        self.finish(&report)
    }
}

impl DeployRunner<'_> {
    /// Any failed trigger fails the whole run, after everything else was attempted
    fn finish(&self, report: &DeployReport) -> Result<(), Error> {
        if !report.failed() {
            return self.writer.stage(
                "Finished",
                &format!("{} function(s) deployed", report.functions.len()),
                Status::Success,
            );
        }

        let failures = report
            .failures()
            .map(|outcome| {
                let request_id = outcome
                    .request_id
                    .as_deref()
                    .map(|id| format!(" (RequestId: {id})"))
                    .unwrap_or_default();

                format!(
                    "{}/{} trigger {}: {}{request_id}",
                    outcome.namespace,
                    outcome.function,
                    outcome.trigger,
                    outcome.error.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>();

        Err(Error::new(
            ErrorKind::Trigger,
            "Some triggers failed to deploy",
            Some(&failures.join("\n")),
        ))
    }
}
