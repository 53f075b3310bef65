use crate::api::scf::FunctionPlatform;
use crate::api::ApiError;
use crate::error::{api_error, Error, ErrorKind};
use crate::progress::Progress;
use crate::template::function::FunctionDef;
use crate::template::Resources;
use crate::writer::{Status, Writer};
use serde::Serialize;
use std::collections::HashSet;

/// Result of a single trigger deployment
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TriggerOutcome {
    pub(crate) namespace: String,
    pub(crate) function: String,
    pub(crate) trigger: String,

    /// Failure message, none on success
    pub(crate) error: Option<String>,
    pub(crate) request_id: Option<String>,
}

/// Everything deployed in one run
///
/// Trigger failures don't stop the run, they are inspected once it is over.
#[derive(Debug, Default, Serialize)]
pub(crate) struct DeployReport {
    pub(crate) namespaces_created: Vec<String>,
    pub(crate) functions: Vec<String>,
    pub(crate) triggers: Vec<TriggerOutcome>,
}

impl DeployReport {
    pub(crate) fn failed(&self) -> bool {
        self.failures().next().is_some()
    }

    pub(crate) fn failures(&self) -> impl Iterator<Item = &TriggerOutcome> {
        self.triggers.iter().filter(|outcome| outcome.error.is_some())
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DeployOptions {
    /// Deploy every function into this namespace instead of the template's one
    pub(crate) namespace: Option<String>,

    /// Overwrite functions that already exist
    pub(crate) forced: bool,

    pub(crate) skip_event: bool,
}

/// Creates namespaces, functions and their triggers, in this order
pub(crate) struct Deployer<'a> {
    platform: &'a dyn FunctionPlatform,
    writer: &'a Writer,
    options: DeployOptions,
}

impl<'a> Deployer<'a> {
    pub(crate) fn new(
        platform: &'a dyn FunctionPlatform,
        writer: &'a Writer,
        options: DeployOptions,
    ) -> Self {
        Deployer {
            platform,
            writer,
            options,
        }
    }

    /// Deploy packaged resources
    ///
    /// Stops at the first namespace or function failure. Trigger failures end up in the report.
    pub(crate) async fn deploy(&self, resources: &Resources) -> Result<DeployReport, Error> {
        let mut report = DeployReport::default();
        let mut ensured = HashSet::new();

        for (namespace_name, namespace) in resources {
            if namespace.functions.is_empty() {
                log::debug!("Namespace {namespace_name} has no functions to deploy, skipping");
                continue;
            }

            let namespace_name = self
                .options
                .namespace
                .as_deref()
                .unwrap_or(namespace_name);

            if ensured.insert(namespace_name.to_string())
                && self.ensure_namespace(namespace_name).await?
            {
                report.namespaces_created.push(namespace_name.to_string());
            }

            for (name, function) in &namespace.functions {
                self.deploy_function(namespace_name, name, function).await?;
                report.functions.push(format!("{namespace_name}/{name}"));

                if self.options.skip_event {
                    continue;
                }

                for (trigger_name, trigger) in &function.properties.events {
                    let result = self
                        .platform
                        .deploy_trigger(namespace_name, name, trigger_name, trigger)
                        .await;

                    report.triggers.push(
                        self.trigger_outcome(namespace_name, name, trigger_name, result)?,
                    );
                }
            }
        }

        Ok(report)
    }

    /// Returns true when the namespace had to be created
    async fn ensure_namespace(&self, namespace: &str) -> Result<bool, Error> {
        let exists = self
            .platform
            .namespace_exists(namespace)
            .await
            .map_err(|e| {
                api_error(
                    ErrorKind::Namespace,
                    &format!("Failed to look up namespace {namespace}"),
                    &e,
                )
            })?;

        if exists {
            log::info!("Namespace {namespace} exists");
            return Ok(false);
        }

        self.platform
            .create_namespace(namespace)
            .await
            .map_err(|e| {
                api_error(
                    ErrorKind::Namespace,
                    &format!("Failed to create namespace {namespace}"),
                    &e,
                )
            })?;

        self.writer
            .stage("Created", &format!("namespace {namespace}"), Status::Success)?;

        Ok(true)
    }

    async fn deploy_function(
        &self,
        namespace: &str,
        name: &str,
        function: &FunctionDef,
    ) -> Result<(), Error> {
        let resource = format!("{namespace}/{name}");
        let progress = Progress::new(self.writer, "Deploying", &resource);

        let result = self
            .platform
            .deploy_function(namespace, name, function, self.options.forced)
            .await;

        progress.finish();

        result.map_err(|e| {
            api_error(
                ErrorKind::CloudApi,
                &format!("Failed to deploy function {resource}"),
                &e,
            )
        })?;

        self.writer.stage("Deployed", &resource, Status::Success)
    }

    fn trigger_outcome(
        &self,
        namespace: &str,
        function: &str,
        trigger: &str,
        result: Result<(), ApiError>,
    ) -> Result<TriggerOutcome, Error> {
        let mut outcome = TriggerOutcome {
            namespace: namespace.to_string(),
            function: function.to_string(),
            trigger: trigger.to_string(),
            error: None,
            request_id: None,
        };

        match result {
            Ok(()) => {
                self.writer.stage(
                    "Deployed",
                    &format!("trigger {trigger} of {namespace}/{function}"),
                    Status::Success,
                )?;
            }

            Err(error) => {
                log::error!("Trigger {trigger} of {namespace}/{function} failed: {error:?}");

                let request_id = error
                    .request_id()
                    .map(|id| format!(" (RequestId: {id})"))
                    .unwrap_or_default();

                self.writer.stage(
                    "Warning",
                    &format!(
                        "Failed to deploy trigger {trigger} of {namespace}/{function}: {error}{request_id}"
                    ),
                    Status::Warning,
                )?;

                outcome.request_id = error.request_id().map(String::from);
                outcome.error = Some(error.to_string());
            }
        }

        Ok(outcome)
    }
}
