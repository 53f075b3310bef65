use super::trigger::Trigger;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub(crate) const FUNCTION_TYPE: &str = "TencentCloud::Serverless::Function";

/// Where the packaged code ended up, filled in by the packager
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CodeSource {
    /// Archive stays on disk and is sent inline with the deploy call
    LocalZip(PathBuf),

    /// Archive was uploaded to object storage
    Cos { bucket: String, object: String },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Environment {
    #[serde(default)]
    pub(crate) variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct VpcConfig {
    pub(crate) vpc_id: String,
    pub(crate) subnet_id: String,
}

/// `Properties` section of a function
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Properties {
    /// Code directory, relative to the template file
    #[serde(default)]
    pub(crate) code_uri: String,

    pub(crate) handler: Option<String>,
    pub(crate) runtime: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) memory_size: Option<u32>,
    pub(crate) timeout: Option<u32>,
    pub(crate) environment: Option<Environment>,
    pub(crate) vpc_config: Option<VpcConfig>,
    pub(crate) role: Option<String>,

    /// Trigger name -> trigger config, deployed in declaration order
    #[serde(default)]
    pub(crate) events: IndexMap<String, Trigger>,
}

/// A function as declared in the template
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct FunctionDef {
    #[serde(rename = "Type")]
    pub(crate) kind: String,

    #[serde(default)]
    pub(crate) properties: Properties,

    #[serde(skip)]
    pub(crate) code: Option<CodeSource>,
}

impl FunctionDef {
    /// Fill unset properties from the `Globals.Function` section
    ///
    /// Environment variables are merged, the function's own values win.
    pub(crate) fn apply_globals(&mut self, globals: &Properties) {
        let own = &mut self.properties;

        own.handler = own.handler.take().or_else(|| globals.handler.clone());
        own.runtime = own.runtime.take().or_else(|| globals.runtime.clone());
        own.description = own.description.take().or_else(|| globals.description.clone());
        own.memory_size = own.memory_size.or(globals.memory_size);
        own.timeout = own.timeout.or(globals.timeout);
        own.role = own.role.take().or_else(|| globals.role.clone());
        own.vpc_config = own.vpc_config.take().or_else(|| globals.vpc_config.clone());

        if let Some(global_env) = &globals.environment {
            let env = own.environment.get_or_insert_with(Environment::default);

            for (key, value) in &global_env.variables {
                env.variables
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }

    /// Collect every problem with the function's definition
    pub(crate) fn validate(&self, name: &str) -> Vec<String> {
        let mut errors = Vec::new();
        let properties = &self.properties;

        if self.kind != FUNCTION_TYPE {
            errors.push(format!(
                "Function \"{name}\" has unknown type \"{}\", expected \"{FUNCTION_TYPE}\"",
                self.kind
            ));
        }

        if properties.handler.as_deref().unwrap_or_default().is_empty() {
            errors.push(format!("Function \"{name}\" has no Handler"));
        }

        if properties.runtime.as_deref().unwrap_or_default().is_empty() {
            errors.push(format!("Function \"{name}\" has no Runtime"));
        }

        if let Some(memory) = properties.memory_size {
            if !(64..=3072).contains(&memory) || memory % 64 != 0 {
                errors.push(format!(
                    "Function \"{name}\" MemorySize must be a multiple of 64 between 64 and 3072"
                ));
            }
        }

        if let Some(timeout) = properties.timeout {
            if !(1..=900).contains(&timeout) {
                errors.push(format!(
                    "Function \"{name}\" Timeout must be between 1 and 900 seconds"
                ));
            }
        }

        for (trigger_name, trigger) in &properties.events {
            errors.extend(trigger.validate(trigger_name));
        }

        errors
    }
}
