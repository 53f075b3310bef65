use crate::error::{Error, ErrorKind};
use crate::runner::{Runnable, Runner};
use crate::template::{Template, DEFAULT_TEMPLATE};
use crate::writer::{Status, Writer};
use eyre::Context;
use serde::Serialize;
use std::path::PathBuf;
use tabled::settings::style::Style;
use tabled::{Table, Tabled};

#[derive(Tabled, Serialize)]
struct FunctionRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Function")]
    function: String,
    #[tabled(rename = "Runtime")]
    runtime: String,
    #[tabled(rename = "Handler")]
    handler: String,
    #[tabled(rename = "Triggers")]
    triggers: String,
}

#[derive(clap::Args, Clone)]
pub(crate) struct ValidateCommand {
    /// Path of the template file
    #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
    template_file: PathBuf,
}

impl Runnable for ValidateCommand {
    fn runner(&self, writer: &Writer) -> impl Runner {
        ValidateRunner {
            command: self.clone(),
            writer,
        }
    }
}

struct ValidateRunner<'a> {
    command: ValidateCommand,
    writer: &'a Writer,
}

impl Runner for ValidateRunner<'_> {
    /// Parse and validate the template, then list what it declares
    async fn run(&mut self) -> Result<(), Error> {
        let template = Template::from_path(&self.command.template_file)?;
        let rows = rows(&template);

        if self.writer.is_structured() {
            return self.writer.json(
                serde_json::to_value(&rows)
                    .wrap_err("Failed to serialize the functions")
                    .map_err(|e| self.error(ErrorKind::Internal, None, None, Some(e.into())))?,
            );
        }

        self.writer.stage(
            "Valid",
            &template.path().display().to_string(),
            Status::Success,
        )?;

        if rows.is_empty() {
            return self
                .writer
                .stage("Warning", "No functions declared", Status::Warning);
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        self.writer.text(&format!("{table}\n"))
    }
}

fn rows(template: &Template) -> Vec<FunctionRow> {
    template
        .resources
        .iter()
        .flat_map(|(namespace, resources)| {
            resources
                .functions
                .iter()
                .map(move |(name, function)| FunctionRow {
                    namespace: namespace.clone(),
                    function: name.clone(),
                    runtime: function.properties.runtime.clone().unwrap_or_default(),
                    handler: function.properties.handler.clone().unwrap_or_default(),
                    triggers: function
                        .properties
                        .events
                        .iter()
                        .map(|(trigger, config)| format!("{trigger} ({})", config.kind.api_name()))
                        .collect::<Vec<_>>()
                        .join("\n"),
                })
        })
        .collect()
}
