use crate::api::scf::FunctionPlatform;
use crate::error::{api_error, Error, ErrorKind};
use crate::runner::{Runnable, Runner};
use crate::writer::{Status, Writer};
use eyre::Context;
use serde::Serialize;
use tabled::settings::style::Style;
use tabled::{Table, Tabled};

#[derive(Tabled, Serialize)]
struct FunctionRow {
    #[tabled(rename = "Function")]
    function: String,
    #[tabled(rename = "Runtime")]
    runtime: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

#[derive(clap::Args, Clone)]
pub(crate) struct ListCommand {
    /// Namespace to list the functions of
    #[arg(short = 'N', long, default_value = "default")]
    namespace: String,

    /// Region to list, the configured one by default
    #[arg(short, long)]
    region: Option<String>,
}

impl Runnable for ListCommand {
    fn runner(&self, writer: &Writer) -> impl Runner {
        ListRunner {
            command: self.clone(),
            writer,
        }
    }
}

struct ListRunner<'a> {
    command: ListCommand,
    writer: &'a Writer,
}

impl Runner for ListRunner<'_> {
    /// Prints out the functions deployed to a namespace
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.user_config()?;
        let region = config.region(self.command.region.as_deref())?;
        let platform = self.scf_client(&config, &region)?;
        let rows = rows(&platform, &self.command.namespace).await?;

        if self.writer.is_structured() {
            return self.writer.json(
                serde_json::to_value(&rows)
                    .wrap_err("Failed to serialize the functions")
                    .map_err(|e| self.error(ErrorKind::Internal, None, None, Some(e.into())))?,
            );
        }

        if rows.is_empty() {
            return self.writer.stage(
                "Info",
                &format!("No functions in {region}/{}", self.command.namespace),
                Status::Info,
            );
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());

        self.writer.text(&format!(
            "{}\n{table}\n",
            console::style(format!("{region}/{}", self.command.namespace)).dim()
        ))
    }
}

async fn rows(
    platform: &dyn FunctionPlatform,
    namespace: &str,
) -> Result<Vec<FunctionRow>, Error> {
    let functions = platform.list_functions(namespace).await.map_err(|e| {
        api_error(
            ErrorKind::CloudApi,
            &format!("Failed to list functions of namespace {namespace}"),
            &e,
        )
    })?;

    Ok(functions
        .into_iter()
        .map(|function| FunctionRow {
            function: function.function_name,
            runtime: function.runtime,
            status: function.status,
            updated: function.mod_time,
        })
        .collect())
}
