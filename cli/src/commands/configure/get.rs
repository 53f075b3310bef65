use crate::config::UserConfig;
use crate::credentials::mask;
use crate::error::{Error, ErrorKind};
use crate::runner::{Runnable, Runner};
use crate::writer::Writer;
use eyre::Context;
use serde::Serialize;
use tabled::settings::style::Style;
use tabled::{Table, Tabled};

#[derive(Tabled, Serialize)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(clap::Args, Clone)]
pub(crate) struct GetCommand {}

impl Runnable for GetCommand {
    fn runner(&self, writer: &Writer) -> impl Runner {
        GetRunner { writer }
    }
}

struct GetRunner<'a> {
    writer: &'a Writer,
}

impl Runner for GetRunner<'_> {
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.user_config()?;
        let rows = rows(&config);

        if self.writer.is_structured() {
            return self.writer.json(
                serde_json::to_value(&rows)
                    .wrap_err("Failed to serialize the settings")
                    .map_err(|e| self.error(ErrorKind::Internal, None, None, Some(e.into())))?,
            );
        }

        let mut table = Table::new(rows);
        table.with(Style::rounded());

        self.writer.text(&format!(
            "{}\n{table}\n",
            console::style(config.path().display()).dim()
        ))
    }
}

fn rows(config: &UserConfig) -> Vec<SettingRow> {
    vec![
        SettingRow {
            key: "secret_id",
            value: mask(&config.secret_id),
        },
        SettingRow {
            key: "secret_key",
            value: mask(&config.secret_key),
        },
        SettingRow {
            key: "token",
            value: config.token.as_deref().map(mask).unwrap_or_default(),
        },
        SettingRow {
            key: "appid",
            value: config.appid.clone(),
        },
        SettingRow {
            key: "region",
            value: config.region.clone(),
        },
        SettingRow {
            key: "using_cos",
            value: config.using_cos.to_string(),
        },
    ]
}
