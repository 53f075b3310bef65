use crate::config::UserConfig;
use crate::error::{Error, ErrorKind};
use crate::runner::{Runnable, Runner};
use crate::writer::{Status, Writer};

#[derive(clap::Args, Clone)]
pub(crate) struct SetCommand {
    #[arg(long)]
    secret_id: Option<String>,

    #[arg(long)]
    secret_key: Option<String>,

    /// Session token of temporary credentials, an empty value removes it
    #[arg(long)]
    token: Option<String>,

    /// Account identifier
    #[arg(long)]
    appid: Option<String>,

    /// Default region
    #[arg(long)]
    region: Option<String>,

    /// Upload packages through the default COS bucket (y/n)
    #[arg(long)]
    using_cos: Option<String>,
}

impl SetCommand {
    /// Settings passed on the command line, in the order they are applied
    fn settings(&self) -> Vec<(&'static str, &str)> {
        [
            ("secret_id", &self.secret_id),
            ("secret_key", &self.secret_key),
            ("token", &self.token),
            ("appid", &self.appid),
            ("region", &self.region),
            ("using_cos", &self.using_cos),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|value| (key, value)))
        .collect()
    }
}

impl Runnable for SetCommand {
    fn runner(&self, writer: &Writer) -> impl Runner {
        SetRunner {
            command: self.clone(),
            writer,
        }
    }
}

struct SetRunner<'a> {
    command: SetCommand,
    writer: &'a Writer,
}

impl Runner for SetRunner<'_> {
    async fn run(&mut self) -> Result<(), Error> {
        let settings = self.command.settings();

        if settings.is_empty() {
            return Err(self.error(
                ErrorKind::Args,
                Some("Nothing to set"),
                Some("Pass at least one setting, e.g. `scf configure set --region ap-guangzhou`."),
                None,
            ));
        }

        // Environment overrides must not end up in the file
        let mut config = UserConfig::stored().map_err(Error::from)?;

        for (key, value) in &settings {
            config.set(key, value).map_err(Error::from)?;
        }

        config.save().map_err(Error::from)?;

        for (key, _) in &settings {
            self.writer.stage("Updated", key, Status::Success)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_given_settings_are_applied() {
        let command = SetCommand {
            secret_id: None,
            secret_key: None,
            token: Some(String::new()),
            appid: None,
            region: Some("ap-shanghai".into()),
            using_cos: Some("y".into()),
        };

        assert_eq!(
            command.settings(),
            vec![("token", ""), ("region", "ap-shanghai"), ("using_cos", "y")]
        );
    }
}
