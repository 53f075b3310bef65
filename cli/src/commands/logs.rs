use crate::api::scf::logs::LogRecord;
use crate::error::{Error, ErrorKind};
use crate::logs::{LogFetcher, LogQuery};
use crate::runner::{Runnable, Runner};
use crate::writer::{Status, Writer};
use chrono::{Local, NaiveDateTime, TimeDelta};
use clap::ArgAction;
use eyre::Context;

/// Time format of the log API
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(clap::Args, Clone)]
pub(crate) struct LogsCommand {
    /// Function name to retrieve logs for
    #[arg(short, long)]
    name: String,

    /// Namespace of the function
    #[arg(short = 'N', long, default_value = "default")]
    namespace: String,

    /// Region of the function, the configured one by default
    #[arg(short, long)]
    region: Option<String>,

    /// Maximum number of records
    #[arg(short, long, default_value_t = 10000)]
    count: u64,

    /// Start of the time window, e.g. "2020-01-01 10:00:00"
    #[arg(short, long)]
    start_time: Option<String>,

    /// End of the time window, now by default
    #[arg(long)]
    end_time: Option<String>,

    /// Length of the time window when only one of its ends is given.
    ///
    /// Concatenation of time spans, e.g. `1day 3hours`.
    /// Defaults to 1hour.
    #[arg(short, long)]
    duration: Option<String>,

    /// Keep polling for new records
    #[arg(short, long, action = ArgAction::SetTrue)]
    tail: bool,

    /// Only invocations that failed
    #[arg(short, long, action = ArgAction::SetTrue)]
    error: bool,
}

impl Runnable for LogsCommand {
    fn runner(&self, writer: &Writer) -> impl Runner {
        LogsRunner {
            command: self.clone(),
            writer,
        }
    }
}

struct LogsRunner<'a> {
    command: LogsCommand,
    writer: &'a Writer,
}

impl Runner for LogsRunner<'_> {
    /// Retrieves and displays logs of a function
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.user_config()?;
        let region = config.region(self.command.region.as_deref())?;
        let platform = self.scf_client(&config, &region)?;
        let (start_time, end_time) = self.window()?;

        let query = LogQuery {
            function: self.command.name.clone(),
            namespace: self.command.namespace.clone(),
            start_time: start_time.format(TIME_FORMAT).to_string(),
            end_time: end_time.format(TIME_FORMAT).to_string(),
            count: self.command.count,
            errors_only: self.command.error,
        };

        self.writer.stage(
            "Fetching",
            &format!(
                "logs of {}/{} from {} to {}",
                query.namespace, query.function, query.start_time, query.end_time
            ),
            Status::Process,
        )?;

        let fetcher = LogFetcher::new(&platform);

        if self.command.tail {
            return fetcher
                .tail(&query, |page| page.iter().try_for_each(|r| self.print(r)))
                .await;
        }

        let records = fetcher.fetch(&query).await?;

        if let Some(notice) = empty_window_notice(&query, &records) {
            return self.writer.stage("Info", &notice, Status::Info);
        }

        records.iter().try_for_each(|record| self.print(record))
    }
}

/// Shown instead of the records when the window holds none
fn empty_window_notice(query: &LogQuery, records: &[LogRecord]) -> Option<String> {
    if !records.is_empty() {
        return None;
    }

    Some(format!(
        "No logs of {}/{} from {} to {}. \
         Adjust --start-time, --end-time or --duration to view a larger range.",
        query.namespace, query.function, query.start_time, query.end_time
    ))
}

impl LogsRunner<'_> {
    /// Resolve the time window from the given bounds and duration
    fn window(&self) -> Result<(NaiveDateTime, NaiveDateTime), Error> {
        let duration = self.duration()?;
        let start = self.parse_time(self.command.start_time.as_deref())?;
        let end = self.parse_time(self.command.end_time.as_deref())?;

        let window = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            (Some(start), None) => (start, start + duration),
            (None, Some(end)) => (end - duration, end),
            (None, None) => {
                let now = Local::now().naive_local();

                // New invocations must fall into the window while tailing
                let end = if self.command.tail {
                    now + TimeDelta::days(1)
                } else {
                    now
                };

                (now - duration, end)
            }
        };

        if window.0 > window.1 {
            return Err(self.error(
                ErrorKind::Args,
                Some("The start time is after the end time"),
                None,
                None,
            ));
        }

        Ok(window)
    }

    fn duration(&self) -> Result<TimeDelta, Error> {
        let period = self.command.duration.as_deref().unwrap_or("1h");

        let duration = humantime::parse_duration(period)
            .wrap_err(format!("Invalid duration {period}"))
            .and_then(|d| TimeDelta::from_std(d).wrap_err("Duration is out of range"))
            .map_err(|e| {
                self.error(
                    ErrorKind::Args,
                    Some("Invalid duration"),
                    Some("Use time spans like `30m`, `2h` or `1day 3hours`."),
                    Some(e.into()),
                )
            })?;

        Ok(duration)
    }

    fn parse_time(&self, value: Option<&str>) -> Result<Option<NaiveDateTime>, Error> {
        let Some(value) = value else {
            return Ok(None);
        };

        NaiveDateTime::parse_from_str(value, TIME_FORMAT)
            .map(Some)
            .wrap_err(format!("Failed to parse time {value}"))
            .map_err(|e| {
                self.error(
                    ErrorKind::Args,
                    Some(&format!("Invalid time \"{value}\"")),
                    Some("Use the \"YYYY-MM-DD HH:MM:SS\" format."),
                    Some(e.into()),
                )
            })
    }

    fn print(&self, record: &LogRecord) -> Result<(), Error> {
        if self.writer.is_structured() {
            return self.writer.json(serde_json::json!(record));
        }

        let text = record.log.replace("\n\n", "\n");

        let text = if record.ret_code == 0 {
            console::style(text)
        } else {
            console::style(text).red()
        };

        self.writer.text(&format!(
            "{}\n{text}\n\n",
            console::style(&record.start_time).green()
        ))
    }
}
