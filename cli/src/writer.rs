use crate::error::{Error, ErrorKind};
use std::io::{Stderr, Stdout, Write};

/// Colour of the status word in front of a progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    /// Work in progress
    Process,
    Success,
    /// Something worth knowing, not a problem
    Info,
    Warning,
}

/// Write all stdout/stderr outputs in the app
///
/// In either plain text mode or structured (e.g. JSON).
#[derive(Default)]
pub(crate) struct Writer {
    is_structured: bool,
}

impl Writer {
    pub(crate) fn new(is_structured: bool) -> Self {
        Writer { is_structured }
    }

    /// Output plain text
    ///
    /// Prints out nothing but a warning (in warn log level) when the writer is in structured mode.
    pub(crate) fn text(&self, output: &str) -> Result<(), Error> {
        if self.is_structured {
            log::warn!("Skipping output (not structured data): {output}");
            return Ok(());
        }

        self.write(output, false)
    }

    /// Output serialized JSON
    ///
    /// Prints out nothing but a warning (in warn log level) when the writer is in plain text mode.
    pub(crate) fn json(&self, output: serde_json::Value) -> Result<(), Error> {
        if !self.is_structured {
            log::warn!("Skipping output (not plain text): {output}");
            return Ok(());
        }

        self.write(&format!("{output}\n"), false)
    }

    /// A cargo-like status line: right aligned coloured stage word followed by the message
    ///
    /// In structured mode the line goes to the log instead, so JSON output stays parseable.
    pub(crate) fn stage(&self, stage: &str, message: &str, status: Status) -> Result<(), Error> {
        if self.is_structured {
            log::info!("{stage} {message}");
            return Ok(());
        }

        let stage = console::style(format!("{stage:>12}")).bold();

        let stage = match status {
            Status::Process => stage.cyan(),
            Status::Success => stage.green(),
            Status::Info => stage.blue(),
            Status::Warning => stage.yellow(),
        };

        self.write(&format!("{stage} {message}\n"), status == Status::Warning)
    }

    /// General method for writing to stdout/stderr
    fn write(&self, output: &str, is_error: bool) -> Result<(), Error> {
        let mut stderr: Stderr = std::io::stderr();
        let mut stdout: Stdout = std::io::stdout();
        let stream: &mut dyn Write = if is_error { &mut stderr } else { &mut stdout };

        stream.write_all(output.as_bytes()).map_err(|e| {
            log::error!("Error while writing to std*: {e:?}");
            Error::new(ErrorKind::Internal, "Output error", None)
        })?;

        Ok(())
    }

    pub(crate) fn is_structured(&self) -> bool {
        self.is_structured
    }
}
