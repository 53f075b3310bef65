use crate::logger::Logger;
use crate::writer::Writer;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a long step (compressing, uploading) is running
pub(crate) struct Progress {
    progress_bar: ProgressBar,
}

impl Progress {
    pub(crate) fn new(writer: &Writer, stage: &str, resource: &str) -> Self {
        // Spinner frames would end up in redirected JSON output otherwise
        if writer.is_structured() {
            return Self {
                progress_bar: ProgressBar::hidden(),
            };
        }

        let progress_bar = Logger::multi_progress().add(ProgressBar::new_spinner());

        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            progress_bar.set_style(style);
        }

        progress_bar.set_message(format!(
            "{} {resource}",
            console::style(stage).cyan().bold()
        ));

        progress_bar.enable_steady_tick(Duration::from_millis(100));
        Self { progress_bar }
    }

    /// Remove the spinner, the caller prints the outcome
    pub(crate) fn finish(self) {
        self.progress_bar.finish_and_clear();
        Logger::multi_progress().remove(&self.progress_bar);
    }
}
